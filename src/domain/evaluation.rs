use serde::Serialize;
use tracing::debug;

use super::entities::{EmissionRecord, SelectedRoute, KG_PER_TON};
use crate::config::StaticConfig;

/// Emission figures for one product under one scenario.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EmissionSummary {
    pub records: Vec<EmissionRecord>,
    /// kg CO2 per kg of cargo; zero when no volume was shipped.
    pub weighted_intensity: f64,
    pub total_co2_kg: f64,
    pub total_volume_kg: u64,
}

impl EmissionSummary {
    pub fn lane_count(&self) -> usize {
        self.records.len()
    }
}

pub struct EmissionsAggregator<'a> {
    config: &'a StaticConfig,
}

impl<'a> EmissionsAggregator<'a> {
    pub fn new(config: &'a StaticConfig) -> Self {
        Self { config }
    }

    /// Per-lane CO2 = distance_nm x factor(product) x volume_tons.
    pub fn summarize(&self, routes: &[SelectedRoute], product: &str) -> EmissionSummary {
        let factor = self.config.co2_factor(product);
        let mut records = Vec::with_capacity(routes.len());
        let mut total_co2_kg = 0.0;
        let mut total_volume_kg = 0_u64;

        for route in routes.iter().filter(|r| r.volume_kg > 0) {
            let co2_kg = lane_emission_kg(route.distance_nm, factor, route.volume_tons);
            total_co2_kg += co2_kg;
            total_volume_kg += route.volume_kg;

            records.push(EmissionRecord {
                product: route.product.clone(),
                destination: route.dest_name.clone(),
                origin: route.origin_name.clone(),
                distance_nm: route.distance_nm,
                volume_kg: route.volume_kg,
                volume_tons: route.volume_tons,
                co2_kg,
                co2_tons: co2_kg / KG_PER_TON,
            });
        }

        let weighted_intensity = ratio_or_zero(total_co2_kg, total_volume_kg as f64);
        debug!(product, factor, total_co2_kg, total_volume_kg, "emissions summarized");

        EmissionSummary {
            records,
            weighted_intensity,
            total_co2_kg,
            total_volume_kg,
        }
    }
}

pub fn lane_emission_kg(distance_nm: f64, factor: f64, volume_tons: f64) -> f64 {
    distance_nm * factor * volume_tons
}

/// `numerator / denominator`, or zero when the denominator is not positive.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
