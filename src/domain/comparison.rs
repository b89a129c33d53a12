//! Baseline vs. active scenario impact.
//!
//! Sign convention: a positive CO2 or intensity delta is worse, a negative
//! volume delta is worse.

use serde::Serialize;
use tracing::{info, warn};

use super::entities::{EmissionRecord, ProductId, SelectedRoute};
use super::evaluation::{ratio_or_zero, EmissionSummary, EmissionsAggregator};
use super::route_solver::RouteSolver;
use super::scenario::Scenario;
use super::trade_route::ProductRouteAggregator;
use crate::config::StaticConfig;

/// Deltas within this band (in percent) are reported as stable.
pub const STABLE_BAND_PCT: f64 = 0.1;

/// Which products to evaluate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProductFilter {
    #[default]
    All,
    Single(ProductId),
}

impl ProductFilter {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") || value.eq_ignore_ascii_case("all commodities") {
            Self::All
        } else {
            Self::Single(value.to_string())
        }
    }

    pub fn products(&self, config: &StaticConfig) -> Vec<ProductId> {
        match self {
            Self::All => config.product_names().map(str::to_string).collect(),
            Self::Single(name) => vec![name.clone()],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactStatus {
    Improved,
    Stable,
    Worsened,
}

/// A relative change plus its reading under the sign convention.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Delta {
    pub pct: f64,
    pub status: ImpactStatus,
}

impl Delta {
    fn new(pct: f64, higher_is_worse: bool) -> Self {
        Self {
            pct,
            status: impact_status(pct, higher_is_worse),
        }
    }
}

pub fn impact_status(delta_pct: f64, higher_is_worse: bool) -> ImpactStatus {
    if delta_pct.abs() <= STABLE_BAND_PCT {
        ImpactStatus::Stable
    } else if (delta_pct > 0.0) == higher_is_worse {
        ImpactStatus::Worsened
    } else {
        ImpactStatus::Improved
    }
}

/// `(active - baseline) / baseline x 100`, zero when the baseline is zero.
pub fn percent_change(active: f64, baseline: f64) -> f64 {
    ratio_or_zero(active - baseline, baseline) * 100.0
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScenarioTotals {
    pub total_co2_kg: f64,
    pub total_volume_kg: u64,
    pub intensity: f64,
    pub lanes: usize,
}

impl ScenarioTotals {
    fn absorb(&mut self, summary: &EmissionSummary) {
        self.total_co2_kg += summary.total_co2_kg;
        self.total_volume_kg += summary.total_volume_kg;
        self.lanes += summary.lane_count();
        self.intensity = ratio_or_zero(self.total_co2_kg, self.total_volume_kg as f64);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductImpact {
    pub product: ProductId,
    pub active: ScenarioTotals,
    pub baseline: ScenarioTotals,
    pub co2_delta_pct: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub scenario: String,
    pub baseline_scenario: String,
    pub active: ScenarioTotals,
    pub baseline: ScenarioTotals,
    pub co2_delta_pct: f64,
    pub volume_delta_pct: f64,
    pub efficiency_delta: f64,
    pub efficiency_delta_pct: f64,
    pub co2_impact: Delta,
    pub volume_impact: Delta,
    pub efficiency_impact: Delta,
    pub products: Vec<ProductImpact>,
    pub routes: Vec<SelectedRoute>,
    pub emissions: Vec<EmissionRecord>,
}

impl ComparisonResult {
    /// Lanes carrying positive volume under the active scenario.
    pub fn active_vectors(&self) -> usize {
        self.routes.iter().filter(|r| r.volume_kg > 0).count()
    }
}

/// Runs the route + emissions pipeline under both scenarios. Every call
/// recomputes from scratch.
pub struct ScenarioComparator<'a> {
    config: &'a StaticConfig,
    solver: &'a RouteSolver,
}

impl<'a> ScenarioComparator<'a> {
    pub fn new(config: &'a StaticConfig, solver: &'a RouteSolver) -> Self {
        Self { config, solver }
    }

    /// Route and emission summary for one product under one scenario.
    pub fn evaluate(&self, product: &str, scenario: &Scenario) -> (Vec<SelectedRoute>, EmissionSummary) {
        let online = self.config.online_origins(scenario);
        let routes = ProductRouteAggregator::new(self.config, self.solver).aggregate(
            product,
            scenario.restrictions(),
            &online,
        );
        let summary = EmissionsAggregator::new(self.config).summarize(&routes, product);
        (routes, summary)
    }

    pub fn compare(
        &self,
        products: &ProductFilter,
        active_scenario: &Scenario,
        baseline_scenario: &Scenario,
    ) -> ComparisonResult {
        let mut active = ScenarioTotals::default();
        let mut baseline = ScenarioTotals::default();
        let mut per_product = Vec::new();
        let mut routes = Vec::new();
        let mut emissions = Vec::new();

        for product in products.products(self.config) {
            if self.config.product(&product).is_none() {
                warn!(product = %product, "product not configured; no lanes to evaluate");
            }

            let (active_routes, active_summary) = self.evaluate(&product, active_scenario);
            let (_, baseline_summary) = self.evaluate(&product, baseline_scenario);

            let mut product_active = ScenarioTotals::default();
            product_active.absorb(&active_summary);
            let mut product_baseline = ScenarioTotals::default();
            product_baseline.absorb(&baseline_summary);

            active.absorb(&active_summary);
            baseline.absorb(&baseline_summary);

            per_product.push(ProductImpact {
                co2_delta_pct: percent_change(product_active.total_co2_kg, product_baseline.total_co2_kg),
                product,
                active: product_active,
                baseline: product_baseline,
            });
            routes.extend(active_routes);
            emissions.extend(active_summary.records);
        }

        let co2_delta_pct = percent_change(active.total_co2_kg, baseline.total_co2_kg);
        let volume_delta_pct =
            percent_change(active.total_volume_kg as f64, baseline.total_volume_kg as f64);
        let efficiency_delta = active.intensity - baseline.intensity;
        let efficiency_delta_pct = ratio_or_zero(efficiency_delta, baseline.intensity) * 100.0;

        info!(
            scenario = active_scenario.key(),
            co2_delta_pct, volume_delta_pct, efficiency_delta_pct, "scenario compared"
        );

        ComparisonResult {
            scenario: active_scenario.key().to_string(),
            baseline_scenario: baseline_scenario.key().to_string(),
            co2_impact: Delta::new(co2_delta_pct, true),
            volume_impact: Delta::new(volume_delta_pct, false),
            efficiency_impact: Delta::new(efficiency_delta_pct, true),
            active,
            baseline,
            co2_delta_pct,
            volume_delta_pct,
            efficiency_delta,
            efficiency_delta_pct,
            products: per_product,
            routes,
            emissions,
        }
    }
}
