//! Text and JSON rendering for the command line.

use std::fmt::Write as _;

use chokepoint_impact::{
    ComparisonResult, ConfigSource, Delta, ImpactStatus, RestrictionSet, Scenario, StaticConfig,
};
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

const KG_PER_MEGATON: f64 = 1.0e9;
const KG_PER_BILLION: f64 = 1.0e9;

/// Everything `compare --json` prints.
#[derive(Serialize)]
pub struct ComparisonReport<'a> {
    pub engine: String,
    pub generated_at: String,
    pub config_source: String,
    pub scenario: &'a Scenario,
    pub baseline: &'a Scenario,
    pub active_vectors: usize,
    pub result: &'a ComparisonResult,
}

impl<'a> ComparisonReport<'a> {
    pub fn new(
        engine: String,
        source: &ConfigSource,
        scenario: &'a Scenario,
        baseline: &'a Scenario,
        result: &'a ComparisonResult,
    ) -> Result<Self, time::error::Format> {
        Ok(Self {
            engine,
            generated_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
            config_source: describe_source(source),
            scenario,
            baseline,
            active_vectors: result.active_vectors(),
            result,
        })
    }
}

pub fn describe_source(source: &ConfigSource) -> String {
    match source {
        ConfigSource::File(path) => path.display().to_string(),
        ConfigSource::UserOverride(path) => format!("{} (user override)", path.display()),
        ConfigSource::Bundled => "bundled".to_string(),
    }
}

pub fn render_comparison(report: &ComparisonReport<'_>) -> String {
    let result = report.result;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "[{}] {} vs {}",
        report.scenario.severity().label(),
        report.scenario.label(),
        report.baseline.label()
    );
    if let Some(headline) = report.scenario.headline() {
        let _ = writeln!(out, "{headline}");
    }
    let _ = writeln!(out, "Closed: {}", report.scenario.restrictions());
    if !report.scenario.offline_origins().is_empty() {
        let offline: Vec<&str> = report
            .scenario
            .offline_origins()
            .iter()
            .map(String::as_str)
            .collect();
        let _ = writeln!(out, "Offline origins: {}", offline.join(", "));
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "CO2 emissions    {:>12.3} Mt    {}",
        result.active.total_co2_kg / KG_PER_MEGATON,
        delta_text(&result.co2_impact)
    );
    let _ = writeln!(
        out,
        "Trade volume     {:>12.3} B kg  {}",
        result.active.total_volume_kg as f64 / KG_PER_BILLION,
        delta_text(&result.volume_impact)
    );
    let _ = writeln!(
        out,
        "Active vectors   {:>12}       (baseline {})",
        report.active_vectors, result.baseline.lanes
    );
    let _ = writeln!(
        out,
        "Intensity        {:>12.6} kg/kg {}",
        result.active.intensity,
        delta_text(&result.efficiency_impact)
    );

    if result.products.len() > 1 {
        out.push('\n');
        let _ = writeln!(out, "{:<16} {:>12} {:>12} {:>10}", "Product", "CO2 Mt", "Baseline", "Delta");
        for product in &result.products {
            let _ = writeln!(
                out,
                "{:<16} {:>12.3} {:>12.3} {:>+9.2}%",
                product.product,
                product.active.total_co2_kg / KG_PER_MEGATON,
                product.baseline.total_co2_kg / KG_PER_MEGATON,
                product.co2_delta_pct
            );
        }
    }

    out.push('\n');
    if result.emissions.is_empty() {
        out.push_str("No active lanes.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<14} {:<22} {:<22} {:>10} {:>16} {:>14}",
        "Product", "Origin", "Destination", "Dist nm", "Volume t", "CO2 t"
    );
    for record in &result.emissions {
        let _ = writeln!(
            out,
            "{:<14} {:<22} {:<22} {:>10.0} {:>16} {:>14}",
            record.product,
            record.origin,
            record.destination,
            record.distance_nm,
            grouped(record.volume_tons.round() as u64),
            grouped(record.co2_tons.round() as u64)
        );
    }
    out
}

pub fn render_scenarios(config: &StaticConfig) -> String {
    let mut out = String::new();
    let baseline = config.baseline_scenario();
    let _ = writeln!(
        out,
        "{:<20} {:<9} {} (closed: {})",
        baseline.key(),
        "BASELINE",
        baseline.label(),
        closed_passages(baseline.restrictions())
    );
    for scenario in config.scenarios() {
        let _ = writeln!(
            out,
            "{:<20} {:<9} {} (closed: {})",
            scenario.key(),
            scenario.severity().label(),
            scenario.label(),
            closed_passages(scenario.restrictions())
        );
        if !scenario.offline_origins().is_empty() {
            let offline: Vec<&str> = scenario.offline_origins().iter().map(String::as_str).collect();
            let _ = writeln!(out, "{:<30} offline: {}", "", offline.join(", "));
        }
    }
    out
}

fn closed_passages(restrictions: &RestrictionSet) -> String {
    if restrictions.is_empty() {
        return "none".to_string();
    }
    restrictions.iter().map(|r| r.label()).collect::<Vec<_>>().join(", ")
}

#[derive(Serialize)]
pub struct FactorRow<'a> {
    pub product: &'a str,
    pub co2_factor: f64,
    pub vessel_class: Option<&'a str>,
    pub configured: bool,
}

pub fn factor_rows(config: &StaticConfig) -> Vec<FactorRow<'_>> {
    config
        .products()
        .iter()
        .map(|product| FactorRow {
            product: &product.name,
            co2_factor: config.co2_factor(&product.name),
            vessel_class: product.vessel_class.as_deref(),
            configured: product.co2_factor.is_some(),
        })
        .collect()
}

pub fn render_factors(config: &StaticConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<16} {:>10}  {}", "Product", "kg/t·nm", "Vessel class");
    for row in factor_rows(config) {
        let marker = if row.configured { "" } else { " (default)" };
        let _ = writeln!(
            out,
            "{:<16} {:>10.5}  {}{}",
            row.product,
            row.co2_factor,
            row.vessel_class.unwrap_or("-"),
            marker
        );
    }
    out
}

fn delta_text(delta: &Delta) -> String {
    match delta.status {
        ImpactStatus::Stable => "Stable".to_string(),
        ImpactStatus::Worsened => format!("{:+.2}% (worse)", delta.pct),
        ImpactStatus::Improved => format!("{:+.2}% (better)", delta.pct),
    }
}

fn grouped(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
