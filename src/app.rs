//! Command dispatch for the binary.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use chokepoint_impact::{
    infra::{CachedSolver, SeaLaneNetwork},
    util::version::version_label,
    GeometrySolver, ProductFilter, RouteSolver, ScenarioComparator, StaticConfig,
};
use tracing::info;

use crate::{
    cli::{Cli, Commands},
    output,
};

pub fn run(cli: Cli) -> Result<()> {
    let (config, source) =
        StaticConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    info!(source = %output::describe_source(&source), "configuration ready");

    match cli.command {
        Commands::Compare {
            scenario,
            product,
            timeout_ms,
            memoize,
        } => {
            let active = config.scenario(&scenario).ok_or_else(|| {
                anyhow!("unknown scenario `{scenario}` (see `chokepoint-impact scenarios`)")
            })?;
            let baseline = config.baseline_scenario();

            let network = SeaLaneNetwork::standard().context("failed to build sea-lane network")?;
            let cache = memoize.then(|| Arc::new(CachedSolver::new(network.clone())));
            let backend: Arc<dyn GeometrySolver> = match &cache {
                Some(cache) => cache.clone() as Arc<dyn GeometrySolver>,
                None => Arc::new(network),
            };

            let mut solver = RouteSolver::new(backend);
            if let Some(ms) = timeout_ms {
                solver = solver.with_timeout(Duration::from_millis(ms))?;
            }
            info!(
                timeout_ms = ?solver.timeout().map(|limit| limit.as_millis()),
                memoize,
                "route solver ready"
            );

            let result = ScenarioComparator::new(&config, &solver).compare(
                &ProductFilter::parse(&product),
                active,
                baseline,
            );
            if let Some(cache) = &cache {
                let stats = cache.stats();
                info!(
                    hits = stats.hits,
                    misses = stats.misses,
                    hit_rate = stats.hit_rate(),
                    "route cache"
                );
            }

            let report =
                output::ComparisonReport::new(version_label(), &source, active, baseline, &result)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", output::render_comparison(&report));
            }
        }
        Commands::Scenarios => {
            if cli.json {
                let listing = serde_json::json!({
                    "baseline": config.baseline_scenario(),
                    "scenarios": config.scenarios(),
                });
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print!("{}", output::render_scenarios(&config));
            }
        }
        Commands::Factors => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output::factor_rows(&config))?);
            } else {
                print!("{}", output::render_factors(&config));
            }
        }
    }

    Ok(())
}
