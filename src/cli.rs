use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const DEFAULT_SCENARIO: &str = "business-as-usual";
pub const ALL_PRODUCTS: &str = "all";

#[derive(Parser, Debug)]
#[command(
    name = "chokepoint-impact",
    version,
    about = "Compare export-route CO2 and volume under maritime chokepoint disruptions"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "Configuration file (takes precedence over the user override and bundled tables)"
    )]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a scenario against the baseline.
    Compare {
        #[arg(long, default_value = DEFAULT_SCENARIO)]
        scenario: String,
        #[arg(long, default_value = ALL_PRODUCTS, help = "Product name, or `all`")]
        product: String,
        #[arg(long, help = "Per-route solver time limit in milliseconds")]
        timeout_ms: Option<u64>,
        #[arg(long, default_value_t = false, help = "Reuse solver answers within this run")]
        memoize: bool,
    },
    /// List configured scenarios.
    Scenarios,
    /// List the CO2 factor applied to each product.
    Factors,
}
