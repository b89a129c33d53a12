//! Maritime chokepoint impact engine.
//!
//! Picks the shortest viable sea route from Brazilian export ports to each
//! foreign destination under a set of closed passages, then compares CO2 and
//! trade volume against an unrestricted baseline.

pub mod config;
pub mod domain;
pub mod infra;
pub mod util;

pub use config::{ConfigError, ConfigSource, ProductConfig, StaticConfig};
pub use domain::*;
