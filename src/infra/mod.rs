//! Concrete geometry solvers.

pub mod cache;
pub mod sea_lanes;

pub use cache::{CacheStats, CachedSolver};
pub use sea_lanes::{NetworkError, SeaLaneNetwork, Waypoint};
