//! Route selection and emissions engine lives here.

pub mod comparison;
pub mod entities;
pub mod evaluation;
pub mod route_solver;
pub mod scenario;
pub mod trade_route;

pub use comparison::{
    impact_status, percent_change, ComparisonResult, Delta, ImpactStatus, ProductFilter,
    ProductImpact, ScenarioComparator, ScenarioTotals, STABLE_BAND_PCT,
};
pub use entities::{
    Coordinates, EmissionRecord, LengthSource, Port, ProductId, RouteCandidate, RoutePath,
    RouteResult, SelectedRoute, KG_PER_TON, KM_TO_NM,
};
pub use evaluation::{lane_emission_kg, ratio_or_zero, EmissionSummary, EmissionsAggregator};
pub use route_solver::{
    great_circle_km, polyline_km, EngineError, GeometryError, GeometrySolver, RouteSolver,
    SolverFailure, SolverPath,
};
pub use scenario::{
    Disruption, Restriction, RestrictionSet, Scenario, ScenarioBuilder, Severity,
    UnknownRestriction,
};
pub use trade_route::ProductRouteAggregator;
