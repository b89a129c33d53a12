//! Wrapper around the external geometry solver.
//!
//! - Converts solver output to nautical miles.
//! - Falls back to summed great-circle legs when the reported length is unusable.
//! - Absorbs every failure (no geometry, solver error, panic, timeout) into an
//!   unsuccessful [`RouteResult`].

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::entities::{Coordinates, LengthSource, RoutePath, RouteResult, KM_TO_NM};
use super::scenario::RestrictionSet;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Raw answer from a geometry solver.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverPath {
    pub geometry: Vec<Coordinates>,
    /// Length as reported by the solver; may be missing or non-positive.
    pub length_km: Option<f64>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("solver rejected request: {0}")]
    Rejected(String),
    #[error("solver backend error: {0}")]
    Backend(String),
}

/// Path-finding backend: two positions plus closed passages -> polyline.
///
/// `Ok(None)` means the solver produced nothing (e.g. destination unreachable).
pub trait GeometrySolver: Send + Sync {
    fn solve(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        restrictions: &RestrictionSet,
    ) -> Result<Option<SolverPath>, GeometryError>;
}

impl<S: GeometrySolver + ?Sized> GeometrySolver for Arc<S> {
    fn solve(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        restrictions: &RestrictionSet,
    ) -> Result<Option<SolverPath>, GeometryError> {
        (**self).solve(origin, destination, restrictions)
    }
}

/// Why a route attempt did not produce a usable path.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SolverFailure {
    #[error("No route found")]
    NoGeometry,
    #[error("{0}")]
    Solver(String),
    #[error("solver panicked: {0}")]
    Panicked(String),
    #[error("solver timed out after {0} ms")]
    TimedOut(u64),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start solver runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Great-circle distance between two positions (haversine).
pub fn great_circle_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Sum of great-circle legs between consecutive vertices.
pub fn polyline_km(points: &[Coordinates]) -> f64 {
    points
        .windows(2)
        .map(|pair| great_circle_km(pair[0], pair[1]))
        .sum()
}

pub struct RouteSolver {
    solver: Arc<dyn GeometrySolver>,
    timeout: Option<TimeoutBudget>,
}

struct TimeoutBudget {
    limit: Duration,
    runtime: Option<tokio::runtime::Runtime>,
}

impl Drop for TimeoutBudget {
    fn drop(&mut self) {
        // Abandoned solver calls may still be running; don't wait for them.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl RouteSolver {
    pub fn new(solver: Arc<dyn GeometrySolver>) -> Self {
        Self {
            solver,
            timeout: None,
        }
    }

    /// Bound every solver call by `limit`; an expired call counts as a failure.
    ///
    /// Expired calls are abandoned, not interrupted: the blocking worker keeps
    /// running until the solver returns. Must not be used from inside another
    /// tokio runtime.
    pub fn with_timeout(mut self, limit: Duration) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("route-solver")
            .enable_time()
            .build()?;
        self.timeout = Some(TimeoutBudget {
            limit,
            runtime: Some(runtime),
        });
        Ok(self)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.as_ref().map(|t| t.limit)
    }

    pub fn solve(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        restrictions: &RestrictionSet,
    ) -> RouteResult {
        let raw = match &self.timeout {
            Some(budget) => self.solve_bounded(budget, origin, destination, restrictions),
            None => self.solve_inline(origin, destination, restrictions),
        };

        let result = match raw {
            Ok(Some(path)) if !path.geometry.is_empty() => RouteResult::Found(to_route_path(path)),
            Ok(_) => RouteResult::Failed {
                reason: SolverFailure::NoGeometry,
            },
            Err(reason) => RouteResult::Failed { reason },
        };

        match &result {
            RouteResult::Found(path) => debug!(
                %origin, %destination, distance_nm = path.distance_nm,
                source = ?path.length_source, "route solved"
            ),
            RouteResult::Failed { reason } => warn!(
                %origin, %destination, %restrictions, %reason, "route attempt failed"
            ),
        }
        result
    }

    fn solve_inline(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        restrictions: &RestrictionSet,
    ) -> Result<Option<SolverPath>, SolverFailure> {
        let solver = &self.solver;
        match panic::catch_unwind(AssertUnwindSafe(|| {
            solver.solve(origin, destination, restrictions)
        })) {
            Ok(answer) => answer.map_err(|e| SolverFailure::Solver(e.to_string())),
            Err(payload) => Err(SolverFailure::Panicked(panic_message(payload.as_ref()))),
        }
    }

    fn solve_bounded(
        &self,
        budget: &TimeoutBudget,
        origin: Coordinates,
        destination: Coordinates,
        restrictions: &RestrictionSet,
    ) -> Result<Option<SolverPath>, SolverFailure> {
        let solver = Arc::clone(&self.solver);
        let restrictions = restrictions.clone();
        let limit = budget.limit;
        let Some(runtime) = budget.runtime.as_ref() else {
            return self.solve_inline(origin, destination, &restrictions);
        };

        runtime.block_on(async move {
            let task = tokio::task::spawn_blocking(move || {
                solver.solve(origin, destination, &restrictions)
            });
            match tokio::time::timeout(limit, task).await {
                Ok(Ok(answer)) => answer.map_err(|e| SolverFailure::Solver(e.to_string())),
                Ok(Err(join_error)) => {
                    let message = match join_error.try_into_panic() {
                        Ok(payload) => panic_message(payload.as_ref()),
                        Err(other) => other.to_string(),
                    };
                    Err(SolverFailure::Panicked(message))
                }
                Err(_) => Err(SolverFailure::TimedOut(limit.as_millis() as u64)),
            }
        })
    }
}

fn to_route_path(path: SolverPath) -> RoutePath {
    let (distance_km, length_source) = match path.length_km {
        Some(km) if km.is_finite() && km > 0.0 => (km, LengthSource::Reported),
        _ => (polyline_km(&path.geometry), LengthSource::GreatCircleFallback),
    };

    RoutePath {
        distance_km,
        distance_nm: distance_km * KM_TO_NM,
        geometry: path.geometry,
        length_source,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
