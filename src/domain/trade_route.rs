//! Best-origin route selection per destination for one commodity.

use tracing::{debug, info};

use super::entities::{Port, RouteCandidate, RouteResult, SelectedRoute, KG_PER_TON};
use super::route_solver::RouteSolver;
use super::scenario::RestrictionSet;
use crate::config::StaticConfig;

/// Selects, for every destination a product trades with, the shortest
/// successful route from any eligible online origin.
pub struct ProductRouteAggregator<'a> {
    config: &'a StaticConfig,
    solver: &'a RouteSolver,
}

impl<'a> ProductRouteAggregator<'a> {
    pub fn new(config: &'a StaticConfig, solver: &'a RouteSolver) -> Self {
        Self { config, solver }
    }

    /// Origins allowed to ship `product`, in eligibility order, restricted to
    /// those present in `online_origins`.
    ///
    /// A product without an eligibility entry may ship from any online origin.
    pub fn eligible_origins<'o>(&self, product: &str, online_origins: &'o [Port]) -> Vec<&'o Port> {
        match self.config.product(product).and_then(|p| p.origins.as_deref()) {
            Some(names) => names
                .iter()
                .filter_map(|name| online_origins.iter().find(|port| &port.name == name))
                .collect(),
            None => online_origins.iter().collect(),
        }
    }

    /// Compute the selected route for every destination with positive volume.
    ///
    /// Destinations follow the configuration's destination order. Among
    /// successful candidates the smallest distance wins; on equal distance the
    /// origin listed first in the eligibility order keeps the lane. A
    /// destination with no successful candidate is left out.
    pub fn aggregate(
        &self,
        product: &str,
        restrictions: &RestrictionSet,
        online_origins: &[Port],
    ) -> Vec<SelectedRoute> {
        let origins = self.eligible_origins(product, online_origins);
        let mut routes = Vec::new();

        for destination in self.config.destinations() {
            let volume_kg = self.config.export_volume_kg(product, &destination.name);
            if volume_kg == 0 {
                continue;
            }

            let attempts: Vec<(&Port, RouteResult)> = origins
                .iter()
                .map(|origin| {
                    let result =
                        self.solver
                            .solve(origin.coordinates, destination.coordinates, restrictions);
                    (*origin, result)
                })
                .collect();

            let Some((winner, result)) = select_best(&attempts) else {
                debug!(product, destination = %destination.name, "no reachable origin; lane dropped");
                continue;
            };
            let Some(path) = result.path() else {
                continue;
            };

            routes.push(SelectedRoute {
                product: product.to_string(),
                origin_name: winner.name.clone(),
                origin_coords: winner.coordinates,
                dest_name: destination.name.clone(),
                dest_coords: destination.coordinates,
                distance_nm: path.distance_nm,
                distance_km: path.distance_km,
                geometry: path.geometry.clone(),
                length_source: path.length_source,
                volume_kg,
                volume_tons: volume_kg as f64 / KG_PER_TON,
                candidates: attempts
                    .iter()
                    .map(|(origin, result)| RouteCandidate::from_result(&origin.name, result))
                    .collect(),
            });
        }

        info!(
            product,
            %restrictions,
            origins = origins.len(),
            lanes = routes.len(),
            "product routes aggregated"
        );
        routes
    }
}

/// First successful attempt with the strictly smallest distance.
fn select_best<'r, 'p>(attempts: &'r [(&'p Port, RouteResult)]) -> Option<&'r (&'p Port, RouteResult)> {
    let mut best: Option<&(&Port, RouteResult)> = None;
    for attempt in attempts.iter().filter(|(_, result)| result.is_success()) {
        let shorter = best
            .map(|(_, current)| attempt.1.distance_nm() < current.distance_nm())
            .unwrap_or(true);
        if shorter {
            best = Some(attempt);
        }
    }
    best
}
