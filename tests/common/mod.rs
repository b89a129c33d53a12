#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chokepoint_impact::{
    Coordinates, GeometryError, GeometrySolver, Restriction, RestrictionSet, RouteSolver,
    SolverPath, StaticConfig,
};

pub const TUBARAO: &str = "Tubarão Port (Vitoria)";
pub const PONTA: &str = "Ponta da Madeira (São Luís)";
pub const SANTOS: &str = "Santos Port (São Paulo)";
pub const QINGDAO: &str = "China (Qingdao Port)";
pub const IRON_ORE: &str = "Iron Ore";

type PairKey = ((u64, u64), (u64, u64));

/// What a closed passage does to one scripted lane.
#[derive(Clone, Copy, Debug)]
pub enum Detour {
    Adds(f64),
    Blocks,
}

#[derive(Clone, Debug)]
pub enum Script {
    Lane {
        km: f64,
        detours: Vec<(Restriction, Detour)>,
    },
    Fails(&'static str),
}

/// Geometry solver answering from a fixed table of origin/destination pairs.
///
/// Unscripted pairs fall back to `default_km`, or `None` when unset.
#[derive(Default)]
pub struct ScriptedSolver {
    lanes: HashMap<PairKey, Script>,
    default_km: Option<f64>,
    pub calls: AtomicUsize,
}

impl ScriptedSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_km(mut self, km: f64) -> Self {
        self.default_km = Some(km);
        self
    }

    pub fn lane(mut self, from: Coordinates, to: Coordinates, km: f64) -> Self {
        self.lanes.insert(
            (from.key(), to.key()),
            Script::Lane {
                km,
                detours: Vec::new(),
            },
        );
        self
    }

    pub fn detour(mut self, from: Coordinates, to: Coordinates, restriction: Restriction, detour: Detour) -> Self {
        if let Some(Script::Lane { detours, .. }) = self.lanes.get_mut(&(from.key(), to.key())) {
            detours.push((restriction, detour));
        }
        self
    }

    pub fn failing(mut self, from: Coordinates, to: Coordinates, message: &'static str) -> Self {
        self.lanes.insert((from.key(), to.key()), Script::Fails(message));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GeometrySolver for ScriptedSolver {
    fn solve(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        restrictions: &RestrictionSet,
    ) -> Result<Option<SolverPath>, GeometryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let km = match self.lanes.get(&(origin.key(), destination.key())) {
            Some(Script::Fails(message)) => return Err(GeometryError::Backend(message.to_string())),
            Some(Script::Lane { km, detours }) => {
                let mut total = *km;
                for (restriction, detour) in detours {
                    if !restrictions.contains(*restriction) {
                        continue;
                    }
                    match detour {
                        Detour::Adds(extra) => total += extra,
                        Detour::Blocks => return Ok(None),
                    }
                }
                total
            }
            None => match self.default_km {
                Some(km) => km,
                None => return Ok(None),
            },
        };
        Ok(Some(SolverPath {
            geometry: vec![origin, destination],
            length_km: Some(km),
        }))
    }
}

pub fn bundled() -> StaticConfig {
    StaticConfig::bundled().expect("bundled configuration is valid")
}

pub fn coords(config: &StaticConfig, name: &str) -> Coordinates {
    config
        .origins()
        .iter()
        .chain(config.destinations())
        .find(|port| port.name == name)
        .map(|port| port.coordinates)
        .unwrap_or_else(|| panic!("no port named {name}"))
}

pub fn route_solver(solver: impl GeometrySolver + 'static) -> RouteSolver {
    RouteSolver::new(Arc::new(solver))
}

pub fn baseline_restrictions() -> RestrictionSet {
    [Restriction::Northwest, Restriction::Northeast, Restriction::Bering]
        .into_iter()
        .collect()
}
