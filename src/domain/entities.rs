use std::fmt;

use serde::{Deserialize, Serialize};

use super::route_solver::SolverFailure;

/// Nautical miles per kilometre.
pub const KM_TO_NM: f64 = 0.539957;

/// Kilograms per metric ton.
pub const KG_PER_TON: f64 = 1000.0;

/// Identifier for a commodity (e.g. "Iron Ore").
pub type ProductId = String;

/// Geographic position as (longitude, latitude) in degrees.
///
/// Serialized as a two-element array, which matches how the solver and the
/// configuration tables exchange positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Bit-exact key, usable in hash maps where `f64` itself is not.
    pub fn key(&self) -> (u64, u64) {
        (self.lon.to_bits(), self.lat.to_bits())
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(value: Coordinates) -> Self {
        [value.lon, value.lat]
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.lon, self.lat)
    }
}

/// A named port. Origins and destinations live in separate tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub coordinates: Coordinates,
}

impl Port {
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            name: name.into(),
            coordinates,
        }
    }
}

/// Where a successful route's length came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthSource {
    /// The geometry solver reported a positive length.
    Reported,
    /// The solver reported no usable length; summed great-circle legs instead.
    GreatCircleFallback,
}

/// A path found by the solver, already converted to nautical miles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutePath {
    pub distance_km: f64,
    pub distance_nm: f64,
    pub geometry: Vec<Coordinates>,
    pub length_source: LengthSource,
}

/// Outcome of one origin -> destination path attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteResult {
    Found(RoutePath),
    Failed { reason: SolverFailure },
}

impl RouteResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Distance in nautical miles; `+inf` for failed attempts so they never win.
    pub fn distance_nm(&self) -> f64 {
        match self {
            Self::Found(path) => path.distance_nm,
            Self::Failed { .. } => f64::INFINITY,
        }
    }

    pub fn distance_km(&self) -> f64 {
        match self {
            Self::Found(path) => path.distance_km,
            Self::Failed { .. } => f64::INFINITY,
        }
    }

    pub fn geometry(&self) -> &[Coordinates] {
        match self {
            Self::Found(path) => &path.geometry,
            Self::Failed { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&SolverFailure> {
        match self {
            Self::Found(_) => None,
            Self::Failed { reason } => Some(reason),
        }
    }

    pub fn path(&self) -> Option<&RoutePath> {
        match self {
            Self::Found(path) => Some(path),
            Self::Failed { .. } => None,
        }
    }
}

/// One origin evaluated for a destination, kept for presentation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteCandidate {
    pub origin_name: String,
    pub success: bool,
    /// `None` when the attempt failed (JSON has no infinity).
    pub distance_nm: Option<f64>,
    pub error: Option<String>,
}

impl RouteCandidate {
    pub fn from_result(origin_name: &str, result: &RouteResult) -> Self {
        Self {
            origin_name: origin_name.to_string(),
            success: result.is_success(),
            distance_nm: result.path().map(|p| p.distance_nm),
            error: result.error().map(|e| e.to_string()),
        }
    }
}

/// The winning route for one destination of one product.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectedRoute {
    pub product: ProductId,
    pub origin_name: String,
    pub origin_coords: Coordinates,
    pub dest_name: String,
    pub dest_coords: Coordinates,
    pub distance_nm: f64,
    pub distance_km: f64,
    pub geometry: Vec<Coordinates>,
    pub length_source: LengthSource,
    pub volume_kg: u64,
    pub volume_tons: f64,
    /// Every origin that was tried, in eligibility order.
    pub candidates: Vec<RouteCandidate>,
}

/// CO2 attributed to a single selected lane.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmissionRecord {
    pub product: ProductId,
    pub destination: String,
    pub origin: String,
    pub distance_nm: f64,
    pub volume_kg: u64,
    pub volume_tons: f64,
    pub co2_kg: f64,
    pub co2_tons: f64,
}
