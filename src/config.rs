//! Static configuration: ports, product tables, CO2 factors and scenarios.
//!
//! Loaded once, validated up front, then passed around immutably. Malformed
//! tables are rejected here so per-request computation never has to.

use std::{
    collections::{HashMap, HashSet},
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{Disruption, Port, Restriction, Scenario, Severity};
use crate::util::{assets, persistence};

/// kg CO2e per ton-nautical-mile for products without their own factor.
pub const DEFAULT_CO2_FACTOR: f64 = 0.00463;

pub const DEFAULT_BASELINE_KEY: &str = "baseline";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("bundled configuration asset `{0}` is missing or not UTF-8")]
    MissingAsset(String),
    #[error("{table} `{name}` has invalid coordinates ({lon}, {lat})")]
    InvalidCoordinates {
        table: &'static str,
        name: String,
        lon: f64,
        lat: f64,
    },
    #[error("duplicate {table} `{name}`")]
    Duplicate { table: &'static str, name: String },
    #[error("{context} references unknown origin `{name}`")]
    UnknownOrigin { context: String, name: String },
    #[error("product `{product}` ships to unknown destination `{name}`")]
    UnknownDestination { product: String, name: String },
    #[error("CO2 factor for {target} must be finite and non-negative, got {value}")]
    InvalidFactor { target: String, value: f64 },
    #[error("export volumes for {scope} overflow a 64-bit kilogram total")]
    VolumeOverflow { scope: String },
}

/// Per-commodity tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub name: String,
    /// kg CO2e per ton-nautical-mile; falls back to the default factor.
    #[serde(default)]
    pub co2_factor: Option<f64>,
    #[serde(default)]
    pub vessel_class: Option<String>,
    /// Ports allowed to export this product, in preference order. Absent means
    /// any online origin.
    #[serde(default)]
    pub origins: Option<Vec<String>>,
    /// Destination name -> export mass in kilograms.
    #[serde(default)]
    pub export_volumes_kg: HashMap<String, u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    #[serde(default = "default_baseline_key")]
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            key: default_baseline_key(),
            label: None,
            restrictions: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub headline: Option<String>,
    /// Changes applied on top of the baseline.
    #[serde(default)]
    pub disruptions: Vec<Disruption>,
}

/// On-disk shape of the configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default = "default_co2_factor")]
    pub default_co2_factor: f64,
    #[serde(default)]
    pub origins: Vec<Port>,
    #[serde(default)]
    pub destinations: Vec<Port>,
    #[serde(default)]
    pub products: Vec<ProductConfig>,
    #[serde(default)]
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub scenarios: Vec<ScenarioConfig>,
}

fn default_co2_factor() -> f64 {
    DEFAULT_CO2_FACTOR
}

fn default_baseline_key() -> String {
    DEFAULT_BASELINE_KEY.to_string()
}

/// Where a configuration was loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    UserOverride(PathBuf),
    Bundled,
}

/// Validated, immutable configuration.
#[derive(Clone, Debug)]
pub struct StaticConfig {
    default_co2_factor: f64,
    origins: Vec<Port>,
    destinations: Vec<Port>,
    products: Vec<ProductConfig>,
    baseline: Scenario,
    scenarios: Vec<Scenario>,
}

impl StaticConfig {
    pub fn builder() -> StaticConfigBuilder {
        StaticConfigBuilder::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// The configuration shipped inside the binary.
    pub fn bundled() -> Result<Self, ConfigError> {
        let json = assets::default_config_json()
            .ok_or_else(|| ConfigError::MissingAsset(assets::DEFAULT_CONFIG_ASSET.to_string()))?;
        Self::from_json_str(&json)
    }

    /// Explicit path, else the user override file, else the bundled tables.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        if let Some(path) = explicit {
            let config = Self::from_path(path)?;
            info!(path = %path.display(), "loaded configuration");
            return Ok((config, ConfigSource::File(path.to_path_buf())));
        }

        if let Some(path) = persistence::user_config_file().filter(|p| p.exists()) {
            let config = Self::from_path(&path)?;
            info!(path = %path.display(), "loaded user configuration override");
            return Ok((config, ConfigSource::UserOverride(path)));
        }

        Ok((Self::bundled()?, ConfigSource::Bundled))
    }

    pub fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        check_factor("the default", raw.default_co2_factor)?;
        check_ports("origin", &raw.origins)?;
        check_ports("destination", &raw.destinations)?;

        let origin_names: HashSet<&str> = raw.origins.iter().map(|p| p.name.as_str()).collect();
        let destination_names: HashSet<&str> =
            raw.destinations.iter().map(|p| p.name.as_str()).collect();

        let mut product_names = HashSet::new();
        for product in &raw.products {
            if !product_names.insert(product.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    table: "product",
                    name: product.name.clone(),
                });
            }
            if let Some(factor) = product.co2_factor {
                check_factor(&format!("`{}`", product.name), factor)?;
            }
            let mut eligible = HashSet::new();
            for origin in product.origins.iter().flatten() {
                if !origin_names.contains(origin.as_str()) {
                    return Err(ConfigError::UnknownOrigin {
                        context: format!("product `{}`", product.name),
                        name: origin.clone(),
                    });
                }
                if !eligible.insert(origin.as_str()) {
                    return Err(ConfigError::Duplicate {
                        table: "eligible origin",
                        name: origin.clone(),
                    });
                }
            }
            for destination in product.export_volumes_kg.keys() {
                if !destination_names.contains(destination.as_str()) {
                    return Err(ConfigError::UnknownDestination {
                        product: product.name.clone(),
                        name: destination.clone(),
                    });
                }
            }
        }

        check_volume_totals(&raw.products)?;

        let mut baseline_builder = Scenario::builder(raw.baseline.key.clone())
            .close_all(raw.baseline.restrictions.iter().copied());
        if let Some(label) = &raw.baseline.label {
            baseline_builder = baseline_builder.label(label.clone());
        }
        let baseline = baseline_builder.build();

        let mut scenario_keys = HashSet::from([baseline.key().to_string()]);
        let mut scenarios = Vec::with_capacity(raw.scenarios.len());
        for definition in &raw.scenarios {
            if !scenario_keys.insert(definition.key.clone()) {
                return Err(ConfigError::Duplicate {
                    table: "scenario",
                    name: definition.key.clone(),
                });
            }
            for disruption in &definition.disruptions {
                if let Disruption::Offline(origin) = disruption {
                    if !origin_names.contains(origin.as_str()) {
                        return Err(ConfigError::UnknownOrigin {
                            context: format!("scenario `{}`", definition.key),
                            name: origin.clone(),
                        });
                    }
                }
            }
            scenarios.push(build_scenario(&baseline, definition));
        }

        Ok(Self {
            default_co2_factor: raw.default_co2_factor,
            origins: raw.origins,
            destinations: raw.destinations,
            products: raw.products,
            baseline,
            scenarios,
        })
    }

    pub fn origins(&self) -> &[Port] {
        &self.origins
    }

    pub fn destinations(&self) -> &[Port] {
        &self.destinations
    }

    pub fn products(&self) -> &[ProductConfig] {
        &self.products
    }

    pub fn product(&self, name: &str) -> Option<&ProductConfig> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn product_names(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(|p| p.name.as_str())
    }

    pub fn default_co2_factor(&self) -> f64 {
        self.default_co2_factor
    }

    /// Factor for `product`, or the default when the product has none.
    pub fn co2_factor(&self, product: &str) -> f64 {
        match self.product(product).and_then(|p| p.co2_factor) {
            Some(factor) => factor,
            None => {
                warn!(
                    product,
                    fallback = self.default_co2_factor,
                    "no CO2 factor mapped; using default"
                );
                self.default_co2_factor
            }
        }
    }

    /// Export mass in kg; zero for unmapped lanes.
    pub fn export_volume_kg(&self, product: &str, destination: &str) -> u64 {
        self.product(product)
            .and_then(|p| p.export_volumes_kg.get(destination))
            .copied()
            .unwrap_or(0)
    }

    /// Configured origins not taken offline by `scenario`, in table order.
    pub fn online_origins(&self, scenario: &Scenario) -> Vec<Port> {
        self.origins
            .iter()
            .filter(|port| scenario.is_online(&port.name))
            .cloned()
            .collect()
    }

    pub fn baseline_scenario(&self) -> &Scenario {
        &self.baseline
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Look up a scenario by key; the baseline's own key resolves to it.
    pub fn scenario(&self, key: &str) -> Option<&Scenario> {
        if key == self.baseline.key() {
            return Some(&self.baseline);
        }
        self.scenarios.iter().find(|s| s.key() == key)
    }
}

fn build_scenario(baseline: &Scenario, definition: &ScenarioConfig) -> Scenario {
    let mut builder = baseline
        .derive(definition.key.clone())
        .severity(definition.severity);
    if let Some(label) = &definition.label {
        builder = builder.label(label.clone());
    }
    if let Some(headline) = &definition.headline {
        builder = builder.headline(headline.clone());
    }
    definition
        .disruptions
        .iter()
        .fold(builder, |builder, disruption| builder.apply(disruption))
        .build()
}

fn check_ports(table: &'static str, ports: &[Port]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for port in ports {
        if !port.coordinates.is_valid() {
            return Err(ConfigError::InvalidCoordinates {
                table,
                name: port.name.clone(),
                lon: port.coordinates.lon,
                lat: port.coordinates.lat,
            });
        }
        if !seen.insert(port.name.as_str()) {
            return Err(ConfigError::Duplicate {
                table,
                name: port.name.clone(),
            });
        }
    }
    Ok(())
}

/// Per-product and grand volume totals must fit in `u64` so that summing
/// lanes during evaluation cannot overflow.
fn check_volume_totals(products: &[ProductConfig]) -> Result<(), ConfigError> {
    let mut grand_total = 0_u64;
    for product in products {
        let product_total = product
            .export_volumes_kg
            .values()
            .try_fold(0_u64, |sum, kg| sum.checked_add(*kg))
            .ok_or_else(|| ConfigError::VolumeOverflow {
                scope: format!("product `{}`", product.name),
            })?;
        grand_total = grand_total
            .checked_add(product_total)
            .ok_or_else(|| ConfigError::VolumeOverflow {
                scope: "all products".to_string(),
            })?;
    }
    Ok(())
}

fn check_factor(target: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidFactor {
            target: target.to_string(),
            value,
        })
    }
}

/// Programmatic construction, validated the same way as a loaded file.
#[derive(Clone, Debug, Default)]
pub struct StaticConfigBuilder {
    raw: RawConfig,
    default_factor: Option<f64>,
}

impl StaticConfigBuilder {
    pub fn origin(mut self, port: Port) -> Self {
        self.raw.origins.push(port);
        self
    }

    pub fn destination(mut self, port: Port) -> Self {
        self.raw.destinations.push(port);
        self
    }

    pub fn product(mut self, product: ProductConfig) -> Self {
        self.raw.products.push(product);
        self
    }

    pub fn default_co2_factor(mut self, factor: f64) -> Self {
        self.default_factor = Some(factor);
        self
    }

    pub fn baseline_restrictions(mut self, restrictions: impl IntoIterator<Item = Restriction>) -> Self {
        self.raw.baseline.restrictions.extend(restrictions);
        self
    }

    pub fn scenario(mut self, scenario: ScenarioConfig) -> Self {
        self.raw.scenarios.push(scenario);
        self
    }

    pub fn build(mut self) -> Result<StaticConfig, ConfigError> {
        self.raw.default_co2_factor = self.default_factor.unwrap_or(DEFAULT_CO2_FACTOR);
        StaticConfig::from_raw(self.raw)
    }
}
