//! Closable chokepoints and the immutable scenarios built from them.

use std::{
    collections::BTreeSet,
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named maritime passage that can be closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Restriction {
    Suez,
    Panama,
    Northwest,
    Northeast,
    Bering,
    Gibraltar,
    Babalmandab,
    Malacca,
    Sunda,
    Ormuz,
}

impl Restriction {
    pub const ALL: [Restriction; 10] = [
        Restriction::Suez,
        Restriction::Panama,
        Restriction::Northwest,
        Restriction::Northeast,
        Restriction::Bering,
        Restriction::Gibraltar,
        Restriction::Babalmandab,
        Restriction::Malacca,
        Restriction::Sunda,
        Restriction::Ormuz,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Suez => "suez",
            Self::Panama => "panama",
            Self::Northwest => "northwest",
            Self::Northeast => "northeast",
            Self::Bering => "bering",
            Self::Gibraltar => "gibraltar",
            Self::Babalmandab => "babalmandab",
            Self::Malacca => "malacca",
            Self::Sunda => "sunda",
            Self::Ormuz => "ormuz",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Suez => "Suez Canal",
            Self::Panama => "Panama Canal",
            Self::Northwest => "Northwest Passage",
            Self::Northeast => "Northern Sea Route",
            Self::Bering => "Bering Strait",
            Self::Gibraltar => "Strait of Gibraltar",
            Self::Babalmandab => "Bab-el-Mandeb",
            Self::Malacca => "Strait of Malacca",
            Self::Sunda => "Sunda Strait",
            Self::Ormuz => "Strait of Hormuz",
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown restriction `{0}`")]
pub struct UnknownRestriction(pub String);

impl FromStr for Restriction {
    type Err = UnknownRestriction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.key() == lowered)
            .ok_or_else(|| UnknownRestriction(s.to_string()))
    }
}

/// Ordered, de-duplicated set of closed passages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestrictionSet(BTreeSet<Restriction>);

impl RestrictionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, restriction: Restriction) -> bool {
        self.0.contains(&restriction)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Restriction> + '_ {
        self.0.iter().copied()
    }

    /// Returns a new set with `restriction` added; `self` is left untouched.
    pub fn with(&self, restriction: Restriction) -> Self {
        let mut next = self.0.clone();
        next.insert(restriction);
        Self(next)
    }

    pub fn is_superset(&self, other: &RestrictionSet) -> bool {
        self.0.is_superset(&other.0)
    }
}

impl FromIterator<Restriction> for RestrictionSet {
    fn from_iter<I: IntoIterator<Item = Restriction>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for RestrictionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        let keys: Vec<&str> = self.0.iter().map(Restriction::key).collect();
        f.write_str(&keys.join(", "))
    }
}

/// One change a scenario applies on top of the baseline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disruption {
    /// Close a chokepoint.
    Close(Restriction),
    /// Take an origin port offline.
    Offline(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Immutable evaluation scenario: closed passages plus offline origins.
///
/// Built once through [`ScenarioBuilder`]; deriving one scenario from another
/// clones the sets, so the source is never affected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Scenario {
    key: String,
    label: String,
    severity: Severity,
    headline: Option<String>,
    restrictions: RestrictionSet,
    offline_origins: BTreeSet<String>,
}

impl Scenario {
    pub fn builder(key: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder::new(key)
    }

    /// Start a builder that inherits this scenario's restrictions and outages.
    pub fn derive(&self, key: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder {
            key: key.into(),
            label: None,
            severity: Severity::Normal,
            headline: None,
            restrictions: self.restrictions.0.clone(),
            offline_origins: self.offline_origins.clone(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn headline(&self) -> Option<&str> {
        self.headline.as_deref()
    }

    pub fn restrictions(&self) -> &RestrictionSet {
        &self.restrictions
    }

    pub fn offline_origins(&self) -> &BTreeSet<String> {
        &self.offline_origins
    }

    pub fn is_online(&self, origin: &str) -> bool {
        !self.offline_origins.contains(origin)
    }
}

#[derive(Clone, Debug)]
pub struct ScenarioBuilder {
    key: String,
    label: Option<String>,
    severity: Severity,
    headline: Option<String>,
    restrictions: BTreeSet<Restriction>,
    offline_origins: BTreeSet<String>,
}

impl ScenarioBuilder {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: None,
            severity: Severity::Normal,
            headline: None,
            restrictions: BTreeSet::new(),
            offline_origins: BTreeSet::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = Some(headline.into());
        self
    }

    pub fn close(mut self, restriction: Restriction) -> Self {
        self.restrictions.insert(restriction);
        self
    }

    pub fn close_all(mut self, restrictions: impl IntoIterator<Item = Restriction>) -> Self {
        self.restrictions.extend(restrictions);
        self
    }

    pub fn offline(mut self, origin: impl Into<String>) -> Self {
        self.offline_origins.insert(origin.into());
        self
    }

    pub fn apply(self, disruption: &Disruption) -> Self {
        match disruption {
            Disruption::Close(restriction) => self.close(*restriction),
            Disruption::Offline(origin) => self.offline(origin.clone()),
        }
    }

    pub fn build(self) -> Scenario {
        let label = self.label.unwrap_or_else(|| self.key.clone());
        Scenario {
            key: self.key,
            label,
            severity: self.severity,
            headline: self.headline,
            restrictions: RestrictionSet(self.restrictions),
            offline_origins: self.offline_origins,
        }
    }
}
