use super::{BidId, Map};

/// A single diagnostic value reported by a mechanism
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Metric {
    /// A yes/no diagnostic, such as a convergence flag
    Flag(bool),
    /// A counter, such as an iteration count
    Count(u64),
    /// A scalar, such as a price or a welfare total
    Number(f64),
    /// Free-form text, such as an optimizer status
    Text(String),
    /// A value per participant, such as Shapley shares
    Shares(Map<BidId, f64>),
    /// A sequence of records, such as a per-round log
    Table(Vec<Map<String, f64>>),
}

impl From<bool> for Metric {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<u64> for Metric {
    fn from(value: u64) -> Self {
        Self::Count(value)
    }
}

impl From<usize> for Metric {
    fn from(value: usize) -> Self {
        Self::Count(value as u64)
    }
}

impl From<f64> for Metric {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for Metric {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Metric {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Map<BidId, f64>> for Metric {
    fn from(value: Map<BidId, f64>) -> Self {
        Self::Shares(value)
    }
}

impl From<Vec<Map<String, f64>>> for Metric {
    fn from(value: Vec<Map<String, f64>>) -> Self {
        Self::Table(value)
    }
}

/// Mechanism-specific diagnostics, keyed by name in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Metrics(Map<String, Metric>);

impl Metrics {
    /// Record a metric, replacing any previous value under the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Metric>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`Metrics::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Metric>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a scalar metric
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.0.get(name) {
            Some(Metric::Number(x)) => Some(*x),
            Some(Metric::Count(x)) => Some(*x as f64),
            _ => None,
        }
    }

    /// Look up a per-participant metric
    pub fn shares(&self, name: &str) -> Option<&Map<BidId, f64>> {
        match self.0.get(name) {
            Some(Metric::Shares(x)) => Some(x),
            _ => None,
        }
    }

    /// Move all of `other`'s entries into `self`
    pub fn extend(&mut self, other: Metrics) {
        self.0.extend(other.0);
    }
}

impl std::ops::Deref for Metrics {
    type Target = Map<String, Metric>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
