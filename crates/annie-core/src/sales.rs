//! Unit-count bundle shared by the API client and the correction table.

use serde::{Deserialize, Serialize};

/// A unit metric reported per sale day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitMetric {
    Downloads,
    Updates,
    Refunds,
}

impl std::fmt::Display for UnitMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitMetric::Downloads => write!(f, "downloads"),
            UnitMetric::Updates => write!(f, "updates"),
            UnitMetric::Refunds => write!(f, "refunds"),
        }
    }
}

/// Unit counts for one sale day. Absent counts stay `None` and are written
/// as empty cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitsBundle {
    #[serde(default)]
    pub downloads: Option<i64>,
    #[serde(default)]
    pub updates: Option<i64>,
    #[serde(default)]
    pub refunds: Option<i64>,
}

impl UnitsBundle {
    #[must_use]
    pub fn get(&self, metric: UnitMetric) -> Option<i64> {
        match metric {
            UnitMetric::Downloads => self.downloads,
            UnitMetric::Updates => self.updates,
            UnitMetric::Refunds => self.refunds,
        }
    }

    pub fn set(&mut self, metric: UnitMetric, value: i64) {
        let slot = match metric {
            UnitMetric::Downloads => &mut self.downloads,
            UnitMetric::Updates => &mut self.updates,
            UnitMetric::Refunds => &mut self.refunds,
        };
        *slot = Some(value);
    }
}
