//! Manual correction table for sales unit counts.
//!
//! Rules are keyed by product id, then ISO sale date, then metric. A rule only
//! fires when the observed value still equals the value it was written
//! against, so a correction the upstream API has since fixed is left alone.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::sales::{UnitMetric, UnitsBundle};
use crate::ConfigError;

/// A conditional patch: replace `expected` with `replacement`.
///
/// Written in YAML as a two-element list, `[expected, replacement]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(i64, i64)")]
pub struct CorrectionRule {
    pub expected: i64,
    pub replacement: i64,
}

impl From<(i64, i64)> for CorrectionRule {
    fn from((expected, replacement): (i64, i64)) -> Self {
        Self {
            expected,
            replacement,
        }
    }
}

type DateRules = BTreeMap<UnitMetric, CorrectionRule>;

#[derive(Debug, Default, Deserialize)]
pub struct CorrectionTable {
    #[serde(default)]
    corrections: HashMap<String, HashMap<String, DateRules>>,
}

impl CorrectionTable {
    /// Adds a single rule, replacing any rule for the same key.
    pub fn insert(&mut self, product_id: &str, date: &str, metric: UnitMetric, rule: CorrectionRule) {
        self.corrections
            .entry(product_id.to_string())
            .or_default()
            .entry(date.to_string())
            .or_default()
            .insert(metric, rule);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corrections.values().all(HashMap::is_empty)
    }

    /// Applies every rule registered for `(product_id, date)` to `units`.
    ///
    /// Returns the number of metrics that were replaced. Metrics without a
    /// rule, and rules whose expected value does not match, are untouched.
    pub fn apply(&self, product_id: &str, date: &str, units: &mut UnitsBundle) -> usize {
        let Some(rules) = self
            .corrections
            .get(product_id)
            .and_then(|dates| dates.get(date))
        else {
            return 0;
        };

        let mut applied = 0;
        for (&metric, rule) in rules {
            let observed = units.get(metric);
            if observed == Some(rule.expected) {
                units.set(metric, rule.replacement);
                applied += 1;
                tracing::info!(
                    product_id,
                    date,
                    %metric,
                    from = rule.expected,
                    to = rule.replacement,
                    "applied correction"
                );
            } else {
                tracing::debug!(
                    product_id,
                    date,
                    %metric,
                    ?observed,
                    expected = rule.expected,
                    "correction not applied: observed value differs"
                );
            }
        }
        applied
    }
}

/// Load and validate the correction table from a YAML file.
///
/// A missing file yields an empty table.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_corrections(path: &Path) -> Result<CorrectionTable, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no corrections file; using empty table");
            return Ok(CorrectionTable::default());
        }
        Err(e) => {
            return Err(ConfigError::CorrectionsFileIo {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    parse_corrections(&content)
}

fn parse_corrections(content: &str) -> Result<CorrectionTable, ConfigError> {
    // An empty document deserializes to unit, not to a mapping.
    if content.trim().is_empty() {
        return Ok(CorrectionTable::default());
    }
    let table: CorrectionTable = serde_yaml::from_str(content)?;
    validate_corrections(&table)?;
    Ok(table)
}

fn validate_corrections(table: &CorrectionTable) -> Result<(), ConfigError> {
    for (product_id, dates) in &table.corrections {
        if product_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "product id must be non-empty".to_string(),
            ));
        }

        for (date, rules) in dates {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(ConfigError::Validation(format!(
                    "product '{product_id}' has invalid date '{date}'; expected YYYY-MM-DD"
                )));
            }

            for (metric, rule) in rules {
                if rule.expected == rule.replacement {
                    return Err(ConfigError::Validation(format!(
                        "product '{product_id}' {date} {metric}: replacement equals expected value {}",
                        rule.expected
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "corrections_test.rs"]
mod tests;
