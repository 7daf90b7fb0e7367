//! Threshold definitions for minehealth.
//!
//! This module defines alert severity levels, user-configured limits on
//! (equipment, metric) pairs, and the [`ThresholdStore`] holding them for
//! the session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::equipment::{EquipmentType, MetricName};

/// Severity level for an alert.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Approaching a limit
    Warning,
    /// Limit breached - immediate attention needed
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Critical => f.write_str("critical"),
        }
    }
}

/// Which side of a threshold was crossed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    Upper,
    Lower,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitKind::Upper => f.write_str("upper"),
            LimitKind::Lower => f.write_str("lower"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("threshold for {equipment} {metric} must set a lower or upper limit")]
    MissingLimit {
        equipment: EquipmentType,
        metric: MetricName,
    },
    #[error("invalid threshold `{input}`: {reason}")]
    Parse { input: String, reason: String },
}

/// Outcome of checking a value against one threshold.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Breach {
    pub kind: LimitKind,
    /// The limit that was crossed or approached
    pub limit: f64,
    pub severity: Severity,
}

/// A user-defined limit pair on one (equipment, metric).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threshold {
    /// Empty until the store assigns one
    #[serde(default)]
    pub id: String,
    pub equipment_type: EquipmentType,
    pub metric_name: MetricName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_limit: Option<f64>,
}

impl Threshold {
    /// New, unsaved threshold with no limits.
    pub fn new(equipment_type: EquipmentType, metric_name: MetricName) -> Self {
        Self {
            id: String::new(),
            equipment_type,
            metric_name,
            lower_limit: None,
            upper_limit: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn upper(mut self, limit: f64) -> Self {
        self.upper_limit = Some(limit);
        self
    }

    pub fn lower(mut self, limit: f64) -> Self {
        self.lower_limit = Some(limit);
        self
    }

    /// Whether this threshold applies to the given pair.
    pub fn applies_to(&self, equipment: EquipmentType, metric: MetricName) -> bool {
        self.equipment_type == equipment && self.metric_name == metric
    }

    /// Check that at least one limit is set.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        if self.lower_limit.is_none() && self.upper_limit.is_none() {
            return Err(ThresholdError::MissingLimit {
                equipment: self.equipment_type,
                metric: self.metric_name,
            });
        }
        Ok(())
    }

    /// Evaluate a value against this threshold.
    ///
    /// The upper limit is checked first, so a misconfigured pair with
    /// `lower > upper` reports the upper side. With `warning_margin` set, a
    /// value that has not breached but lies within `margin * |limit|` of a
    /// limit yields a [`Severity::Warning`] result.
    pub fn evaluate(&self, value: f64, warning_margin: Option<f64>) -> Option<Breach> {
        if let Some(upper) = self.upper_limit {
            if value > upper {
                return Some(Breach {
                    kind: LimitKind::Upper,
                    limit: upper,
                    severity: Severity::Critical,
                });
            }
        }
        if let Some(lower) = self.lower_limit {
            if value < lower {
                return Some(Breach {
                    kind: LimitKind::Lower,
                    limit: lower,
                    severity: Severity::Critical,
                });
            }
        }

        let margin = warning_margin.filter(|m| *m > 0.0)?;
        if let Some(upper) = self.upper_limit {
            if value > upper - margin * upper.abs() {
                return Some(Breach {
                    kind: LimitKind::Upper,
                    limit: upper,
                    severity: Severity::Warning,
                });
            }
        }
        if let Some(lower) = self.lower_limit {
            if value < lower + margin * lower.abs() {
                return Some(Breach {
                    kind: LimitKind::Lower,
                    limit: lower,
                    severity: Severity::Warning,
                });
            }
        }
        None
    }
}

/// Parses `EQUIPMENT:METRIC:[LOWER]:[UPPER]`, e.g. `sheave:temperature::50`.
impl FromStr for Threshold {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = |reason: String| ThresholdError::Parse {
            input: s.to_string(),
            reason,
        };

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4 {
            return Err(parse_err(
                "expected EQUIPMENT:METRIC:[LOWER]:[UPPER]".to_string(),
            ));
        }

        let equipment: EquipmentType = parts[0].trim().parse().map_err(parse_err)?;
        let metric: MetricName = parts[1].trim().parse().map_err(parse_err)?;
        let limit = |raw: &str| -> Result<Option<f64>, ThresholdError> {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(None);
            }
            raw.parse::<f64>()
                .map(Some)
                .map_err(|e| parse_err(format!("bad limit `{raw}`: {e}")))
        };

        let threshold = Threshold {
            lower_limit: limit(parts[2])?,
            upper_limit: limit(parts[3])?,
            ..Threshold::new(equipment, metric)
        };
        threshold.validate()?;
        Ok(threshold)
    }
}

/// Session-lifetime collection of thresholds.
///
/// Several thresholds may target the same (equipment, metric) pair; the
/// store does not validate limits, callers run [`Threshold::validate`].
#[derive(Clone, Debug, Default)]
pub struct ThresholdStore {
    thresholds: Vec<Threshold>,
}

impl ThresholdStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the stock demo limits.
    pub fn with_defaults() -> Self {
        Self {
            thresholds: vec![
                Threshold::new(EquipmentType::WindingRope, MetricName::Temperature)
                    .with_id("1")
                    .upper(40.0),
                Threshold::new(EquipmentType::WindingRope, MetricName::Corrosion)
                    .with_id("2")
                    .upper(5.0),
                Threshold::new(EquipmentType::Sheave, MetricName::Temperature)
                    .with_id("3")
                    .upper(50.0),
            ],
        }
    }

    /// Replace the threshold with the same id, or append it under a fresh id.
    ///
    /// Returns the id the threshold is stored under.
    pub fn upsert(&mut self, mut threshold: Threshold) -> String {
        if let Some(existing) = self.thresholds.iter_mut().find(|t| t.id == threshold.id) {
            *existing = threshold;
            return existing.id.clone();
        }
        threshold.id = Uuid::new_v4().to_string();
        let id = threshold.id.clone();
        self.thresholds.push(threshold);
        id
    }

    /// Delete by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let len_before = self.thresholds.len();
        self.thresholds.retain(|t| t.id != id);
        self.thresholds.len() < len_before
    }

    pub fn all(&self) -> &[Threshold] {
        &self.thresholds
    }

    pub fn get(&self, id: &str) -> Option<&Threshold> {
        self.thresholds.iter().find(|t| t.id == id)
    }

    /// Thresholds applying to one (equipment, metric) pair.
    pub fn matching(
        &self,
        equipment: EquipmentType,
        metric: MetricName,
    ) -> impl Iterator<Item = &Threshold> {
        self.thresholds
            .iter()
            .filter(move |t| t.applies_to(equipment, metric))
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}
