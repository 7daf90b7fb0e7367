//! Metrics data structures for minehealth.
//!
//! This module defines the [`Snapshot`] struct which holds the current
//! readings and synthetic history for every piece of equipment, along with
//! the per-reading types it is built from.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::equipment::{EquipmentType, MetricName};

/// Number of past periods kept per metric.
pub const HISTORY_LEN: usize = 12;

/// A single observed value.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct MetricReading {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// One past period's sampled value, for charting.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HistoricalPoint {
    /// Period label (e.g. "Jan 5")
    pub label: String,
    pub value: f64,
}

/// Current and historical readings for one piece of equipment.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: EquipmentType,
    pub name: &'static str,
    pub metrics: HashMap<MetricName, MetricReading>,
    pub historical_data: HashMap<MetricName, Vec<HistoricalPoint>>,
}

impl Equipment {
    /// Equipment with every metric at zero, stamped at the epoch.
    pub fn placeholder(id: EquipmentType) -> Self {
        let epoch = DateTime::<Utc>::default();
        let metrics = MetricName::ALL
            .iter()
            .map(|&m| {
                (
                    m,
                    MetricReading {
                        value: 0.0,
                        timestamp: epoch,
                    },
                )
            })
            .collect();
        Self {
            id,
            name: id.label(),
            metrics,
            historical_data: HashMap::new(),
        }
    }

    /// Current value of a metric, if one has been recorded.
    pub fn value(&self, metric: MetricName) -> Option<f64> {
        self.metrics.get(&metric).map(|r| r.value)
    }

    /// Historical series for a metric (empty if none).
    pub fn history(&self, metric: MetricName) -> &[HistoricalPoint] {
        self.historical_data
            .get(&metric)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Whether the snapshot carries real simulated data yet.
#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotState {
    /// Placeholder values only; alerts must not be raised
    #[default]
    Uninitialized,
    /// Simulation has started
    Live,
}

/// Readings for all equipment at a point in time.
#[derive(Serialize, Clone, Debug)]
pub struct Snapshot {
    pub state: SnapshotState,
    pub equipment: Vec<Equipment>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            state: SnapshotState::Uninitialized,
            equipment: EquipmentType::ALL
                .iter()
                .map(|&t| Equipment::placeholder(t))
                .collect(),
        }
    }
}

impl Snapshot {
    pub fn is_live(&self) -> bool {
        self.state == SnapshotState::Live
    }

    /// Look up one piece of equipment.
    pub fn get(&self, id: EquipmentType) -> Option<&Equipment> {
        self.equipment.iter().find(|e| e.id == id)
    }

    /// Iterate over every (equipment, metric, reading) triple.
    pub fn readings(
        &self,
    ) -> impl Iterator<Item = (EquipmentType, MetricName, MetricReading)> + '_ {
        self.equipment.iter().flat_map(|eq| {
            MetricName::ALL
                .iter()
                .filter_map(move |&m| eq.metrics.get(&m).map(|r| (eq.id, m, *r)))
        })
    }
}

/// Round to one decimal place, as readings are displayed.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
