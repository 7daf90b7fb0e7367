//! Mock sensor source for minehealth.
//!
//! There is no real sensor ingestion: readings are produced by a clamped
//! random walk seeded from a metric-specific base distribution. The random
//! source is a [`ChaCha20Rng`] so a fixed seed replays the exact same
//! sequence.

use std::str::FromStr;

use chrono::{DateTime, Months, Utc};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use crate::equipment::{EquipmentType, MetricName};
use crate::metrics::{
    round1, Equipment, HistoricalPoint, MetricReading, Snapshot, SnapshotState, HISTORY_LEN,
};

/// How the per-metric history evolves after initialization.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// Backfilled once, never appended
    #[default]
    Static,
    /// Every tick appends the new reading and drops the oldest point.
    ///
    /// Appended points are labelled with the tick's wall time (`%H:%M:%S`),
    /// while the backfilled monthly points keep their `%b %-d` labels until
    /// they roll out of the window.
    Rolling,
}

impl FromStr for HistoryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Ok(HistoryMode::Static),
            "rolling" => Ok(HistoryMode::Rolling),
            _ => Err(format!("unknown history mode `{s}` (expected static or rolling)")),
        }
    }
}

/// Produces plausible readings for every (equipment, metric) pair.
pub struct Simulator {
    rng: ChaCha20Rng,
    history_mode: HistoryMode,
}

impl Simulator {
    /// Simulator replaying a deterministic sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(ChaCha20Rng::seed_from_u64(seed))
    }

    /// Simulator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::with_rng(ChaCha20Rng::from_entropy())
    }

    pub fn with_rng(rng: ChaCha20Rng) -> Self {
        Self {
            rng,
            history_mode: HistoryMode::default(),
        }
    }

    pub fn with_history_mode(mut self, mode: HistoryMode) -> Self {
        self.history_mode = mode;
        self
    }

    pub fn history_mode(&self) -> HistoryMode {
        self.history_mode
    }

    /// Replace the snapshot with freshly drawn readings and backfilled history.
    pub fn initialize(&mut self, snapshot: &mut Snapshot, now: DateTime<Utc>) {
        snapshot.equipment = EquipmentType::ALL
            .iter()
            .map(|&id| self.initial_equipment(id, now))
            .collect();
        snapshot.state = SnapshotState::Live;
    }

    fn initial_equipment(&mut self, id: EquipmentType, now: DateTime<Utc>) -> Equipment {
        let mut equipment = Equipment::placeholder(id);
        for metric in MetricName::ALL {
            let value = round1(self.base_value(metric));
            equipment.metrics.insert(
                metric,
                MetricReading {
                    value,
                    timestamp: now,
                },
            );
            let history = (0..HISTORY_LEN)
                .map(|i| {
                    let months_back = (HISTORY_LEN - 1 - i) as u32;
                    let date = now
                        .checked_sub_months(Months::new(months_back))
                        .unwrap_or(now);
                    HistoricalPoint {
                        label: date.format("%b %-d").to_string(),
                        value: round1(self.base_value(metric) + trend(metric, i)),
                    }
                })
                .collect();
            equipment.historical_data.insert(metric, history);
        }
        equipment
    }

    /// Draw from the metric's base distribution.
    fn base_value(&mut self, metric: MetricName) -> f64 {
        match metric {
            MetricName::Temperature => self.rng.gen_range(10.0..50.0),
            MetricName::Corrosion => self.rng.gen_range(0.0..3.0),
            MetricName::DiameterReduction => self.rng.gen_range(0.0..5.0),
            MetricName::Strength => self.rng.gen_range(3000.0..4000.0),
        }
    }

    /// Advance every reading by one clamped random step.
    ///
    /// Does nothing while the snapshot still holds placeholder data.
    pub fn tick(&mut self, snapshot: &mut Snapshot, now: DateTime<Utc>) {
        if !snapshot.is_live() {
            return;
        }

        let rolling = self.history_mode == HistoryMode::Rolling;
        for equipment in &mut snapshot.equipment {
            for metric in MetricName::ALL {
                let config = metric.config();
                let old = equipment.value(metric).unwrap_or(0.0);
                let delta = self.rng.gen_range(-config.step..=config.step);
                let value = round1(config.clamp(old + delta));
                equipment.metrics.insert(
                    metric,
                    MetricReading {
                        value,
                        timestamp: now,
                    },
                );

                if rolling {
                    let series = equipment.historical_data.entry(metric).or_default();
                    series.push(HistoricalPoint {
                        label: now.format("%H:%M:%S").to_string(),
                        value,
                    });
                    if series.len() > HISTORY_LEN {
                        let excess = series.len() - HISTORY_LEN;
                        series.drain(..excess);
                    }
                }
            }
        }
    }
}

/// Drift added to the i-th backfilled point so charts show movement.
fn trend(metric: MetricName, i: usize) -> f64 {
    let i = i as f64;
    match metric {
        MetricName::Temperature => (i / 2.0).sin() * 5.0,
        MetricName::Corrosion => i * 0.1,
        MetricName::DiameterReduction => i * 0.2,
        MetricName::Strength => -(i * 50.0),
    }
}
