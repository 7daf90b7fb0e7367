//! Alert evaluation for minehealth.
//!
//! The [`AlertEngine`] compares a [`Snapshot`] against the configured
//! thresholds, suppresses repeats inside a cooldown window and keeps a
//! bounded, most-recent-first alert history.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::equipment::{EquipmentType, MetricName};
use crate::metrics::Snapshot;
use crate::thresholds::{Breach, LimitKind, Severity, ThresholdStore};

/// Default suppression window for repeated alerts.
pub const DEFAULT_COOLDOWN_SECS: u64 = 60;

/// Default number of alerts retained.
pub const DEFAULT_CAPACITY: usize = 20;

/// A raised alert. Immutable once created.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub equipment_type: EquipmentType,
    pub metric_name: MetricName,
    pub current_value: f64,
    pub threshold_value: f64,
    pub threshold_type: LimitKind,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
}

impl Alert {
    fn new(
        equipment: EquipmentType,
        metric: MetricName,
        value: f64,
        breach: Breach,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            equipment_type: equipment,
            metric_name: metric,
            current_value: value,
            threshold_value: breach.limit,
            threshold_type: breach.kind,
            timestamp: now,
            severity: breach.severity,
            message: alert_message(equipment, metric, value, &breach),
        }
    }

    /// Whether this alert suppresses a new one of the same kind at `now`.
    fn suppresses(
        &self,
        equipment: EquipmentType,
        metric: MetricName,
        breach: &Breach,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> bool {
        self.equipment_type == equipment
            && self.metric_name == metric
            && self.threshold_type == breach.kind
            && self.severity == breach.severity
            && (now - self.timestamp).abs() < cooldown
    }
}

fn alert_message(
    equipment: EquipmentType,
    metric: MetricName,
    value: f64,
    breach: &Breach,
) -> String {
    let unit = metric.config().unit;
    let verb = match breach.severity {
        Severity::Critical => "has breached",
        Severity::Warning => "is approaching",
    };
    format!(
        "{} {} ({}{}) {} the {} limit of {}{}.",
        equipment.label(),
        metric.config().label,
        value,
        unit,
        verb,
        breach.kind,
        breach.limit,
        unit
    )
}

/// Tuning knobs for the alert engine.
#[derive(Clone, Debug)]
pub struct AlertSettings {
    /// Repeats of the same alert kind inside this window are dropped
    pub cooldown: Duration,
    /// Maximum alerts kept in history
    pub capacity: usize,
    /// Fraction of a limit within which a warning is raised (disabled if None)
    pub warning_margin: Option<f64>,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            cooldown: Duration::seconds(DEFAULT_COOLDOWN_SECS as i64),
            capacity: DEFAULT_CAPACITY,
            warning_margin: None,
        }
    }
}

/// Threshold evaluator with cooldown-based deduplication.
pub struct AlertEngine {
    settings: AlertSettings,
    history: VecDeque<Alert>,
}

impl AlertEngine {
    pub fn new(settings: AlertSettings) -> Self {
        let capacity = settings.capacity;
        Self {
            settings,
            history: VecDeque::with_capacity(capacity),
        }
    }

    pub fn settings(&self) -> &AlertSettings {
        &self.settings
    }

    /// Retained alerts, most recent first.
    pub fn history(&self) -> &VecDeque<Alert> {
        &self.history
    }

    /// Evaluate the snapshot and return the alerts raised by this pass.
    ///
    /// Nothing is evaluated while the snapshot holds placeholder data. New
    /// alerts are also prepended to the history, which is then truncated to
    /// the configured capacity.
    pub fn evaluate(
        &mut self,
        snapshot: &Snapshot,
        thresholds: &ThresholdStore,
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        if !snapshot.is_live() {
            return Vec::new();
        }

        let AlertSettings {
            cooldown,
            warning_margin,
            ..
        } = self.settings;

        let mut raised: Vec<Alert> = Vec::new();
        for (equipment, metric, reading) in snapshot.readings() {
            for threshold in thresholds.matching(equipment, metric) {
                let Some(breach) = threshold.evaluate(reading.value, warning_margin) else {
                    continue;
                };

                let suppressed = self
                    .history
                    .iter()
                    .any(|a| a.suppresses(equipment, metric, &breach, now, cooldown));
                if suppressed {
                    tracing::debug!(
                        equipment = %equipment,
                        metric = metric.as_str(),
                        kind = %breach.kind,
                        "alert suppressed (cooldown)"
                    );
                    continue;
                }

                raised.push(Alert::new(equipment, metric, reading.value, breach, now));
            }
        }

        for alert in raised.iter().rev() {
            self.history.push_front(alert.clone());
        }
        self.history.truncate(self.settings.capacity);

        raised
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(AlertSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::metrics::SnapshotState;
    use crate::thresholds::Threshold;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn live_snapshot() -> Snapshot {
        let mut snap = Snapshot::default();
        snap.state = SnapshotState::Live;
        snap
    }

    fn set(snap: &mut Snapshot, equipment: EquipmentType, metric: MetricName, value: f64) {
        let eq = snap.equipment.iter_mut().find(|e| e.id == equipment).unwrap();
        eq.metrics.get_mut(&metric).unwrap().value = value;
    }

    fn th(equipment: EquipmentType, metric: MetricName) -> Threshold {
        Threshold::new(equipment, metric)
    }

    fn store_with(threshold: Threshold) -> ThresholdStore {
        let mut store = ThresholdStore::new();
        store.upsert(threshold);
        store
    }

    #[test]
    fn upper_breach_raises_one_alert() {
        let mut snap = live_snapshot();
        set(&mut snap, EquipmentType::Drum, MetricName::Temperature, 45.0);
        let store = store_with(th(EquipmentType::Drum, MetricName::Temperature).upper(40.0));

        let mut engine = AlertEngine::default();
        let raised = engine.evaluate(&snap, &store, t0());

        assert_eq!(raised.len(), 1);
        let alert = &raised[0];
        assert_eq!(alert.threshold_type, LimitKind::Upper);
        assert_eq!(alert.current_value, 45.0);
        assert_eq!(alert.threshold_value, 40.0);
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.timestamp, t0());
        assert_eq!(
            alert.message,
            "Drum Temperature (45°C) has breached the upper limit of 40°C."
        );
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn value_within_limits_raises_nothing() {
        let mut snap = live_snapshot();
        set(&mut snap, EquipmentType::Sheave, MetricName::Temperature, 30.0);
        let store = store_with(
            th(EquipmentType::Sheave, MetricName::Temperature)
                .lower(10.0)
                .upper(40.0),
        );

        let mut engine = AlertEngine::default();
        assert!(engine.evaluate(&snap, &store, t0()).is_empty());
        assert!(engine.history().is_empty());
    }

    #[test]
    fn placeholder_snapshot_is_never_evaluated() {
        let snap = Snapshot::default();
        // Every placeholder reading is 0.0, well below this limit.
        let store = store_with(th(EquipmentType::Drum, MetricName::Strength).lower(1000.0));

        let mut engine = AlertEngine::default();
        assert!(engine.evaluate(&snap, &store, t0()).is_empty());
    }

    #[test]
    fn cooldown_suppresses_repeats() {
        let mut snap = live_snapshot();
        set(&mut snap, EquipmentType::WindingRope, MetricName::Corrosion, 6.0);
        let store = store_with(th(EquipmentType::WindingRope, MetricName::Corrosion).upper(5.0));
        let mut engine = AlertEngine::default();

        assert_eq!(engine.evaluate(&snap, &store, t0()).len(), 1);
        assert!(engine
            .evaluate(&snap, &store, t0() + Duration::seconds(30))
            .is_empty());
        assert_eq!(
            engine
                .evaluate(&snap, &store, t0() + Duration::seconds(61))
                .len(),
            1
        );
        assert_eq!(engine.history().len(), 2);
    }

    #[test]
    fn cooldown_is_per_limit_side() {
        let mut snap = live_snapshot();
        set(&mut snap, EquipmentType::Drum, MetricName::Strength, 3500.0);
        let mut store = ThresholdStore::new();
        store.upsert(th(EquipmentType::Drum, MetricName::Strength).upper(3000.0));
        let mut engine = AlertEngine::default();
        assert_eq!(engine.evaluate(&snap, &store, t0()).len(), 1);

        set(&mut snap, EquipmentType::Drum, MetricName::Strength, 2500.0);
        store.upsert(th(EquipmentType::Drum, MetricName::Strength).lower(2800.0));
        let raised = engine.evaluate(&snap, &store, t0() + Duration::seconds(5));
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].threshold_type, LimitKind::Lower);
    }

    #[test]
    fn layered_thresholds_each_raise_in_one_pass() {
        let mut snap = live_snapshot();
        set(&mut snap, EquipmentType::Sheave, MetricName::Temperature, 80.0);
        let mut store = ThresholdStore::new();
        store.upsert(th(EquipmentType::Sheave, MetricName::Temperature).upper(50.0));
        store.upsert(th(EquipmentType::Sheave, MetricName::Temperature).upper(70.0));

        let mut engine = AlertEngine::default();
        let raised = engine.evaluate(&snap, &store, t0());
        let limits: Vec<f64> = raised.iter().map(|a| a.threshold_value).collect();
        assert_eq!(limits, vec![50.0, 70.0]);

        // Both now sit in the history and hold off the next pass.
        assert!(engine
            .evaluate(&snap, &store, t0() + Duration::seconds(10))
            .is_empty());
        assert_eq!(engine.history().len(), 2);
    }

    #[test]
    fn history_keeps_twenty_most_recent() {
        let mut snap = live_snapshot();
        set(&mut snap, EquipmentType::Drum, MetricName::Temperature, 100.0);
        let store = store_with(th(EquipmentType::Drum, MetricName::Temperature).upper(40.0));
        let mut engine = AlertEngine::default();

        let mut ids = Vec::new();
        for n in 0..25 {
            let raised = engine.evaluate(&snap, &store, t0() + Duration::seconds(61 * n));
            assert_eq!(raised.len(), 1);
            ids.push(raised[0].id.clone());
        }

        let history = engine.history();
        assert_eq!(history.len(), DEFAULT_CAPACITY);
        let expected: Vec<_> = ids.iter().rev().take(20).cloned().collect();
        let actual: Vec<_> = history.iter().map(|a| a.id.clone()).collect();
        assert_eq!(actual, expected);
        assert!(history
            .iter()
            .zip(history.iter().skip(1))
            .all(|(newer, older)| newer.timestamp > older.timestamp));
    }

    #[test]
    fn one_pass_prepends_in_detection_order() {
        let mut snap = live_snapshot();
        set(&mut snap, EquipmentType::WindingRope, MetricName::Temperature, 90.0);
        set(&mut snap, EquipmentType::Drum, MetricName::Temperature, 90.0);
        let mut store = ThresholdStore::new();
        store.upsert(th(EquipmentType::WindingRope, MetricName::Temperature).upper(40.0));
        store.upsert(th(EquipmentType::Drum, MetricName::Temperature).upper(40.0));

        let mut engine = AlertEngine::default();
        let raised = engine.evaluate(&snap, &store, t0());
        assert_eq!(raised.len(), 2);
        let history: Vec<_> = engine.history().iter().cloned().collect();
        assert_eq!(history, raised);
    }

    #[test]
    fn warning_tier_only_when_enabled() {
        let mut snap = live_snapshot();
        set(&mut snap, EquipmentType::Sheave, MetricName::Temperature, 48.0);
        let store = store_with(th(EquipmentType::Sheave, MetricName::Temperature).upper(50.0));

        let mut plain = AlertEngine::default();
        assert!(plain.evaluate(&snap, &store, t0()).is_empty());

        let mut engine = AlertEngine::new(AlertSettings {
            warning_margin: Some(0.1),
            ..AlertSettings::default()
        });
        let raised = engine.evaluate(&snap, &store, t0());
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].severity, Severity::Warning);
        assert_eq!(
            raised[0].message,
            "Sheave Temperature (48°C) is approaching the upper limit of 50°C."
        );

        // A warning does not hold back the critical breach that follows it.
        set(&mut snap, EquipmentType::Sheave, MetricName::Temperature, 51.0);
        let raised = engine.evaluate(&snap, &store, t0() + Duration::seconds(5));
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].severity, Severity::Critical);
    }

    #[test]
    fn custom_capacity_and_cooldown() {
        let mut snap = live_snapshot();
        set(&mut snap, EquipmentType::Drum, MetricName::Corrosion, 9.0);
        let store = store_with(th(EquipmentType::Drum, MetricName::Corrosion).upper(2.0));
        let mut engine = AlertEngine::new(AlertSettings {
            cooldown: Duration::seconds(10),
            capacity: 3,
            warning_margin: None,
        });

        for n in 0..5 {
            assert_eq!(
                engine
                    .evaluate(&snap, &store, t0() + Duration::seconds(10 * n))
                    .len(),
                1
            );
        }
        assert_eq!(engine.history().len(), 3);
    }
}
