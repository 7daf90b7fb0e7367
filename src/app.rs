//! Session state for minehealth.
//!
//! This module contains the [`Monitor`] struct which owns the metric
//! snapshot, threshold store and alert history for one session, and
//! coordinates simulation, evaluation, notification and logging.

use std::fs::{File, OpenOptions};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alerts::{Alert, AlertEngine, AlertSettings};
use crate::equipment::{EquipmentType, MetricName};
use crate::error::{Error, Result};
use crate::metrics::Snapshot;
use crate::notify::Notifier;
use crate::simulator::Simulator;
use crate::thresholds::{Threshold, ThresholdStore};

/// One reading as written to the readings log.
#[derive(Serialize)]
struct ReadingRow {
    timestamp: DateTime<Utc>,
    equipment: EquipmentType,
    metric: MetricName,
    value: f64,
}

/// Optional CSV sinks for readings and alerts.
///
/// Files are opened in append mode; the header is only written when the
/// file did not exist yet.
#[derive(Default)]
pub struct CsvLog {
    readings: Option<csv::Writer<File>>,
    alerts: Option<csv::Writer<File>>,
}

impl CsvLog {
    /// Open the given log files. `None` disables that sink.
    pub fn open(readings: Option<&Path>, alerts: Option<&Path>) -> Result<Self> {
        Ok(Self {
            readings: readings.map(open_append).transpose()?,
            alerts: alerts.map(open_append).transpose()?,
        })
    }

    fn log_readings(&mut self, snapshot: &Snapshot) -> Result<()> {
        if let Some(ref mut writer) = self.readings {
            for (equipment, metric, reading) in snapshot.readings() {
                writer.serialize(ReadingRow {
                    timestamp: reading.timestamp,
                    equipment,
                    metric,
                    value: reading.value,
                })?;
            }
            writer.flush()?;
        }
        Ok(())
    }

    fn log_alerts(&mut self, alerts: &[Alert]) -> Result<()> {
        if let Some(ref mut writer) = self.alerts {
            for alert in alerts {
                writer.serialize(alert)?;
            }
            writer.flush()?;
        }
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<csv::Writer<File>> {
    let exists = path.exists();
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|source| Error::OpenLog {
            source,
            path: path.to_path_buf(),
        })?;
    Ok(csv::WriterBuilder::new()
        .has_headers(!exists)
        .from_writer(file))
}

/// State container for one monitoring session.
///
/// Every mutation (start, tick, threshold edits) re-runs alert evaluation
/// before returning, so readers always see alerts consistent with the
/// current snapshot and thresholds.
pub struct Monitor<N: Notifier> {
    snapshot: Snapshot,
    thresholds: ThresholdStore,
    engine: AlertEngine,
    simulator: Simulator,
    notifier: N,
    log: CsvLog,
}

impl<N: Notifier> Monitor<N> {
    /// Create a monitor holding placeholder data.
    ///
    /// No alerts are raised until [`Monitor::start`] has run.
    pub fn new(
        simulator: Simulator,
        thresholds: ThresholdStore,
        settings: AlertSettings,
        notifier: N,
    ) -> Self {
        Self {
            snapshot: Snapshot::default(),
            thresholds,
            engine: AlertEngine::new(settings),
            simulator,
            notifier,
            log: CsvLog::default(),
        }
    }

    pub fn with_log(mut self, log: CsvLog) -> Self {
        self.log = log;
        self
    }

    /// Replace the placeholder data with the first simulated readings.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        self.simulator.initialize(&mut self.snapshot, now);
        tracing::info!(
            history_mode = ?self.simulator.history_mode(),
            thresholds = self.thresholds.len(),
            "simulation started"
        );
        self.evaluate_and_log(now)
    }

    /// Advance the simulation by one step and evaluate.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        if !self.snapshot.is_live() {
            return Ok(Vec::new());
        }
        self.simulator.tick(&mut self.snapshot, now);
        self.evaluate_and_log(now)
    }

    /// Evaluate the fresh readings, then log them. A failing readings log
    /// never skips evaluation; the first error is returned.
    fn evaluate_and_log(&mut self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let alerts = self.evaluate(now);
        let logged = self.log.log_readings(&self.snapshot);
        let alerts = alerts?;
        logged?;
        Ok(alerts)
    }

    /// Validate and store a threshold, then evaluate.
    ///
    /// Returns the id the threshold is stored under, along with any alerts
    /// the change raised.
    pub fn upsert_threshold(
        &mut self,
        threshold: Threshold,
        now: DateTime<Utc>,
    ) -> Result<(String, Vec<Alert>)> {
        threshold.validate()?;
        let equipment = threshold.equipment_type;
        let metric = threshold.metric_name;
        let id = self.thresholds.upsert(threshold);
        tracing::info!(
            threshold_id = %id,
            equipment = %equipment,
            metric = metric.as_str(),
            "threshold saved"
        );
        let alerts = self.evaluate(now)?;
        Ok((id, alerts))
    }

    /// Remove a threshold by id, then evaluate. Unknown ids are ignored.
    pub fn remove_threshold(&mut self, id: &str, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        if self.thresholds.remove(id) {
            tracing::info!(threshold_id = id, "threshold removed");
        }
        self.evaluate(now)
    }

    fn evaluate(&mut self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let raised = self.engine.evaluate(&self.snapshot, &self.thresholds, now);
        for alert in &raised {
            self.notifier.notify(alert);
        }
        self.log.log_alerts(&raised)?;
        Ok(raised)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn thresholds(&self) -> &ThresholdStore {
        &self.thresholds
    }

    /// Retained alerts, most recent first.
    pub fn alerts(&self) -> impl ExactSizeIterator<Item = &Alert> {
        self.engine.history().iter()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::notify::RecordingNotifier;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 9, 30, 0).unwrap()
    }

    fn monitor(thresholds: ThresholdStore) -> Monitor<RecordingNotifier> {
        Monitor::new(
            Simulator::seeded(11),
            thresholds,
            AlertSettings::default(),
            RecordingNotifier::default(),
        )
    }

    /// Lower limit above every strength the simulator can start with.
    fn always_breached() -> Threshold {
        Threshold::new(EquipmentType::Drum, MetricName::Strength).lower(4500.0)
    }

    #[test]
    fn nothing_happens_before_start() {
        let mut m = monitor(ThresholdStore::new());
        assert!(m.tick(t0()).unwrap().is_empty());
        let (_, alerts) = m.upsert_threshold(always_breached(), t0()).unwrap();
        assert!(alerts.is_empty());
        assert!(!m.snapshot().is_live());
        assert_eq!(m.alerts().len(), 0);
    }

    #[test]
    fn start_evaluates_and_notifies() {
        let mut store = ThresholdStore::new();
        store.upsert(always_breached());
        let mut m = monitor(store);

        let raised = m.start(t0()).unwrap();
        assert_eq!(raised.len(), 1);
        assert_eq!(m.notifier().received, raised);
        assert_eq!(m.alerts().next(), raised.first());
    }

    #[test]
    fn threshold_edit_triggers_evaluation() {
        let mut m = monitor(ThresholdStore::new());
        m.start(t0()).unwrap();
        let (id, raised) = m.upsert_threshold(always_breached(), t0()).unwrap();
        assert_eq!(raised.len(), 1);
        assert!(m.thresholds().get(&id).is_some());

        assert!(m.remove_threshold(&id, t0()).unwrap().is_empty());
        assert!(m.thresholds().is_empty());
        // history survives threshold removal
        assert_eq!(m.alerts().len(), 1);
    }

    #[test]
    fn limitless_threshold_is_rejected() {
        let mut m = monitor(ThresholdStore::new());
        let err = m
            .upsert_threshold(Threshold::new(EquipmentType::Drum, MetricName::Strength), t0())
            .unwrap_err();
        assert!(matches!(err, Error::Threshold(_)));
        assert!(m.thresholds().is_empty());
    }

    #[test]
    fn ticks_respect_cooldown() {
        let mut store = ThresholdStore::new();
        store.upsert(always_breached());
        let mut m = monitor(store);
        m.start(t0()).unwrap();

        // 11 ticks at 5s stay inside the 60s window
        for n in 1..=11 {
            assert!(m.tick(t0() + Duration::seconds(5 * n)).unwrap().is_empty());
        }
        assert_eq!(m.tick(t0() + Duration::seconds(60)).unwrap().len(), 1);
        assert_eq!(m.notifier().received.len(), 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_readings_log_still_evaluates() {
        let mut store = ThresholdStore::new();
        store.upsert(always_breached());
        let log = CsvLog::open(Some(Path::new("/dev/full")), None).unwrap();
        let mut m = monitor(store).with_log(log);

        assert!(matches!(m.start(t0()), Err(Error::Io(_)) | Err(Error::Csv(_))));
        assert!(m.snapshot().is_live());
        assert_eq!(m.alerts().len(), 1);
        assert_eq!(m.notifier().received.len(), 1);

        assert!(m.tick(t0() + Duration::seconds(61)).is_err());
        assert_eq!(m.alerts().len(), 2);
    }

    #[test]
    fn csv_log_appends_readings_and_alerts() {
        let dir = tempfile::TempDir::new().unwrap();
        let readings = dir.path().join("readings.csv");
        let alerts = dir.path().join("alerts.csv");

        let mut store = ThresholdStore::new();
        store.upsert(always_breached());
        let log = CsvLog::open(Some(&readings), Some(&alerts)).unwrap();
        let mut m = monitor(store).with_log(log);
        m.start(t0()).unwrap();
        m.tick(t0() + Duration::seconds(5)).unwrap();

        let mut reader = csv::Reader::from_path(&readings).unwrap();
        assert_eq!(reader.records().count(), 24);
        let headers = csv::Reader::from_path(&readings).unwrap().headers().unwrap().clone();
        assert_eq!(&headers[1], "equipment");

        let mut reader = csv::Reader::from_path(&alerts).unwrap();
        let rows: Vec<_> = reader.records().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "Drum");
        assert_eq!(&rows[0][2], "strength");
        assert_eq!(&rows[0][5], "lower");
    }
}
