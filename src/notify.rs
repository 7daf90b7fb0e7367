//! Alert notification sinks.
//!
//! Every newly raised alert is handed to a [`Notifier`], the transient
//! "toast" channel of whatever hosts the monitor.

use crate::alerts::Alert;
use crate::thresholds::Severity;

/// Receives each alert once, as it is raised.
pub trait Notifier {
    fn notify(&mut self, alert: &Alert);
}

/// Emits alerts as structured log events.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, alert: &Alert) {
        match alert.severity {
            Severity::Critical => tracing::error!(
                alert_id = %alert.id,
                equipment = %alert.equipment_type,
                metric = alert.metric_name.as_str(),
                value = alert.current_value,
                limit = alert.threshold_value,
                "🚨 {}",
                alert.message
            ),
            Severity::Warning => tracing::warn!(
                alert_id = %alert.id,
                equipment = %alert.equipment_type,
                metric = alert.metric_name.as_str(),
                value = alert.current_value,
                limit = alert.threshold_value,
                "{}",
                alert.message
            ),
        }
    }
}

/// Keeps every notified alert in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub received: Vec<Alert>,
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, alert: &Alert) {
        self.received.push(alert.clone());
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&mut self, alert: &Alert) {
        (**self).notify(alert);
    }
}
