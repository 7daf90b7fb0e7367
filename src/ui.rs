//! Plain-text front end for minehealth.
//!
//! Drives the simulation timer for a [`Monitor`] and prints one status
//! line per tick. Alert notifications go through the monitor's notifier.
//!
//! # Controls
//!
//! - `Ctrl+C` / `SIGTERM`: stop after the current tick

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::app::Monitor;
use crate::equipment::MetricName;
use crate::error::Result;
use crate::metrics::Snapshot;
use crate::notify::Notifier;
use crate::prediction::{PredictionRequest, PredictionResponse};

/// How often the loop checks for shutdown between ticks.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the monitor until `running` is cleared or `max_ticks` is reached.
///
/// # Arguments
///
/// * `monitor` - Session state, not yet started
/// * `running` - Atomic flag to signal shutdown
/// * `interval` - Time between simulation ticks
/// * `max_ticks` - Stop after this many ticks, if set
pub fn run_headless<N: Notifier>(
    monitor: &mut Monitor<N>,
    running: &Arc<AtomicBool>,
    interval: Duration,
    max_ticks: Option<u64>,
) -> Result<()> {
    println!("minehealth - Hoisting Equipment Health Monitor");
    println!("===============================================");
    println!("Interval: {} seconds", interval.as_secs());
    println!("Thresholds: {}", monitor.thresholds().len());
    println!("Press Ctrl+C to stop.\n");

    monitor.start(Utc::now())?;
    println!("{}", status_line(monitor.snapshot(), monitor.alerts().len()));

    let mut ticks = 0u64;
    let mut last_tick = Instant::now();
    while running.load(Ordering::Relaxed) {
        if max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }

        if last_tick.elapsed() >= interval {
            monitor.tick(Utc::now())?;
            ticks += 1;
            last_tick = Instant::now();
            println!("{}", status_line(monitor.snapshot(), monitor.alerts().len()));
        } else {
            std::thread::sleep(POLL_INTERVAL.min(interval));
        }
    }

    println!("\nStopped after {} ticks, {} alerts retained.", ticks, monitor.alerts().len());
    for alert in monitor.alerts() {
        println!(
            "  [{}] {:<8} {}",
            alert.timestamp.format("%H:%M:%S"),
            alert.severity,
            alert.message
        );
    }
    Ok(())
}

/// One-line summary of the current readings.
pub fn status_line(snapshot: &Snapshot, alert_count: usize) -> String {
    let time = snapshot
        .readings()
        .map(|(_, _, r)| r.timestamp)
        .max()
        .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| "-".to_string());

    let equipment = snapshot
        .equipment
        .iter()
        .map(|eq| {
            let field = |m: MetricName| {
                eq.value(m)
                    .map(|v| format!("{v:.1}{}", m.config().unit))
                    .unwrap_or_else(|| "n/a".to_string())
            };
            format!(
                "{}: T {} C {} D {} S {}",
                eq.name,
                field(MetricName::Temperature),
                field(MetricName::Corrosion),
                field(MetricName::DiameterReduction),
                field(MetricName::Strength),
            )
        })
        .collect::<Vec<_>>()
        .join(" | ");

    format!("[{time}] {equipment} | Alerts: {alert_count}")
}

/// Human-readable rendering of a prediction result.
pub fn format_prediction(request: &PredictionRequest, response: &PredictionResponse) -> String {
    format!(
        "Component:   {}\nProbability: {:.1}% ({} risk)\nReasoning:   {}\nRecommended: {}",
        request.component_type,
        response.failure_probability * 100.0,
        response.risk(),
        response.reasoning,
        response.recommendations
    )
}
