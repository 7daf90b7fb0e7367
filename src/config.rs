//! Command-line configuration for minehealth.
//!
//! This module defines all CLI arguments using `clap` for parsing.
//! The configuration controls the simulation cadence, alert policy,
//! threshold setup, logging sinks and the failure-prediction call.

use std::path::PathBuf;

use chrono::Duration;
use clap::{Args, Parser, Subcommand};

use crate::alerts::{AlertSettings, DEFAULT_CAPACITY, DEFAULT_COOLDOWN_SECS};
use crate::equipment::EquipmentType;
use crate::simulator::HistoryMode;
use crate::thresholds::{Threshold, ThresholdStore};

/// Largest cooldown a chrono `Duration` can hold, in seconds.
pub const MAX_COOLDOWN_SECS: u64 = i64::MAX as u64 / 1000;

/// Mine-hoisting equipment health monitor.
///
/// minehealth simulates sensor readings for winding ropes, sheaves and
/// drums, checks them against configurable thresholds and raises alerts
/// when a limit is breached.
///
/// # Examples
///
/// ```bash
/// # Monitor with the stock thresholds, one tick every 5 seconds
/// minehealth
///
/// # Reproducible run with an extra lower strength limit on the drum
/// minehealth --seed 42 --threshold drum:strength:3200:
///
/// # Ask the prediction service about a rope
/// minehealth predict --endpoint http://localhost:8080/predict \
///     --component winding-rope --temperature 38 --corrosion 4.2
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Monitor mine-hoisting equipment health")]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub monitor: MonitorArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the simulation and alert loop (default)
    Monitor,
    /// Send one set of readings to the failure-prediction service
    Predict(PredictArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MonitorArgs {
    /// Interval in seconds between simulation ticks.
    #[arg(short, long, default_value_t = 5)]
    pub interval: u64,

    /// Seconds during which a repeated alert of the same kind is suppressed.
    #[arg(
        long,
        default_value_t = DEFAULT_COOLDOWN_SECS,
        value_parser = clap::value_parser!(u64).range(..=MAX_COOLDOWN_SECS)
    )]
    pub cooldown: u64,

    /// Number of alerts kept in history.
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub alert_capacity: usize,

    /// Raise warning alerts for values within this fraction of a limit.
    ///
    /// For example 0.1 warns once a value is within 10% of its limit.
    /// Disabled by default: only breaches raise alerts.
    #[arg(long)]
    pub warning_margin: Option<f64>,

    /// How the 12-period metric history evolves: static or rolling.
    #[arg(long, default_value = "static")]
    pub history_mode: HistoryMode,

    /// Seed for the simulated readings (random if omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Extra threshold, as EQUIPMENT:METRIC:[LOWER]:[UPPER]. Repeatable.
    ///
    /// Example: `sheave:temperature::50` sets an upper limit of 50 °C.
    #[arg(short, long = "threshold", value_name = "RULE")]
    pub thresholds: Vec<Threshold>,

    /// Start without the stock demo thresholds.
    #[arg(long)]
    pub no_default_thresholds: bool,

    /// Append every reading to this CSV file.
    #[arg(short = 'c', long)]
    pub csv_file: Option<PathBuf>,

    /// Append every raised alert to this CSV file.
    #[arg(long)]
    pub alert_csv_file: Option<PathBuf>,

    /// Stop after this many ticks (runs until interrupted if omitted).
    #[arg(long)]
    pub ticks: Option<u64>,
}

impl MonitorArgs {
    pub fn alert_settings(&self) -> AlertSettings {
        AlertSettings {
            cooldown: Duration::seconds(self.cooldown.min(MAX_COOLDOWN_SECS) as i64),
            capacity: self.alert_capacity,
            warning_margin: self.warning_margin,
        }
    }

    /// Initial threshold store: stock limits (unless disabled) plus CLI ones.
    pub fn threshold_store(&self) -> ThresholdStore {
        let mut store = if self.no_default_thresholds {
            ThresholdStore::new()
        } else {
            ThresholdStore::with_defaults()
        };
        for threshold in &self.thresholds {
            store.upsert(threshold.clone());
        }
        store
    }
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// URL of the failure-prediction service.
    #[arg(long, env = "MINEHEALTH_PREDICT_URL")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Component the readings belong to.
    #[arg(long)]
    pub component: EquipmentType,

    /// Temperature in °C.
    #[arg(long, default_value_t = 25.0, allow_negative_numbers = true)]
    pub temperature: f64,

    /// Corrosion level (0-10).
    #[arg(long, default_value_t = 1.0)]
    pub corrosion: f64,

    /// Diameter reduction in mm.
    #[arg(long, default_value_t = 0.0)]
    pub diameter_reduction: f64,

    /// Strength in MPa.
    #[arg(long, default_value_t = 3500.0)]
    pub strength: f64,

    /// Free-text notes on maintenance history or past incidents.
    #[arg(long)]
    pub notes: Option<String>,
}
