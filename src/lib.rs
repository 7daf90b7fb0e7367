//! # minehealth
//!
//! Health monitoring for mine-hoisting equipment: winding ropes, sheaves
//! and drums.
//!
//! ## Overview
//!
//! `minehealth` keeps a live view of four sensor metrics (temperature,
//! corrosion, diameter reduction, strength) for each component, checks them
//! against user-defined thresholds and raises alerts on breaches. Readings
//! are simulated: there is no sensor ingestion. A separate failure
//! prediction call forwards readings to an external AI service.
//!
//! ## Module Organization
//!
//! - [`equipment`]: Equipment and metric identifiers with static metric config
//! - [`metrics`]: Readings, history and the equipment snapshot
//! - [`simulator`]: Seeded random-walk source of readings
//! - [`thresholds`]: Threshold definitions and the threshold store
//! - [`alerts`]: Breach detection, cooldown and alert history
//! - [`notify`]: Alert notification sinks
//! - [`app`]: The per-session [`Monitor`] state container
//! - [`prediction`]: Failure-prediction service contract and HTTP client
//! - [`config`]: CLI argument parsing
//! - [`ui`]: Plain-text front end

pub mod alerts;
pub mod app;
pub mod config;
pub mod equipment;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod prediction;
pub mod simulator;
pub mod thresholds;
pub mod ui;

pub use alerts::{Alert, AlertEngine, AlertSettings};
pub use app::{CsvLog, Monitor};
pub use equipment::{EquipmentType, MetricConfig, MetricName};
pub use error::{Error, Result};
pub use metrics::{Equipment, HistoricalPoint, MetricReading, Snapshot, SnapshotState};
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use prediction::{
    FailurePredictor, HttpPredictor, PredictionError, PredictionRequest, PredictionResponse,
    RiskLevel,
};
pub use simulator::{HistoryMode, Simulator};
pub use thresholds::{LimitKind, Severity, Threshold, ThresholdError, ThresholdStore};
