//! Failure prediction via an external AI service.
//!
//! The prediction model lives outside this crate. This module defines the
//! request/response contract, validates both sides of it, and provides an
//! HTTP implementation of [`FailurePredictor`]. Calls are made once, with a
//! timeout and no retries.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::equipment::{EquipmentType, MetricName};
use crate::metrics::Equipment;

/// Default request timeout for [`HttpPredictor`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("invalid prediction input: {0}")]
    InvalidInput(String),
    #[error("prediction transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("prediction service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid prediction response: {0}")]
    InvalidResponse(String),
}

/// Sensor readings submitted for a failure estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub component_type: EquipmentType,
    /// Temperature in °C
    pub temperature: f64,
    /// Corrosion level on a 0-10 scale
    pub corrosion: f64,
    /// Diameter reduction in mm
    pub diameter_reduction: f64,
    /// Strength in MPa
    pub strength: f64,
    /// Free-text notes on past maintenance or incidents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_data: Option<String>,
}

/// Accepted input ranges: (field, min, max).
const INPUT_RANGES: [(&str, f64, f64); 4] = [
    ("temperature", -50.0, 200.0),
    ("corrosion", 0.0, 10.0),
    ("diameterReduction", 0.0, 100.0),
    ("strength", 0.0, 10000.0),
];

impl PredictionRequest {
    /// Build a request from the current readings of one piece of equipment.
    ///
    /// Returns `None` if any of the four metrics has no reading.
    pub fn from_equipment(equipment: &Equipment) -> Option<Self> {
        Some(Self {
            component_type: equipment.id,
            temperature: equipment.value(MetricName::Temperature)?,
            corrosion: equipment.value(MetricName::Corrosion)?,
            diameter_reduction: equipment.value(MetricName::DiameterReduction)?,
            strength: equipment.value(MetricName::Strength)?,
            historical_data: None,
        })
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.historical_data = if notes.trim().is_empty() {
            None
        } else {
            Some(notes)
        };
        self
    }

    /// Check every reading is finite and within its accepted range.
    pub fn validate(&self) -> Result<(), PredictionError> {
        let values = [
            self.temperature,
            self.corrosion,
            self.diameter_reduction,
            self.strength,
        ];
        for ((field, min, max), value) in INPUT_RANGES.iter().zip(values) {
            if !value.is_finite() || value < *min || value > *max {
                return Err(PredictionError::InvalidInput(format!(
                    "{field} must be between {min} and {max}, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Failure estimate returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    /// Probability of failure, 0.0 to 1.0
    pub failure_probability: f64,
    pub reasoning: String,
    pub recommendations: String,
}

impl PredictionResponse {
    pub fn validate(&self) -> Result<(), PredictionError> {
        let p = self.failure_probability;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(PredictionError::InvalidResponse(format!(
                "failureProbability must be within [0, 1], got {p}"
            )));
        }
        Ok(())
    }

    pub fn risk(&self) -> RiskLevel {
        RiskLevel::from_probability(self.failure_probability)
    }
}

/// Coarse banding of a failure probability.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Elevated,
    High,
}

impl RiskLevel {
    pub fn from_probability(p: f64) -> Self {
        if p > 0.7 {
            RiskLevel::High
        } else if p > 0.4 {
            RiskLevel::Elevated
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => f.write_str("low"),
            RiskLevel::Elevated => f.write_str("elevated"),
            RiskLevel::High => f.write_str("high"),
        }
    }
}

/// Anything able to turn sensor readings into a failure estimate.
pub trait FailurePredictor {
    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, PredictionError>;
}

/// Validate the request, call the predictor, validate the response.
///
/// Failures are logged and returned; callers keep any earlier result.
pub fn run_prediction<P: FailurePredictor + ?Sized>(
    predictor: &P,
    request: &PredictionRequest,
) -> Result<PredictionResponse, PredictionError> {
    request.validate()?;
    let outcome = predictor
        .predict(request)
        .and_then(|response| response.validate().map(|_| response));
    match &outcome {
        Ok(response) => tracing::info!(
            component = %request.component_type,
            probability = response.failure_probability,
            risk = %response.risk(),
            "failure prediction received"
        ),
        Err(err) => tracing::warn!(
            component = %request.component_type,
            error = %err,
            "failure prediction failed"
        ),
    }
    outcome
}

/// Posts requests as JSON to a prediction endpoint.
pub struct HttpPredictor {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpPredictor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PredictionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl FailurePredictor for HttpPredictor {
    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, PredictionError> {
        let response = self.client.post(&self.endpoint).json(request).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(PredictionError::Status(status));
        }
        response.json::<PredictionResponse>().map_err(|err| {
            if err.is_decode() {
                PredictionError::InvalidResponse(err.to_string())
            } else {
                PredictionError::Transport(err)
            }
        })
    }
}
