//! Equipment and metric identifiers for minehealth.
//!
//! Both sets are closed: three hoisting components, each carrying the same
//! four sensor metrics. The static per-metric configuration (unit, bounds,
//! random-walk step) lives here too.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Hoisting component being monitored.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum EquipmentType {
    /// Steel wire rope wound on the drum
    WindingRope,
    /// Head sheave the rope runs over
    Sheave,
    /// Winder drum
    Drum,
}

impl EquipmentType {
    /// Every equipment type, in display order.
    pub const ALL: [EquipmentType; 3] = [
        EquipmentType::WindingRope,
        EquipmentType::Sheave,
        EquipmentType::Drum,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            EquipmentType::WindingRope => "Winding Rope",
            EquipmentType::Sheave => "Sheave",
            EquipmentType::Drum => "Drum",
        }
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EquipmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(&['-', '_', ' '][..], "").as_str() {
            "windingrope" | "rope" => Ok(EquipmentType::WindingRope),
            "sheave" => Ok(EquipmentType::Sheave),
            "drum" => Ok(EquipmentType::Drum),
            _ => Err(format!("unknown equipment type `{s}`")),
        }
    }
}

/// Sensor metric tracked for every piece of equipment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricName {
    Temperature,
    Corrosion,
    DiameterReduction,
    Strength,
}

impl MetricName {
    /// Every metric, in display order.
    pub const ALL: [MetricName; 4] = [
        MetricName::Temperature,
        MetricName::Corrosion,
        MetricName::DiameterReduction,
        MetricName::Strength,
    ];

    /// Static configuration for this metric.
    pub fn config(self) -> &'static MetricConfig {
        match self {
            MetricName::Temperature => &TEMPERATURE,
            MetricName::Corrosion => &CORROSION,
            MetricName::DiameterReduction => &DIAMETER_REDUCTION,
            MetricName::Strength => &STRENGTH,
        }
    }

    /// Wire name, as used in serialized records and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::Temperature => "temperature",
            MetricName::Corrosion => "corrosion",
            MetricName::DiameterReduction => "diameterReduction",
            MetricName::Strength => "strength",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config().label)
    }
}

impl FromStr for MetricName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(&['-', '_', ' '][..], "").as_str() {
            "temperature" | "temp" => Ok(MetricName::Temperature),
            "corrosion" => Ok(MetricName::Corrosion),
            "diameterreduction" | "diameter" => Ok(MetricName::DiameterReduction),
            "strength" => Ok(MetricName::Strength),
            _ => Err(format!("unknown metric `{s}`")),
        }
    }
}

/// Static description of a metric.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricConfig {
    /// Display label
    pub label: &'static str,
    /// Unit suffix appended to values
    pub unit: &'static str,
    /// Lowest value the simulator may produce
    pub min: f64,
    /// Highest value the simulator may produce
    pub max: f64,
    /// Maximum per-tick perturbation in either direction
    pub step: f64,
}

impl MetricConfig {
    /// Clamp a value into this metric's bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

const TEMPERATURE: MetricConfig = MetricConfig {
    label: "Temperature",
    unit: "°C",
    min: -50.0,
    max: 200.0,
    step: 1.0,
};

const CORROSION: MetricConfig = MetricConfig {
    label: "Corrosion",
    unit: "/10",
    min: 0.0,
    max: 10.0,
    step: 0.1,
};

const DIAMETER_REDUCTION: MetricConfig = MetricConfig {
    label: "Diameter Reduction",
    unit: "mm",
    min: 0.0,
    max: 50.0,
    step: 0.1,
};

const STRENGTH: MetricConfig = MetricConfig {
    label: "Strength",
    unit: "MPa",
    min: 0.0,
    max: 5000.0,
    step: 10.0,
};
