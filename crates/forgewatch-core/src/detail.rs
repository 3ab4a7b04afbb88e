// ── Machine detail view ──
//
// Derived presentation data for one machine: readings against their
// rated limits, computed features, and the anomaly badge.

use serde::Serialize;

use forgewatch_api::Machine;

/// A sensor reading shown against its rated limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub label: &'static str,
    pub value: f64,
    pub limit: Option<f64>,
    pub unit: &'static str,
}

impl SensorReading {
    /// `true` once the reading reaches its limit.
    pub fn over_limit(&self) -> bool {
        self.limit.is_some_and(|limit| self.value >= limit)
    }

    /// `"298.1 / 305 K"`, or just the value when no limit applies.
    pub fn display(&self) -> String {
        let value = trim_float(self.value);
        let reading = match self.limit {
            Some(limit) => format!("{value} / {}", trim_float(limit)),
            None => value,
        };
        if self.unit.is_empty() {
            reading
        } else {
            format!("{reading} {}", self.unit)
        }
    }
}

pub const AIR_TEMPERATURE_LIMIT: f64 = 305.0;
pub const PROCESS_TEMPERATURE_LIMIT: f64 = 315.0;
pub const TOOL_WEAR_LIMIT: f64 = 300.0;
pub const ROTATIONAL_SPEED_LIMIT: f64 = 3000.0;
pub const TORQUE_LIMIT: f64 = 100.0;

/// Readings in display order, followed by the two computed features.
pub fn readings(machine: &Machine) -> Vec<SensorReading> {
    vec![
        SensorReading {
            label: "Air Temperature",
            value: machine.air_temperature,
            limit: Some(AIR_TEMPERATURE_LIMIT),
            unit: "K",
        },
        SensorReading {
            label: "Process Temperature",
            value: machine.process_temperature,
            limit: Some(PROCESS_TEMPERATURE_LIMIT),
            unit: "K",
        },
        SensorReading {
            label: "Tool Wear",
            value: machine.tool_wear,
            limit: Some(TOOL_WEAR_LIMIT),
            unit: "min",
        },
        SensorReading {
            label: "Rotational Speed",
            value: machine.rotational_speed,
            limit: Some(ROTATIONAL_SPEED_LIMIT),
            unit: "RPM",
        },
        SensorReading {
            label: "Torque",
            value: machine.torque,
            limit: Some(TORQUE_LIMIT),
            unit: "Nm",
        },
        SensorReading {
            label: "Temperature Diff",
            value: round2(machine.temperature_diff()),
            limit: None,
            unit: "K",
        },
        SensorReading {
            label: "Power W",
            value: round2(machine.power_w()),
            limit: None,
            unit: "",
        },
    ]
}

/// `"1 Issue"` / `"3 Issues"`, `None` when nothing is anomalous.
pub fn anomaly_badge(machine: &Machine) -> Option<String> {
    match machine.anomalies().len() {
        0 => None,
        1 => Some("1 Issue".into()),
        n => Some(format!("{n} Issues")),
    }
}

pub fn health_analysis(machine: &Machine) -> &str {
    machine
        .condition
        .as_ref()
        .and_then(|c| c.overall_health.as_deref())
        .unwrap_or("No analysis available")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn trim_float(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        let s = format!("{value:.2}");
        s.trim_end_matches('0').to_owned()
    }
}
