use anyhow::Result;
use mercury236_lib::protocol::{PhaseValues, PhaseValuesWithSum};
use mercury236_lib::readings::Readings;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Measurement {
    Phases(PhaseValues),
    PhasesWithSum(PhaseValuesWithSum),
    Scalar(f32),
}

/// One report line: JSON key, text label and value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub key: &'static str,
    pub label: &'static str,
    pub measurement: Measurement,
}

impl Line {
    pub fn new(key: &'static str, label: &'static str, measurement: Measurement) -> Self {
        Self {
            key,
            label,
            measurement,
        }
    }

    fn to_text(self) -> String {
        let values = match self.measurement {
            Measurement::Phases(v) => format!("{:8.2} {:8.2} {:8.2}", v.p1, v.p2, v.p3),
            Measurement::PhasesWithSum(v) => {
                format!("{:8.2} {:8.2} {:8.2} ({:8.2})", v.p1, v.p2, v.p3, v.sum)
            }
            Measurement::Scalar(v) => format!("{:8.2}", v),
        };
        format!("{:<9}{}", self.label, values)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    All(Readings),
    Single(Line),
}

impl Report {
    fn lines(&self) -> Vec<Line> {
        match self {
            Report::All(r) => vec![
                Line::new("voltage", "U (V):", Measurement::Phases(r.voltage)),
                Line::new("current", "I (A):", Measurement::Phases(r.current)),
                Line::new(
                    "power_factor",
                    "Cos(f):",
                    Measurement::PhasesWithSum(r.power_factor),
                ),
                Line::new("frequency", "F (Hz):", Measurement::Scalar(r.frequency)),
                Line::new("phase_angle", "A (deg):", Measurement::Phases(r.phase_angle)),
                Line::new(
                    "active_power",
                    "P (W):",
                    Measurement::PhasesWithSum(r.active_power),
                ),
                Line::new(
                    "reactive_power",
                    "S (VA):",
                    Measurement::PhasesWithSum(r.reactive_power),
                ),
                Line::new(
                    "energy_since_reset",
                    "PR (KW):",
                    Measurement::PhasesWithSum(r.energy_since_reset),
                ),
                Line::new(
                    "energy_yesterday",
                    "PY (KW):",
                    Measurement::PhasesWithSum(r.energy_yesterday),
                ),
                Line::new(
                    "energy_today",
                    "PT (KW):",
                    Measurement::PhasesWithSum(r.energy_today),
                ),
            ],
            Report::Single(line) => vec![*line],
        }
    }

    pub fn to_text(&self) -> String {
        self.lines()
            .into_iter()
            .map(|line| line.to_text() + "\n")
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        let mut document = serde_json::Map::new();
        document.insert(
            "timestamp".to_string(),
            json!(chrono::Utc::now().to_rfc3339()),
        );
        match self {
            Report::All(readings) => {
                document.insert("readings".to_string(), serde_json::to_value(readings)?);
            }
            Report::Single(line) => {
                document.insert(line.key.to_string(), serde_json::to_value(line.measurement)?);
            }
        }
        Ok(serde_json::to_string_pretty(&document)?)
    }
}
