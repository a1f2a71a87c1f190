//! Display-ready projections of PatientState for the flowsheet and
//! chat collaborators.

use crate::state::{edema_description, PatientState};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Rounded vitals subset for the flowsheet, with the combined
/// blood-pressure string the UI renders verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalsView {
    pub heart_rate: i64,
    pub blood_pressure: String,
    pub respiratory_rate: i64,
    pub temperature: f64,
    pub oxygen_saturation: i64,
    pub weight: f64,
    pub sim_time: NaiveDateTime,
}

impl VitalsView {
    pub fn from_state(state: &PatientState) -> Self {
        let v = &state.vitals;
        Self {
            heart_rate: v.heart_rate.round() as i64,
            blood_pressure: format!("{}/{}", v.systolic.round() as i64, v.diastolic.round() as i64),
            respiratory_rate: v.respiratory_rate.round() as i64,
            temperature: round1(v.temperature),
            oxygen_saturation: v.oxygen_saturation.round() as i64,
            weight: round1(v.weight),
            sim_time: state.timestamp,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Natural-language symptom summary. The chat-simulation collaborators
/// feed this to dialogue generation, so it reads as bedside prose.
pub fn symptoms_description(state: &PatientState) -> String {
    let s = &state.symptoms;
    let mut parts: Vec<String> = Vec::new();

    parts.push(
        match s.dyspnea {
            d if d < 2.0 => "is breathing comfortably at rest".to_string(),
            d if d < 5.0 => "reports mild shortness of breath on exertion".to_string(),
            d if d < 8.0 => "is short of breath with minimal activity".to_string(),
            _ => "is severely short of breath even at rest".to_string(),
        },
    );

    if s.orthopnea {
        parts.push(format!(
            "cannot lie flat and sleeps propped on {} pillow{}",
            s.pillow_count,
            if s.pillow_count == 1 { "" } else { "s" }
        ));
    }

    if s.fatigue >= 6.0 {
        parts.push("reports profound fatigue".to_string());
    } else if s.fatigue >= 3.0 {
        parts.push("feels more tired than usual".to_string());
    }

    parts.push(format!("has {}", edema_description(s.edema_grade)));

    format!("The patient {}.", parts.join(", "))
}
