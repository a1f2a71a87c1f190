//! Scenario definitions — the immutable inputs of one simulation run.
//!
//! Every field is serde-defaulted: a malformed or missing value in a
//! scenario file degrades to the documented baseline constant instead
//! of aborting the run. A session must never crash over bad authoring.

use crate::{
    error::SimResult,
    state::{Field, PatientState},
    trigger::{AlertPriority, Comparison, FieldPatch, LabValue, TriggerAction, TriggerDef, TriggerKind},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Demographics {
    pub age_years: f64,
    pub sex: Sex,
}

impl Default for Demographics {
    fn default() -> Self {
        Self { age_years: 68.0, sex: Sex::Male }
    }
}

/// Per-system natural progression rates. All default to zero — an
/// unspecified system simply does not drift.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NaturalProgression {
    pub cardiac: CardiacProgression,
    pub fluid: FluidProgression,
    pub renal: RenalProgression,
    pub respiratory: RespiratoryProgression,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CardiacProgression {
    pub heart_rate_per_hour: f64,
    pub systolic_per_hour: f64,
    pub diastolic_per_hour: f64,
    pub cardiac_output_per_hour: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FluidProgression {
    pub overload_rate_per_hour: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RenalProgression {
    pub creatinine_per_hour: f64,
    pub bun_per_hour: f64,
    pub potassium_per_hour: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RespiratoryProgression {
    pub respiratory_rate_per_hour: f64,
    pub spo2_per_hour: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    pub label: String,
    pub demographics: Demographics,
    pub initial_state: PatientState,
    pub natural_progression: NaturalProgression,
    pub triggers: Vec<TriggerDef>,
    /// Global multiplier on bounded physiologic noise. Zero yields the
    /// exact-value mode the deterministic tests rely on.
    pub noise_amplitude: f64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            label: "unnamed scenario".to_string(),
            demographics: Demographics::default(),
            initial_state: PatientState::default(),
            natural_progression: NaturalProgression::default(),
            triggers: Vec::new(),
            noise_amplitude: 1.0,
        }
    }
}

impl Scenario {
    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The built-in teaching scenario: acute decompensated heart
    /// failure in an elderly patient, worsening until treated.
    pub fn demo_heart_failure() -> Self {
        let mut initial = PatientState::default();
        initial.vitals.heart_rate = 96.0;
        initial.vitals.systolic = 152.0;
        initial.vitals.diastolic = 88.0;
        initial.vitals.respiratory_rate = 22.0;
        initial.vitals.oxygen_saturation = 91.0;
        initial.vitals.weight = 84.0;
        initial.physiology.fluid_overload = 5.0;
        initial.physiology.cardiac_output = 3.8;
        initial.physiology.gfr = 45.0;
        initial.physiology.urine_output = 30.0;
        initial.labs.creatinine = 1.8;
        initial.labs.bun = 42.0;
        initial.labs.potassium = 4.4;
        initial.labs.sodium = 134.0;
        initial.labs.glucose = 128.0;
        initial.labs.bnp = 1250.0;

        let triggers = vec![
            TriggerDef {
                id: "worsening-dyspnea".to_string(),
                kind: TriggerKind::Time { at_minutes: 30.0 },
                action: TriggerAction::NurseAlert {
                    message: "Patient reports worsening shortness of breath.".to_string(),
                    priority: AlertPriority::High,
                },
            },
            TriggerDef {
                id: "hypoxia-alert".to_string(),
                kind: TriggerKind::State {
                    field: Field::OxygenSaturation,
                    op: Comparison::Lt,
                    value: 88.0,
                },
                action: TriggerAction::NurseAlert {
                    message: "SpO2 has dropped below 88%.".to_string(),
                    priority: AlertPriority::Critical,
                },
            },
            TriggerDef {
                id: "bnp-panel".to_string(),
                kind: TriggerKind::State {
                    field: Field::FluidOverload,
                    op: Comparison::Gt,
                    value: 7.0,
                },
                action: TriggerAction::LabResult {
                    values: vec![LabValue {
                        label: "BNP".to_string(),
                        value: 1850.0,
                        unit: "pg/mL".to_string(),
                    }],
                },
            },
            TriggerDef {
                id: "post-diuretic-bmp".to_string(),
                kind: TriggerKind::Intervention { name: "furosemide".to_string() },
                action: TriggerAction::LabResult {
                    values: vec![LabValue {
                        label: "Potassium".to_string(),
                        value: 3.6,
                        unit: "mmol/L".to_string(),
                    }],
                },
            },
            TriggerDef {
                id: "scripted-hypokalemia".to_string(),
                kind: TriggerKind::Time { at_minutes: 240.0 },
                action: TriggerAction::ModifyState {
                    patch: vec![FieldPatch { field: Field::Potassium, value: 3.2 }],
                },
            },
        ];

        Self {
            label: "acute decompensated heart failure".to_string(),
            demographics: Demographics { age_years: 72.0, sex: Sex::Female },
            initial_state: initial,
            natural_progression: NaturalProgression {
                cardiac: CardiacProgression {
                    heart_rate_per_hour: 0.5,
                    systolic_per_hour: 0.0,
                    diastolic_per_hour: 0.0,
                    cardiac_output_per_hour: -0.05,
                },
                fluid: FluidProgression { overload_rate_per_hour: 0.25 },
                renal: RenalProgression {
                    creatinine_per_hour: 0.02,
                    bun_per_hour: 0.4,
                    potassium_per_hour: 0.0,
                },
                respiratory: RespiratoryProgression::default(),
            },
            triggers,
            noise_amplitude: 1.0,
        }
    }
}
