//! The canonical patient state tree and its clamped field registry.
//!
//! RULE: every numeric write goes through `Field::set` (or
//! `Field::set_within` when an effect profile overrides the bounds).
//! No field ever leaves its clamp range — downstream abnormal-value
//! highlighting depends on these exact bounds.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Vitals {
    pub heart_rate: f64,
    pub systolic: f64,
    pub diastolic: f64,
    pub respiratory_rate: f64,
    pub temperature: f64,
    pub oxygen_saturation: f64,
    pub weight: f64,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            heart_rate: 80.0,
            systolic: 120.0,
            diastolic: 75.0,
            respiratory_rate: 16.0,
            temperature: 36.8,
            oxygen_saturation: 97.0,
            weight: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Physiology {
    pub fluid_overload: f64,
    pub cardiac_output: f64,
    pub gfr: f64,
    pub urine_output: f64,
    /// Derived once at scenario load (initial weight minus initial
    /// overload) and held constant thereafter.
    pub dry_weight: f64,
    pub baseline_heart_rate: f64,
    pub baseline_systolic: f64,
    pub baseline_diastolic: f64,
    pub baseline_respiratory_rate: f64,
    pub baseline_oxygen_saturation: f64,
}

impl Default for Physiology {
    fn default() -> Self {
        Self {
            fluid_overload: 0.0,
            cardiac_output: 5.0,
            gfr: 90.0,
            urine_output: 50.0,
            dry_weight: 80.0,
            baseline_heart_rate: 80.0,
            baseline_systolic: 120.0,
            baseline_diastolic: 75.0,
            baseline_respiratory_rate: 16.0,
            baseline_oxygen_saturation: 97.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Labs {
    pub creatinine: f64,
    pub bun: f64,
    pub potassium: f64,
    pub sodium: f64,
    pub glucose: f64,
    pub bnp: f64,
}

impl Default for Labs {
    fn default() -> Self {
        Self {
            creatinine: 1.0,
            bun: 18.0,
            potassium: 4.2,
            sodium: 138.0,
            glucose: 110.0,
            bnp: 80.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Symptoms {
    /// 0–10 severity.
    pub dyspnea: f64,
    /// 0–10 severity.
    pub fatigue: f64,
    /// 0–4 pitting edema grade.
    pub edema_grade: u8,
    pub orthopnea: bool,
    pub pillow_count: u8,
}

/// Fixed description table for edema grades. The chat collaborators
/// quote these verbatim, so the wording is part of the contract.
pub fn edema_description(grade: u8) -> &'static str {
    match grade {
        0 => "no peripheral edema",
        1 => "trace pitting edema at the ankles",
        2 => "mild pitting edema to the mid-calf",
        3 => "moderate pitting edema to the knee",
        _ => "severe pitting edema extending to the thigh",
    }
}

/// Coarse clinical direction, derived from fluid and renal status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Improving,
    Stable,
    Worsening,
}

impl Trajectory {
    /// First matching rule wins; ties and boundaries fall through.
    pub fn classify(fluid_overload: f64, creatinine: f64) -> Self {
        if fluid_overload < 2.0 && creatinine < 2.2 {
            Self::Improving
        } else if fluid_overload > 4.0 || creatinine > 3.0 {
            Self::Worsening
        } else {
            Self::Stable
        }
    }
}

impl Default for Trajectory {
    fn default() -> Self {
        Self::Stable
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientState {
    pub vitals: Vitals,
    pub physiology: Physiology,
    pub labs: Labs,
    pub symptoms: Symptoms,
    pub trajectory: Trajectory,
    pub timestamp: NaiveDateTime,
}

impl Default for PatientState {
    fn default() -> Self {
        Self {
            vitals: Vitals::default(),
            physiology: Physiology::default(),
            labs: Labs::default(),
            symptoms: Symptoms::default(),
            trajectory: Trajectory::Stable,
            timestamp: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH.naive_utc(),
        }
    }
}

/// Whether a field carries its value forward tick to tick or is
/// rewritten from a formula every tick. Intervention effects need the
/// distinction: contributions to recomputed fields are re-added in
/// full each tick, contributions to accumulated fields are applied as
/// incremental strength deltas so they total exactly `change` at peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Accumulated,
    Recomputed,
}

/// The closed registry of addressable state fields.
///
/// Serialized as the camelCase dotted path (`"vitals.heartRate"`), so
/// scenario JSON keeps path-addressed ergonomics without stringly
/// typed traversal at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "vitals.heartRate")]
    HeartRate,
    #[serde(rename = "vitals.systolic")]
    Systolic,
    #[serde(rename = "vitals.diastolic")]
    Diastolic,
    #[serde(rename = "vitals.respiratoryRate")]
    RespiratoryRate,
    #[serde(rename = "vitals.temperature")]
    Temperature,
    #[serde(rename = "vitals.oxygenSaturation")]
    OxygenSaturation,
    #[serde(rename = "vitals.weight")]
    Weight,
    #[serde(rename = "physiology.fluidOverload")]
    FluidOverload,
    #[serde(rename = "physiology.cardiacOutput")]
    CardiacOutput,
    #[serde(rename = "physiology.gfr")]
    Gfr,
    #[serde(rename = "physiology.urineOutput")]
    UrineOutput,
    #[serde(rename = "labs.creatinine")]
    Creatinine,
    #[serde(rename = "labs.bun")]
    Bun,
    #[serde(rename = "labs.potassium")]
    Potassium,
    #[serde(rename = "labs.sodium")]
    Sodium,
    #[serde(rename = "labs.glucose")]
    Glucose,
    #[serde(rename = "labs.bnp")]
    Bnp,
    #[serde(rename = "symptoms.dyspnea")]
    Dyspnea,
    #[serde(rename = "symptoms.fatigue")]
    Fatigue,
}

impl Field {
    pub const ALL: [Field; 19] = [
        Field::HeartRate,
        Field::Systolic,
        Field::Diastolic,
        Field::RespiratoryRate,
        Field::Temperature,
        Field::OxygenSaturation,
        Field::Weight,
        Field::FluidOverload,
        Field::CardiacOutput,
        Field::Gfr,
        Field::UrineOutput,
        Field::Creatinine,
        Field::Bun,
        Field::Potassium,
        Field::Sodium,
        Field::Glucose,
        Field::Bnp,
        Field::Dyspnea,
        Field::Fatigue,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::HeartRate => "vitals.heartRate",
            Self::Systolic => "vitals.systolic",
            Self::Diastolic => "vitals.diastolic",
            Self::RespiratoryRate => "vitals.respiratoryRate",
            Self::Temperature => "vitals.temperature",
            Self::OxygenSaturation => "vitals.oxygenSaturation",
            Self::Weight => "vitals.weight",
            Self::FluidOverload => "physiology.fluidOverload",
            Self::CardiacOutput => "physiology.cardiacOutput",
            Self::Gfr => "physiology.gfr",
            Self::UrineOutput => "physiology.urineOutput",
            Self::Creatinine => "labs.creatinine",
            Self::Bun => "labs.bun",
            Self::Potassium => "labs.potassium",
            Self::Sodium => "labs.sodium",
            Self::Glucose => "labs.glucose",
            Self::Bnp => "labs.bnp",
            Self::Dyspnea => "symptoms.dyspnea",
            Self::Fatigue => "symptoms.fatigue",
        }
    }

    /// Hard physiologic clamp range, enforced on every write.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Self::HeartRate => (30.0, 180.0),
            Self::Systolic => (60.0, 230.0),
            Self::Diastolic => (30.0, 140.0),
            Self::RespiratoryRate => (6.0, 50.0),
            Self::Temperature => (34.0, 42.0),
            Self::OxygenSaturation => (70.0, 100.0),
            Self::Weight => (30.0, 250.0),
            Self::FluidOverload => (0.0, 10.0),
            Self::CardiacOutput => (1.5, 6.0),
            Self::Gfr => (5.0, 120.0),
            Self::UrineOutput => (5.0, 200.0),
            Self::Creatinine => (0.6, 8.0),
            Self::Bun => (10.0, 150.0),
            Self::Potassium => (3.0, 6.5),
            Self::Sodium => (120.0, 155.0),
            Self::Glucose => (40.0, 600.0),
            Self::Bnp => (10.0, 5000.0),
            Self::Dyspnea => (0.0, 10.0),
            Self::Fatigue => (0.0, 10.0),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Temperature
            | Self::FluidOverload
            | Self::CardiacOutput
            | Self::Creatinine
            | Self::Bun
            | Self::Potassium
            | Self::Sodium
            | Self::Glucose
            | Self::Bnp => FieldKind::Accumulated,
            Self::HeartRate
            | Self::Systolic
            | Self::Diastolic
            | Self::RespiratoryRate
            | Self::OxygenSaturation
            | Self::Weight
            | Self::Gfr
            | Self::UrineOutput
            | Self::Dyspnea
            | Self::Fatigue => FieldKind::Recomputed,
        }
    }

    pub fn get(&self, state: &PatientState) -> f64 {
        match self {
            Self::HeartRate => state.vitals.heart_rate,
            Self::Systolic => state.vitals.systolic,
            Self::Diastolic => state.vitals.diastolic,
            Self::RespiratoryRate => state.vitals.respiratory_rate,
            Self::Temperature => state.vitals.temperature,
            Self::OxygenSaturation => state.vitals.oxygen_saturation,
            Self::Weight => state.vitals.weight,
            Self::FluidOverload => state.physiology.fluid_overload,
            Self::CardiacOutput => state.physiology.cardiac_output,
            Self::Gfr => state.physiology.gfr,
            Self::UrineOutput => state.physiology.urine_output,
            Self::Creatinine => state.labs.creatinine,
            Self::Bun => state.labs.bun,
            Self::Potassium => state.labs.potassium,
            Self::Sodium => state.labs.sodium,
            Self::Glucose => state.labs.glucose,
            Self::Bnp => state.labs.bnp,
            Self::Dyspnea => state.symptoms.dyspnea,
            Self::Fatigue => state.symptoms.fatigue,
        }
    }

    /// Clamped write against the field's own physiologic bounds.
    pub fn set(&self, state: &mut PatientState, value: f64) {
        let (lo, hi) = self.bounds();
        self.set_within(state, value, lo, hi);
    }

    /// Clamped write against caller-supplied bounds (effect profiles
    /// may widen or narrow the physiologic range for their target).
    /// Non-finite values are discarded — a malformed computation must
    /// never poison the state tree.
    pub fn set_within(&self, state: &mut PatientState, value: f64, lo: f64, hi: f64) {
        if !value.is_finite() {
            log::warn!("discarding non-finite write to {}", self.path());
            return;
        }
        *self.slot_mut(state) = value.clamp(lo, hi);
    }

    fn slot_mut<'a>(&self, state: &'a mut PatientState) -> &'a mut f64 {
        match self {
            Self::HeartRate => &mut state.vitals.heart_rate,
            Self::Systolic => &mut state.vitals.systolic,
            Self::Diastolic => &mut state.vitals.diastolic,
            Self::RespiratoryRate => &mut state.vitals.respiratory_rate,
            Self::Temperature => &mut state.vitals.temperature,
            Self::OxygenSaturation => &mut state.vitals.oxygen_saturation,
            Self::Weight => &mut state.vitals.weight,
            Self::FluidOverload => &mut state.physiology.fluid_overload,
            Self::CardiacOutput => &mut state.physiology.cardiac_output,
            Self::Gfr => &mut state.physiology.gfr,
            Self::UrineOutput => &mut state.physiology.urine_output,
            Self::Creatinine => &mut state.labs.creatinine,
            Self::Bun => &mut state.labs.bun,
            Self::Potassium => &mut state.labs.potassium,
            Self::Sodium => &mut state.labs.sodium,
            Self::Glucose => &mut state.labs.glucose,
            Self::Bnp => &mut state.labs.bnp,
            Self::Dyspnea => &mut state.symptoms.dyspnea,
            Self::Fatigue => &mut state.symptoms.fatigue,
        }
    }
}
