//! The physiology model — pure update functions mapping the current
//! state, the tick's simulated delta, and the scenario's progression
//! rates onto new vitals, labs, and symptoms.
//!
//! SYSTEM ORDER (fixed, documented, never reordered — later systems
//! read earlier outputs):
//!   1. Cardiovascular   2. Fluid balance   3. Renal
//!   4. Respiratory      5. Symptom derivation   6. Trajectory
//!
//! Recomputed fields are `baseline + volume term + progression × hours
//! since start + noise`; accumulated fields integrate `rate × hours
//! this tick`. Every write passes through the clamped field setters.

use crate::{
    rng::{NoiseStreams, SystemRng},
    scenario::{Demographics, NaturalProgression, Scenario, Sex},
    state::{Field, PatientState, Trajectory},
    types::Minutes,
};

// Fluid balance.
const URINE_BASELINE_ML_HR: f64 = 50.0;
const RENAL_REFERENCE_GFR: f64 = 60.0;
const MILD_OVERLOAD_MIN: f64 = 2.0;
const MILD_OVERLOAD_MAX: f64 = 5.0;
const MILD_OVERLOAD_BOOST: f64 = 1.15;

// Cardiovascular volume/tone response.
const OVERLOAD_CARDIO_THRESHOLD: f64 = 2.0;
const HR_PER_OVERLOAD_POINT: f64 = 8.0;
const SYS_PER_OVERLOAD_POINT: f64 = 4.0;
const DIA_PER_OVERLOAD_POINT: f64 = 2.0;
const SYMPATHETIC_CO_THRESHOLD: f64 = 4.5;
const SYMPATHETIC_GAIN: f64 = 6.0;

// Renal coupling.
const K_RENAL_GAIN_PER_HOUR: f64 = 0.02;
const NA_DILUTION_PER_POINT_PER_HOUR: f64 = 0.05;
const BNP_BASE: f64 = 100.0;
const BNP_PER_OVERLOAD_POINT: f64 = 400.0;
const BNP_APPROACH_PER_HOUR: f64 = 0.5;

// Respiratory response.
const RR_OVERLOAD_THRESHOLD: f64 = 1.0;
const RR_PER_OVERLOAD_POINT: f64 = 1.2;
const HYPOXIA_THRESHOLD_SPO2: f64 = 92.0;
const RR_PER_HYPOXIA_POINT: f64 = 0.8;
const SPO2_OVERLOAD_THRESHOLD: f64 = 2.0;
const SPO2_PER_OVERLOAD_POINT: f64 = 1.5;

// Bounded noise deviations, scaled by the scenario's amplitude.
const HR_NOISE: f64 = 2.0;
const SYS_NOISE: f64 = 2.0;
const DIA_NOISE: f64 = 1.0;
const K_NOISE: f64 = 0.02;
const SPO2_NOISE: f64 = 0.5;
const RR_NOISE: f64 = 0.5;

/// Pure per-tick state update. Holds only immutable run parameters;
/// randomness is passed in so it can be zeroed or reseeded by callers.
pub struct PhysiologyModel {
    progression: NaturalProgression,
    demographics: Demographics,
    noise_amplitude: f64,
}

impl PhysiologyModel {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            progression: scenario.natural_progression.clone(),
            demographics: scenario.demographics.clone(),
            noise_amplitude: scenario.noise_amplitude,
        }
    }

    /// Advance the state by `delta_minutes`, with `elapsed_minutes` of
    /// total simulated time on the clock after this tick.
    pub fn update(
        &self,
        state: &mut PatientState,
        delta_minutes: Minutes,
        elapsed_minutes: Minutes,
        noise: &mut NoiseStreams,
    ) {
        let dt_hours = delta_minutes / 60.0;
        let t_hours = elapsed_minutes / 60.0;

        self.update_cardiovascular(state, dt_hours, t_hours, &mut noise.cardiovascular);
        self.update_fluid(state, dt_hours);
        self.update_renal(state, dt_hours, &mut noise.renal);
        self.update_respiratory(state, t_hours, &mut noise.respiratory);
        derive_symptoms(state);
        state.trajectory =
            Trajectory::classify(state.physiology.fluid_overload, state.labs.creatinine);
    }

    fn noise(&self, rng: &mut SystemRng, max_dev: f64) -> f64 {
        // Always draw, even at zero amplitude, so streams stay aligned.
        rng.noise(max_dev) * self.noise_amplitude
    }

    fn update_cardiovascular(
        &self,
        state: &mut PatientState,
        dt_hours: f64,
        t_hours: f64,
        rng: &mut SystemRng,
    ) {
        let overload_excess =
            (state.physiology.fluid_overload - OVERLOAD_CARDIO_THRESHOLD).max(0.0);
        let sympathetic =
            (SYMPATHETIC_CO_THRESHOLD - state.physiology.cardiac_output).max(0.0) * SYMPATHETIC_GAIN;
        let prog = &self.progression.cardiac;

        let heart_rate = state.physiology.baseline_heart_rate
            + overload_excess * HR_PER_OVERLOAD_POINT
            + sympathetic
            + prog.heart_rate_per_hour * t_hours
            + self.noise(rng, HR_NOISE);
        let systolic = state.physiology.baseline_systolic
            + overload_excess * SYS_PER_OVERLOAD_POINT
            + prog.systolic_per_hour * t_hours
            + self.noise(rng, SYS_NOISE);
        let diastolic = state.physiology.baseline_diastolic
            + overload_excess * DIA_PER_OVERLOAD_POINT
            + prog.diastolic_per_hour * t_hours
            + self.noise(rng, DIA_NOISE);
        let cardiac_output =
            state.physiology.cardiac_output + prog.cardiac_output_per_hour * dt_hours;

        Field::HeartRate.set(state, heart_rate);
        Field::Systolic.set(state, systolic);
        Field::Diastolic.set(state, diastolic);
        Field::CardiacOutput.set(state, cardiac_output);
    }

    fn update_fluid(&self, state: &mut PatientState, dt_hours: f64) {
        let overload = state.physiology.fluid_overload
            + self.progression.fluid.overload_rate_per_hour * dt_hours;
        Field::FluidOverload.set(state, overload);

        // Read back post-clamp; displayed weight is dry weight plus
        // whatever overload actually persisted.
        let overload = state.physiology.fluid_overload;
        Field::Weight.set(state, state.physiology.dry_weight + overload);

        // Urine output reads the prior tick's renal function (renal
        // runs after fluid in the system order).
        let renal_factor = state.physiology.gfr / RENAL_REFERENCE_GFR;
        let boost = if overload > MILD_OVERLOAD_MIN && overload <= MILD_OVERLOAD_MAX {
            MILD_OVERLOAD_BOOST
        } else {
            1.0
        };
        Field::UrineOutput.set(state, URINE_BASELINE_ML_HR * renal_factor * boost);
    }

    fn update_renal(&self, state: &mut PatientState, dt_hours: f64, rng: &mut SystemRng) {
        let prog = &self.progression.renal;

        let creatinine = state.labs.creatinine + prog.creatinine_per_hour * dt_hours;
        Field::Creatinine.set(state, creatinine);
        let bun = state.labs.bun + prog.bun_per_hour * dt_hours;
        Field::Bun.set(state, bun);

        let gfr = estimated_gfr(state.labs.creatinine, &self.demographics);
        Field::Gfr.set(state, gfr);

        // Potassium climbs as clearance falls.
        let gfr = state.physiology.gfr;
        let renal_term =
            ((RENAL_REFERENCE_GFR - gfr).max(0.0) / RENAL_REFERENCE_GFR) * K_RENAL_GAIN_PER_HOUR;
        let potassium = state.labs.potassium
            + (renal_term + prog.potassium_per_hour) * dt_hours
            + self.noise(rng, K_NOISE);
        Field::Potassium.set(state, potassium);

        // Volume-coupled labs: dilutional sodium, BNP tracking overload.
        let overload_excess =
            (state.physiology.fluid_overload - OVERLOAD_CARDIO_THRESHOLD).max(0.0);
        let sodium =
            state.labs.sodium - NA_DILUTION_PER_POINT_PER_HOUR * overload_excess * dt_hours;
        Field::Sodium.set(state, sodium);

        let bnp_target = BNP_BASE + BNP_PER_OVERLOAD_POINT * state.physiology.fluid_overload;
        let approach = (BNP_APPROACH_PER_HOUR * dt_hours).min(1.0);
        let bnp = state.labs.bnp + (bnp_target - state.labs.bnp) * approach;
        Field::Bnp.set(state, bnp);
    }

    fn update_respiratory(&self, state: &mut PatientState, t_hours: f64, rng: &mut SystemRng) {
        let prog = &self.progression.respiratory;
        let overload = state.physiology.fluid_overload;

        let spo2 = state.physiology.baseline_oxygen_saturation
            - (overload - SPO2_OVERLOAD_THRESHOLD).max(0.0) * SPO2_PER_OVERLOAD_POINT
            + prog.spo2_per_hour * t_hours
            + self.noise(rng, SPO2_NOISE);
        Field::OxygenSaturation.set(state, spo2);

        let hypoxia = (HYPOXIA_THRESHOLD_SPO2 - state.vitals.oxygen_saturation).max(0.0);
        let respiratory_rate = state.physiology.baseline_respiratory_rate
            + (overload - RR_OVERLOAD_THRESHOLD).max(0.0) * RR_PER_OVERLOAD_POINT
            + hypoxia * RR_PER_HYPOXIA_POINT
            + prog.respiratory_rate_per_hour * t_hours
            + self.noise(rng, RR_NOISE);
        Field::RespiratoryRate.set(state, respiratory_rate);

        // Temperature is initialized once and held unless a trigger
        // perturbs it.
    }
}

/// Fix the load-time derived parameters, called exactly once per
/// scenario load. Baselines back out the current volume and tone
/// contributions so the authored initial vitals are the model's
/// tick-zero fixed point; dry weight is initial weight minus initial
/// overload and held constant thereafter.
pub fn derive_baselines(state: &mut PatientState) {
    let overload = state.physiology.fluid_overload;
    let overload_excess = (overload - OVERLOAD_CARDIO_THRESHOLD).max(0.0);
    let sympathetic =
        (SYMPATHETIC_CO_THRESHOLD - state.physiology.cardiac_output).max(0.0) * SYMPATHETIC_GAIN;
    let hypoxia = (HYPOXIA_THRESHOLD_SPO2 - state.vitals.oxygen_saturation).max(0.0);

    let p = &mut state.physiology;
    p.baseline_heart_rate =
        state.vitals.heart_rate - overload_excess * HR_PER_OVERLOAD_POINT - sympathetic;
    p.baseline_systolic = state.vitals.systolic - overload_excess * SYS_PER_OVERLOAD_POINT;
    p.baseline_diastolic = state.vitals.diastolic - overload_excess * DIA_PER_OVERLOAD_POINT;
    p.baseline_oxygen_saturation = state.vitals.oxygen_saturation
        + (overload - SPO2_OVERLOAD_THRESHOLD).max(0.0) * SPO2_PER_OVERLOAD_POINT;
    p.baseline_respiratory_rate = state.vitals.respiratory_rate
        - (overload - RR_OVERLOAD_THRESHOLD).max(0.0) * RR_PER_OVERLOAD_POINT
        - hypoxia * RR_PER_HYPOXIA_POINT;
    p.dry_weight = state.vitals.weight - overload;

    state.trajectory = Trajectory::classify(overload, state.labs.creatinine);
}

/// Simplified CKD-EPI estimate, parameterized by age and sex.
pub fn estimated_gfr(creatinine: f64, demographics: &Demographics) -> f64 {
    let (kappa, alpha, sex_factor) = match demographics.sex {
        Sex::Female => (0.7, -0.241, 1.012),
        Sex::Male => (0.9, -0.302, 1.0),
    };
    let ratio = (creatinine / kappa).max(1e-6);
    142.0
        * ratio.min(1.0).powf(alpha)
        * ratio.max(1.0).powf(-1.200)
        * 0.9938_f64.powf(demographics.age_years)
        * sex_factor
}

/// Symptom derivation — a pure function of the tick's physiologic
/// outputs, never independently progressed.
pub fn derive_symptoms(state: &mut PatientState) {
    let overload = state.physiology.fluid_overload;
    let tachypnea = (state.vitals.respiratory_rate - 20.0).max(0.0);
    let cardiac_output = state.physiology.cardiac_output;

    Field::Dyspnea.set(state, overload * 0.8 + tachypnea * 0.2);
    Field::Fatigue.set(state, (6.0 - cardiac_output) * 2.0);

    let symptoms = &mut state.symptoms;
    symptoms.orthopnea = overload > 3.0;
    symptoms.pillow_count = pillow_count(overload);
    symptoms.edema_grade = ((overload / 2.0).floor() as u8).min(4);
}

/// Pillow-count tier for orthopnea severity.
pub fn pillow_count(overload: f64) -> u8 {
    if overload <= 3.0 {
        0
    } else if overload <= 5.0 {
        1
    } else if overload <= 7.0 {
        2
    } else {
        3
    }
}
