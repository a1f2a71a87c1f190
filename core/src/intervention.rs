//! Intervention effect engine — the catalog of known interventions
//! and the onset/peak/decay math for active orders.
//!
//! Strength for an order with dose `d` and elapsed minutes `e`:
//!   (d / standard_dose) × min(e / peak_time, 1)
//! ramping linearly to full strength at peak time, held until
//! `duration_minutes`, after which the order contributes nothing (it
//! stays on the list for audit).
//!
//! Overlapping orders on the same field combine additively, in
//! administration order. No interaction modeling is attempted; this
//! simplification is load-bearing for predictable test behavior.

use crate::{
    state::{Field, FieldKind, PatientState},
    types::{Minutes, OrderId},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectProfile {
    pub standard_dose: f64,
    pub peak_time_minutes: Minutes,
    pub duration_minutes: Minutes,
    pub effects: Vec<FieldEffect>,
}

impl Default for EffectProfile {
    fn default() -> Self {
        Self {
            standard_dose: 1.0,
            peak_time_minutes: 30.0,
            duration_minutes: 240.0,
            effects: Vec::new(),
        }
    }
}

/// A single field delta at full strength. `min`/`max` override the
/// field's physiologic clamp for this effect (a diuretic may push
/// urine output past the natural formula ceiling).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEffect {
    pub field: Field,
    pub change: f64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

fn effect(field: Field, change: f64) -> FieldEffect {
    FieldEffect { field, change, min: None, max: None }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Iv,
    Oral,
    Inhaled,
    Subcutaneous,
}

impl Default for Route {
    fn default() -> Self {
        Self::Iv
    }
}

/// A clinician order as submitted from outside the tick boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionOrder {
    pub name: String,
    /// Defaults to the catalog's standard dose when omitted.
    #[serde(default)]
    pub dose: Option<f64>,
    #[serde(default)]
    pub route: Route,
}

/// An order on the active list. Never removed — expired orders stay
/// for audit but contribute zero effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveIntervention {
    pub order_id: OrderId,
    pub name: String,
    pub dose: f64,
    pub route: Route,
    pub administered_at_minutes: Minutes,
    /// Cumulative strength already folded into accumulated fields.
    #[serde(default)]
    applied_strength: f64,
}

impl ActiveIntervention {
    pub fn new(name: &str, dose: f64, route: Route, administered_at_minutes: Minutes) -> Self {
        Self {
            order_id: Uuid::new_v4(),
            name: name.to_string(),
            dose,
            route,
            administered_at_minutes,
            applied_strength: 0.0,
        }
    }

    pub fn elapsed(&self, now_minutes: Minutes) -> Minutes {
        now_minutes - self.administered_at_minutes
    }
}

/// Current strength of an order, in [0, dose/standard_dose].
pub fn effect_strength(profile: &EffectProfile, dose: f64, elapsed_minutes: Minutes) -> f64 {
    if elapsed_minutes < 0.0 || elapsed_minutes >= profile.duration_minutes {
        return 0.0;
    }
    let standard = if profile.standard_dose > 0.0 { profile.standard_dose } else { 1.0 };
    let dose_ratio = if dose > 0.0 { dose / standard } else { 1.0 };
    let ramp = if profile.peak_time_minutes > 0.0 {
        (elapsed_minutes / profile.peak_time_minutes).min(1.0)
    } else {
        1.0
    };
    dose_ratio * ramp
}

/// The catalog of modeled interventions, keyed by order name.
/// Unknown names are a silent no-op — "no modeled effect", not an error.
pub struct InterventionCatalog {
    profiles: HashMap<String, EffectProfile>,
}

impl InterventionCatalog {
    pub fn empty() -> Self {
        Self { profiles: HashMap::new() }
    }

    /// The built-in formulary.
    pub fn standard() -> Self {
        let mut catalog = Self::empty();

        catalog.insert("furosemide", EffectProfile {
            standard_dose: 40.0,
            peak_time_minutes: 60.0,
            duration_minutes: 360.0,
            effects: vec![
                FieldEffect { field: Field::FluidOverload, change: -0.5, min: Some(0.0), max: None },
                FieldEffect { field: Field::UrineOutput, change: 150.0, min: None, max: Some(400.0) },
                effect(Field::Potassium, -0.3),
            ],
        });

        catalog.insert("oxygen_therapy", EffectProfile {
            standard_dose: 2.0,
            peak_time_minutes: 10.0,
            duration_minutes: 720.0,
            effects: vec![
                effect(Field::OxygenSaturation, 6.0),
                effect(Field::RespiratoryRate, -4.0),
            ],
        });

        catalog.insert("metoprolol", EffectProfile {
            standard_dose: 25.0,
            peak_time_minutes: 90.0,
            duration_minutes: 720.0,
            effects: vec![
                effect(Field::HeartRate, -20.0),
                effect(Field::Systolic, -12.0),
                effect(Field::CardiacOutput, -0.3),
            ],
        });

        catalog.insert("nitroglycerin", EffectProfile {
            standard_dose: 0.4,
            peak_time_minutes: 5.0,
            duration_minutes: 45.0,
            effects: vec![
                effect(Field::Systolic, -25.0),
                effect(Field::Diastolic, -12.0),
            ],
        });

        catalog.insert("normal_saline_bolus", EffectProfile {
            standard_dose: 500.0,
            peak_time_minutes: 30.0,
            duration_minutes: 240.0,
            effects: vec![
                effect(Field::FluidOverload, 0.8),
                effect(Field::Systolic, 8.0),
            ],
        });

        catalog.insert("potassium_chloride", EffectProfile {
            standard_dose: 20.0,
            peak_time_minutes: 120.0,
            duration_minutes: 480.0,
            effects: vec![effect(Field::Potassium, 0.7)],
        });

        catalog.insert("lisinopril", EffectProfile {
            standard_dose: 10.0,
            peak_time_minutes: 360.0,
            duration_minutes: 1440.0,
            effects: vec![
                effect(Field::Systolic, -10.0),
                effect(Field::Diastolic, -6.0),
                effect(Field::Gfr, -5.0),
            ],
        });

        catalog
    }

    pub fn insert(&mut self, name: impl Into<String>, profile: EffectProfile) {
        self.profiles.insert(name.into(), profile);
    }

    pub fn get(&self, name: &str) -> Option<&EffectProfile> {
        self.profiles.get(name)
    }

    /// Apply every in-window order's contribution to the state, in
    /// administration order.
    ///
    /// Recomputed fields had their base rewritten by the physiology
    /// pass this tick, so the full `change × strength` is re-added.
    /// Accumulated fields carry prior contributions forward, so only
    /// the strength delta since the last application is added — the
    /// cumulative contribution reaches exactly `change × dose_ratio`
    /// at peak and stays there after expiry (removed fluid stays
    /// removed).
    pub fn apply_active(
        &self,
        orders: &mut [ActiveIntervention],
        state: &mut PatientState,
        now_minutes: Minutes,
    ) {
        for order in orders.iter_mut() {
            let Some(profile) = self.profiles.get(&order.name) else {
                log::debug!("no modeled effect for intervention '{}'", order.name);
                continue;
            };
            let elapsed = order.elapsed(now_minutes);
            if elapsed < 0.0 || elapsed >= profile.duration_minutes {
                continue;
            }
            let strength = effect_strength(profile, order.dose, elapsed);

            for eff in &profile.effects {
                let (field_lo, field_hi) = eff.field.bounds();
                let lo = eff.min.unwrap_or(field_lo);
                let hi = eff.max.unwrap_or(field_hi);
                let contribution = match eff.field.kind() {
                    FieldKind::Recomputed => eff.change * strength,
                    FieldKind::Accumulated => {
                        eff.change * (strength - order.applied_strength).max(0.0)
                    }
                };
                let current = eff.field.get(state);
                eff.field.set_within(state, current + contribution, lo, hi);
            }

            order.applied_strength = order.applied_strength.max(strength);
        }
    }
}
