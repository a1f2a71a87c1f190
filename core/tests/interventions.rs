//! Effect profile math and end-to-end order behavior.
//!
//! These tests run with zero noise and zero progression so expected
//! values are exact up to float accumulation.

use wardsim_core::{
    engine::SimEngine,
    intervention::{effect_strength, InterventionCatalog, InterventionOrder, Route},
    scenario::Scenario,
};

/// A flat patient: no progression, no noise, healthy kidneys (so no
/// potassium drift), and a chosen fluid overload.
fn flat_scenario(overload: f64) -> Scenario {
    let mut scenario = Scenario::default();
    scenario.noise_amplitude = 0.0;
    scenario.initial_state.physiology.fluid_overload = overload;
    scenario.initial_state.vitals.weight = 80.0 + overload;
    scenario.initial_state.labs.creatinine = 0.9;
    scenario
}

fn furosemide(dose: Option<f64>) -> InterventionOrder {
    InterventionOrder { name: "furosemide".to_string(), dose, route: Route::Iv }
}

#[test]
fn strength_ramps_to_peak_holds_then_expires() {
    let catalog = InterventionCatalog::standard();
    let profile = catalog.get("furosemide").expect("furosemide in catalog");

    // standard dose 40, peak 60 min, duration 360 min
    assert_eq!(effect_strength(profile, 40.0, 0.0), 0.0);
    assert!((effect_strength(profile, 40.0, 30.0) - 0.5).abs() < 1e-12);
    assert!((effect_strength(profile, 40.0, 60.0) - 1.0).abs() < 1e-12);
    assert!((effect_strength(profile, 40.0, 200.0) - 1.0).abs() < 1e-12);
    assert_eq!(effect_strength(profile, 40.0, 360.0), 0.0);
    assert_eq!(effect_strength(profile, 40.0, 500.0), 0.0);

    // dose scales strength linearly
    assert!((effect_strength(profile, 20.0, 60.0) - 0.5).abs() < 1e-12);
    assert!((effect_strength(profile, 80.0, 60.0) - 2.0).abs() < 1e-12);
}

#[test]
fn furosemide_end_to_end_at_peak() {
    let mut engine = SimEngine::new(flat_scenario(6.0), 1);
    engine.apply_intervention(furosemide(Some(40.0)));

    // Default scale: one tick = one simulated minute. Run just past
    // the 60-minute peak so strength has reached exactly 1.0.
    engine.run_ticks(61);

    let state = engine.state();
    assert!(
        (state.physiology.fluid_overload - 5.5).abs() < 1e-9,
        "overload should drop by exactly the profile change (0.5), got {}",
        state.physiology.fluid_overload
    );

    // Urine output is the natural formula plus the full +150 effect,
    // allowed past the physiologic ceiling by the profile max of 400.
    let natural = 50.0 * (state.physiology.gfr / 60.0);
    assert!(
        (state.physiology.urine_output - (natural + 150.0)).abs() < 1e-6,
        "urine {} != natural {} + 150",
        state.physiology.urine_output,
        natural
    );
    assert!(state.physiology.urine_output > 200.0, "profile max must override field clamp");

    // Potassium wasting is accumulated: exactly -0.3 at peak.
    assert!((state.labs.potassium - 3.9).abs() < 1e-9);
}

#[test]
fn overlapping_orders_combine_additively() {
    let mut engine = SimEngine::new(flat_scenario(6.0), 2);
    engine.apply_intervention(furosemide(Some(40.0)));
    engine.apply_intervention(furosemide(Some(40.0)));

    engine.run_ticks(61);

    let state = engine.state();
    assert!(
        (state.physiology.fluid_overload - 5.0).abs() < 1e-9,
        "two full-strength orders remove 1.0 point, got {}",
        state.physiology.fluid_overload
    );
    assert!(state.physiology.urine_output > 300.0);
    assert!(state.physiology.urine_output <= 400.0);
}

#[test]
fn expired_order_contributes_nothing_but_keeps_removed_fluid() {
    let mut engine = SimEngine::new(flat_scenario(6.0), 3);
    engine.apply_intervention(furosemide(Some(40.0)));

    // Run well past the 360-minute duration.
    engine.run_ticks(400);

    let state = engine.state();
    // Removed fluid stays removed.
    assert!((state.physiology.fluid_overload - 5.5).abs() < 1e-9);
    // Urine output falls back to the natural formula.
    let natural = 50.0 * (state.physiology.gfr / 60.0);
    assert!(
        (state.physiology.urine_output - natural).abs() < 1e-6,
        "urine {} should revert to natural {}",
        state.physiology.urine_output,
        natural
    );
    // The order stays on the list for audit.
    assert_eq!(engine.active_interventions().len(), 1);
}

#[test]
fn unknown_intervention_is_a_silent_noop() {
    let mut engine_a = SimEngine::new(flat_scenario(4.0), 5);
    let mut engine_b = SimEngine::new(flat_scenario(4.0), 5);
    engine_b.apply_intervention(InterventionOrder {
        name: "unicorn_dust".to_string(),
        dose: Some(99.0),
        route: Route::Oral,
    });

    engine_a.run_ticks(30);
    engine_b.run_ticks(30);

    assert_eq!(engine_a.state(), engine_b.state());
}

#[test]
fn omitted_dose_defaults_to_standard_dose() {
    let mut engine = SimEngine::new(flat_scenario(6.0), 6);
    engine.apply_intervention(furosemide(None));

    let orders = engine.active_interventions();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].dose, 40.0);
}
