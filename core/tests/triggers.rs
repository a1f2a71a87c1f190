//! One-shot trigger semantics: pending → fired, never re-fired,
//! never un-fired, across all three kinds and all three actions.

use std::cell::RefCell;
use std::rc::Rc;
use wardsim_core::{
    engine::SimEngine,
    event::{EventKind, SimEvent},
    intervention::{InterventionOrder, Route},
    scenario::Scenario,
    state::Field,
    trigger::{
        AlertPriority, Comparison, FieldPatch, LabValue, TriggerAction, TriggerDef, TriggerKind,
    },
};

fn quiet_scenario(triggers: Vec<TriggerDef>) -> Scenario {
    let mut scenario = Scenario::default();
    scenario.noise_amplitude = 0.0;
    scenario.initial_state.labs.creatinine = 0.9;
    scenario.triggers = triggers;
    scenario
}

fn alert_trigger(id: &str, kind: TriggerKind) -> TriggerDef {
    TriggerDef {
        id: id.to_string(),
        kind,
        action: TriggerAction::NurseAlert {
            message: format!("{id} fired"),
            priority: AlertPriority::Medium,
        },
    }
}

fn count_events(engine: &mut SimEngine, kind: EventKind) -> Rc<RefCell<u32>> {
    let counter = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&counter);
    engine.on(kind, move |_| *sink.borrow_mut() += 1);
    counter
}

#[test]
fn time_trigger_fires_exactly_once() {
    let scenario = quiet_scenario(vec![alert_trigger(
        "t30",
        TriggerKind::Time { at_minutes: 30.0 },
    )]);
    let mut engine = SimEngine::new(scenario, 21);
    let alerts = count_events(&mut engine, EventKind::NurseAlert);
    let activations = count_events(&mut engine, EventKind::TriggerActivated);

    engine.run_ticks(120);

    // The time condition stays true from minute 30 on; the latch must
    // keep the action from running again.
    assert_eq!(*alerts.borrow(), 1);
    assert_eq!(*activations.borrow(), 1);
}

#[test]
fn state_trigger_latches_while_condition_stays_true() {
    let mut scenario = quiet_scenario(vec![alert_trigger(
        "overload-high",
        TriggerKind::State {
            field: Field::FluidOverload,
            op: Comparison::Gt,
            value: 7.0,
        },
    )]);
    scenario.initial_state.physiology.fluid_overload = 5.0;
    scenario.initial_state.vitals.weight = 85.0;
    scenario.natural_progression.fluid.overload_rate_per_hour = 4.0;

    let mut engine = SimEngine::new(scenario, 22);
    let activations = count_events(&mut engine, EventKind::TriggerActivated);

    // Overload crosses 7 around minute 30 and keeps climbing to the
    // clamp; the trigger still fires exactly once.
    engine.run_ticks(180);
    assert_eq!(*activations.borrow(), 1);
}

#[test]
fn intervention_trigger_waits_for_matching_order() {
    let scenario = quiet_scenario(vec![alert_trigger(
        "on-furosemide",
        TriggerKind::Intervention { name: "furosemide".to_string() },
    )]);
    let mut engine = SimEngine::new(scenario, 23);
    let activations = count_events(&mut engine, EventKind::TriggerActivated);

    engine.run_ticks(30);
    assert_eq!(*activations.borrow(), 0, "must not fire before the order exists");

    engine.apply_intervention(InterventionOrder {
        name: "furosemide".to_string(),
        dose: None,
        route: Route::Iv,
    });
    engine.run_ticks(30);
    assert_eq!(*activations.borrow(), 1);
}

#[test]
fn modify_state_action_patches_through_clamps() {
    let scenario = quiet_scenario(vec![
        TriggerDef {
            id: "scripted-k".to_string(),
            kind: TriggerKind::Time { at_minutes: 10.0 },
            action: TriggerAction::ModifyState {
                patch: vec![FieldPatch { field: Field::Potassium, value: 3.1 }],
            },
        },
        TriggerDef {
            id: "absurd-hr".to_string(),
            kind: TriggerKind::Time { at_minutes: 10.0 },
            action: TriggerAction::ModifyState {
                patch: vec![FieldPatch { field: Field::Temperature, value: 90.0 }],
            },
        },
    ]);
    let mut engine = SimEngine::new(scenario, 24);
    engine.run_ticks(20);

    let state = engine.state();
    // Healthy kidneys and zero noise: the patched potassium holds.
    assert!((state.labs.potassium - 3.1).abs() < 1e-9);
    // A patch can never escape the clamp range.
    assert_eq!(state.vitals.temperature, 42.0);
}

#[test]
fn lab_result_action_carries_values() {
    let scenario = quiet_scenario(vec![TriggerDef {
        id: "bmp".to_string(),
        kind: TriggerKind::Time { at_minutes: 5.0 },
        action: TriggerAction::LabResult {
            values: vec![LabValue {
                label: "Potassium".to_string(),
                value: 3.6,
                unit: "mmol/L".to_string(),
            }],
        },
    }]);
    let mut engine = SimEngine::new(scenario, 25);

    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);
    engine.on(EventKind::LabResult, move |event| {
        if let SimEvent::LabResult { values } = event {
            sink.borrow_mut().extend(values.iter().cloned());
        }
    });

    engine.run_ticks(10);

    let received = received.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].label, "Potassium");
    assert_eq!(received[0].value, 3.6);
    assert_eq!(received[0].unit, "mmol/L");
}

#[test]
fn latches_reset_on_scenario_reload() {
    let scenario = quiet_scenario(vec![alert_trigger(
        "t5",
        TriggerKind::Time { at_minutes: 5.0 },
    )]);
    let mut engine = SimEngine::new(scenario, 26);
    let alerts = count_events(&mut engine, EventKind::NurseAlert);

    engine.run_ticks(10);
    assert_eq!(*alerts.borrow(), 1);

    engine.reset();
    engine.run_ticks(10);
    assert_eq!(*alerts.borrow(), 2, "reload must re-arm the latch");
}
