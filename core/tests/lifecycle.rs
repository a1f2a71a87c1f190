//! Clock lifecycle: idempotent controls, no catch-up ticks, stop
//! requiring a fresh load, non-retroactive time scale, and reset.

use std::cell::RefCell;
use std::rc::Rc;
use wardsim_core::{
    engine::SimEngine,
    event::EventKind,
    intervention::{InterventionOrder, Route},
    scenario::Scenario,
};

fn quiet_scenario() -> Scenario {
    let mut scenario = Scenario::default();
    scenario.noise_amplitude = 0.0;
    scenario
}

fn count_events(engine: &mut SimEngine, kind: EventKind) -> Rc<RefCell<u32>> {
    let counter = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&counter);
    engine.on(kind, move |_| *sink.borrow_mut() += 1);
    counter
}

#[test]
fn pause_swallows_ticks_without_catch_up() {
    let mut engine = SimEngine::new(quiet_scenario(), 31);
    engine.run_ticks(10);
    let elapsed_before = engine.elapsed_minutes();
    let state_before = engine.state().clone();

    engine.pause();
    // Wall-clock keeps delivering ticks while paused; none of them may
    // become simulated time.
    for _ in 0..50 {
        let events = engine.tick();
        assert!(events.is_empty());
    }
    assert_eq!(engine.elapsed_minutes(), elapsed_before);
    assert_eq!(engine.state(), &state_before);

    engine.resume();
    for _ in 0..5 {
        engine.tick();
    }
    let delta = engine.elapsed_minutes() - elapsed_before;
    assert!(
        (delta - 5.0 * engine.clock().tick_delta_minutes()).abs() < 1e-9,
        "only the 5 running ticks may accrue, got {delta} minutes"
    );
}

#[test]
fn start_is_idempotent_while_running() {
    let mut engine = SimEngine::new(quiet_scenario(), 32);
    let starts = count_events(&mut engine, EventKind::SimulationStarted);

    engine.start();
    engine.start();
    engine.start();
    assert_eq!(*starts.borrow(), 1);
}

#[test]
fn pause_and_resume_out_of_state_are_noops() {
    let mut engine = SimEngine::new(quiet_scenario(), 33);
    let pauses = count_events(&mut engine, EventKind::SimulationPaused);
    let resumes = count_events(&mut engine, EventKind::SimulationResumed);

    // Not running yet: both are silent no-ops.
    engine.pause();
    engine.resume();
    assert_eq!(*pauses.borrow(), 0);
    assert_eq!(*resumes.borrow(), 0);

    engine.start();
    engine.pause();
    engine.pause();
    assert_eq!(*pauses.borrow(), 1);
    engine.resume();
    engine.resume();
    assert_eq!(*resumes.borrow(), 1);
}

#[test]
fn stopped_engine_requires_fresh_scenario_load() {
    let mut engine = SimEngine::new(quiet_scenario(), 34);
    engine.run_ticks(5);
    engine.stop();
    let elapsed_at_stop = engine.elapsed_minutes();

    // start() after stop is refused until a scenario load re-arms.
    engine.start();
    engine.tick();
    assert_eq!(engine.elapsed_minutes(), elapsed_at_stop);

    engine.load_scenario(quiet_scenario());
    assert_eq!(engine.elapsed_minutes(), 0.0);
    engine.start();
    engine.tick();
    assert!(engine.elapsed_minutes() > 0.0);
}

#[test]
fn time_scale_change_is_not_retroactive() {
    let mut engine = SimEngine::new(quiet_scenario(), 35);
    engine.set_time_scale(60.0); // 1 simulated minute per tick
    engine.run_ticks(10);
    let elapsed_before = engine.elapsed_minutes();
    assert!((elapsed_before - 10.0).abs() < 1e-9);

    engine.set_time_scale(120.0); // 2 simulated minutes per tick
    engine.tick();
    let delta = engine.elapsed_minutes() - elapsed_before;
    assert!((delta - 2.0).abs() < 1e-9, "new scale applies to new ticks only");
}

#[test]
fn invalid_time_scale_is_rejected() {
    let mut engine = SimEngine::new(quiet_scenario(), 36);
    let changes = count_events(&mut engine, EventKind::TimeScaleChanged);

    engine.set_time_scale(0.0);
    engine.set_time_scale(-5.0);
    engine.set_time_scale(f64::NAN);
    assert_eq!(*changes.borrow(), 0);

    engine.set_time_scale(30.0);
    assert_eq!(*changes.borrow(), 1);
    assert_eq!(engine.clock().time_scale, 30.0);
}

#[test]
fn reset_restores_the_initial_snapshot() {
    let mut engine = SimEngine::new(quiet_scenario(), 37);
    engine.apply_intervention(InterventionOrder {
        name: "furosemide".to_string(),
        dose: None,
        route: Route::Iv,
    });
    engine.run_ticks(120);
    assert!(engine.elapsed_minutes() > 0.0);
    assert_eq!(engine.active_interventions().len(), 1);

    engine.reset();

    assert_eq!(engine.elapsed_minutes(), 0.0);
    assert!(engine.active_interventions().is_empty());
    assert_eq!(engine.state_history().len(), 1);
    let scenario_initial = engine.scenario().initial_state.clone();
    assert_eq!(
        engine.state().physiology.fluid_overload,
        scenario_initial.physiology.fluid_overload
    );
    assert_eq!(engine.state().labs, scenario_initial.labs);
}

#[test]
fn orders_land_safely_while_paused() {
    let mut engine = SimEngine::new(quiet_scenario(), 38);
    engine.run_ticks(10);
    engine.pause();

    let at_order = engine.elapsed_minutes();
    engine.apply_intervention(InterventionOrder {
        name: "oxygen_therapy".to_string(),
        dose: Some(2.0),
        route: Route::Inhaled,
    });

    // The order is stamped with the paused clock; nothing mutates
    // state until the next running tick.
    let orders = engine.active_interventions();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].administered_at_minutes, at_order);

    let state_before = engine.state().clone();
    engine.tick();
    assert_eq!(engine.state(), &state_before);

    engine.resume();
    engine.tick();
    assert!(engine.state().vitals.oxygen_saturation > state_before.vitals.oxygen_saturation);
}
