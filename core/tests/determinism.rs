//! THE MOST IMPORTANT TEST IN THE PROJECT.
//!
//! Two engines, same seed, same operations.
//! They must produce identical event streams.
//! Any divergence is a blocker — do not merge until fixed.

use std::cell::RefCell;
use std::rc::Rc;
use wardsim_core::{engine::SimEngine, scenario::Scenario};

fn build_engine(seed: u64) -> (SimEngine, Rc<RefCell<Vec<String>>>) {
    let mut engine = SimEngine::new(Scenario::demo_heart_failure(), seed);
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    engine.on_any(move |event| {
        sink.borrow_mut()
            .push(serde_json::to_string(event).unwrap_or_default());
    });
    (engine, log)
}

#[test]
fn same_seed_produces_identical_event_streams() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;
    const TICKS: u64 = 240; // four simulated hours at the default scale

    let (mut engine_a, log_a) = build_engine(SEED);
    let (mut engine_b, log_b) = build_engine(SEED);

    engine_a.run_ticks(TICKS);
    engine_b.run_ticks(TICKS);

    let log_a = log_a.borrow();
    let log_b = log_b.borrow();

    assert_eq!(
        log_a.len(),
        log_b.len(),
        "Event stream lengths differ: {} vs {}",
        log_a.len(),
        log_b.len()
    );

    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(a, b, "Event stream diverged at entry {i}:\n  A: {a}\n  B: {b}");
    }
}

#[test]
fn different_seeds_produce_different_streams() {
    let (mut engine_a, log_a) = build_engine(42);
    let (mut engine_b, log_b) = build_engine(99);

    engine_a.run_ticks(120);
    engine_b.run_ticks(120);

    // With different seeds the noise terms must diverge; if every tick
    // event matches, the seed is not being used.
    let log_a = log_a.borrow();
    let log_b = log_b.borrow();
    let any_different = log_a.iter().zip(log_b.iter()).any(|(a, b)| a != b);
    assert!(
        any_different,
        "Different seeds produced identical streams — seed is not being used"
    );
}

#[test]
fn same_seed_produces_identical_final_state() {
    let (mut engine_a, _) = build_engine(7);
    let (mut engine_b, _) = build_engine(7);

    engine_a.run_ticks(300);
    engine_b.run_ticks(300);

    assert_eq!(engine_a.state(), engine_b.state());
}
