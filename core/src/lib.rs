//! wardsim-core — the patient physiology simulation engine.
//!
//! TICK ORDER (fixed, documented, never reordered):
//!   1. PhysiologyModel           — natural evolution of vitals, labs, symptoms
//!   2. Intervention effects      — active clinician orders, in administration order
//!   3. TriggerEvaluator          — one-shot scripted clinical events
//!   4. History recording         — 15-simulated-minute cadence, 24-hour window
//!   5. Event publication         — `Tick` first, trigger events after
//!
//! RULES:
//!   - Simulated time advances only inside a tick, never retroactively.
//!   - Every numeric state write passes through its field's clamp range.
//!   - All randomness flows through SystemRng streams derived from one seed.
//!   - A trigger's action executes at most once per scenario run.
//!   - Nothing in a tick may abort the run: anomalies degrade to defaults,
//!     subscriber panics are contained and logged.

pub mod clock;
pub mod engine;
pub mod error;
pub mod event;
pub mod intervention;
pub mod physiology;
pub mod rng;
pub mod scenario;
pub mod state;
pub mod store;
pub mod trigger;
pub mod types;
pub mod view;
