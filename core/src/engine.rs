//! The simulation engine — one explicit instance owning its Scenario,
//! clock, state store, catalog, triggers, and event bus. Multiple
//! concurrent simulations are simply multiple instances.
//!
//! TICK ORDER (fixed, documented, never reordered):
//!   1. Clock advance (refused unless Running — a dropped tick is silent)
//!   2. PhysiologyModel update
//!   3. Intervention effects, in administration order
//!   4. TriggerEvaluator
//!   5. Timestamp stamp + history cadence/prune
//!   6. Event publication: `Tick`, then trigger events
//!
//! RULES:
//!   - Nothing in a tick may abort the run. Anomalies degrade to
//!     defaults and subscriber panics are contained by the bus.
//!   - `apply_intervention` is the only out-of-tick mutation; it only
//!     appends and takes effect on the next tick.

use crate::{
    clock::SimClock,
    event::{EventBus, EventKind, SimEvent, SubscriberId},
    intervention::{ActiveIntervention, InterventionCatalog, InterventionOrder},
    physiology::PhysiologyModel,
    rng::{NoiseStreams, RngBank},
    scenario::Scenario,
    state::PatientState,
    store::{HistorySnapshot, PatientStateStore},
    trigger::TriggerEvaluator,
    types::{Minutes, OrderId},
    view::{self, VitalsView},
};
use chrono::NaiveDateTime;
use std::collections::VecDeque;

pub struct SimEngine {
    scenario: Scenario,
    seed: u64,
    clock: SimClock,
    store: PatientStateStore,
    catalog: InterventionCatalog,
    triggers: TriggerEvaluator,
    physiology: PhysiologyModel,
    noise: NoiseStreams,
    bus: EventBus,
}

impl SimEngine {
    /// Build an engine with the standard intervention catalog and load
    /// the given scenario.
    pub fn new(scenario: Scenario, seed: u64) -> Self {
        Self::with_catalog(scenario, seed, InterventionCatalog::standard())
    }

    pub fn with_catalog(scenario: Scenario, seed: u64, catalog: InterventionCatalog) -> Self {
        let mut engine = Self {
            physiology: PhysiologyModel::from_scenario(&scenario),
            store: PatientStateStore::new(&scenario.initial_state),
            triggers: TriggerEvaluator::new(&[]),
            noise: NoiseStreams::new(&RngBank::new(seed)),
            bus: EventBus::new(),
            clock: SimClock::new(),
            scenario,
            seed,
            catalog,
        };
        let scenario = engine.scenario.clone();
        engine.load_scenario(scenario);
        engine
    }

    /// Load a scenario: value-clone its initial state, fix the
    /// canonical start instant, reset trigger latches, clear orders,
    /// and reset history to a single snapshot. Re-arms a stopped clock.
    pub fn load_scenario(&mut self, scenario: Scenario) {
        self.clock.arm();

        let mut initial = scenario.initial_state.clone();
        crate::physiology::derive_baselines(&mut initial);
        initial.timestamp = self.clock.sim_time();

        self.store = PatientStateStore::new(&initial);
        self.triggers.reset(&scenario.triggers);
        self.physiology = PhysiologyModel::from_scenario(&scenario);
        self.noise = NoiseStreams::new(&RngBank::new(self.seed));

        let label = scenario.label.clone();
        self.scenario = scenario;

        log::info!("scenario '{label}' loaded (seed {})", self.seed);
        self.bus.emit(&SimEvent::ScenarioLoaded { label });
    }

    // ── Lifecycle controls (idempotent, silent out of state) ───────

    pub fn start(&mut self) {
        if self.clock.start() {
            let event = SimEvent::SimulationStarted { elapsed_minutes: self.clock.elapsed_minutes };
            self.bus.emit(&event);
        }
    }

    pub fn pause(&mut self) {
        if self.clock.pause() {
            let event = SimEvent::SimulationPaused { elapsed_minutes: self.clock.elapsed_minutes };
            self.bus.emit(&event);
        }
    }

    pub fn resume(&mut self) {
        if self.clock.resume() {
            let event = SimEvent::SimulationResumed { elapsed_minutes: self.clock.elapsed_minutes };
            self.bus.emit(&event);
        }
    }

    pub fn stop(&mut self) {
        if self.clock.stop() {
            let event = SimEvent::SimulationStopped { elapsed_minutes: self.clock.elapsed_minutes };
            self.bus.emit(&event);
        }
    }

    /// Reset re-runs scenario load on the engine's own scenario.
    pub fn reset(&mut self) {
        let scenario = self.scenario.clone();
        self.load_scenario(scenario);
        self.bus.emit(&SimEvent::SimulationReset);
    }

    pub fn set_time_scale(&mut self, scale: f64) {
        if self.clock.set_time_scale(scale) {
            self.bus.emit(&SimEvent::TimeScaleChanged { time_scale: scale });
        }
    }

    // ── The tick ───────────────────────────────────────────────────

    /// Advance one tick. Returns the events published this tick; empty
    /// when the clock refused to advance (not running).
    pub fn tick(&mut self) -> Vec<SimEvent> {
        let Some(delta) = self.clock.advance() else {
            log::debug!("tick ignored: clock not running");
            return Vec::new();
        };
        let elapsed = self.clock.elapsed_minutes;
        let sim_time = self.clock.sim_time();

        let (state, orders) = self.store.state_and_interventions_mut();
        self.physiology.update(state, delta, elapsed, &mut self.noise);
        self.catalog.apply_active(orders, state, elapsed);
        let mut trigger_events = self.triggers.evaluate(state, elapsed, orders);
        state.timestamp = sim_time;

        if self.store.record_if_due(elapsed) {
            log::debug!("history snapshot recorded at {elapsed:.1} sim-min");
        }

        let mut events = Vec::with_capacity(1 + trigger_events.len());
        events.push(SimEvent::Tick {
            elapsed_minutes: elapsed,
            sim_time,
            trajectory: self.store.state().trajectory,
            vitals: VitalsView::from_state(self.store.state()),
        });
        events.append(&mut trigger_events);

        for event in &events {
            self.bus.emit(event);
        }
        events
    }

    /// Run n ticks, starting or resuming the clock first. Used for
    /// testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) {
        self.start();
        self.resume();
        for _ in 0..n {
            self.tick();
        }
    }

    // ── Orders ─────────────────────────────────────────────────────

    /// Record a clinician order. Append-only and safe to call at any
    /// time; the effect starts on the next tick, never retroactively.
    /// Unknown names are accepted and contribute zero effect.
    pub fn apply_intervention(&mut self, order: InterventionOrder) -> OrderId {
        let dose = order.dose.unwrap_or_else(|| {
            self.catalog
                .get(&order.name)
                .map(|profile| profile.standard_dose)
                .unwrap_or(1.0)
        });
        let active =
            ActiveIntervention::new(&order.name, dose, order.route, self.clock.elapsed_minutes);
        let order_id = active.order_id;
        let event = SimEvent::InterventionApplied {
            order_id,
            name: active.name.clone(),
            dose,
            route: active.route,
            elapsed_minutes: active.administered_at_minutes,
        };
        log::info!(
            "intervention '{}' dose {dose} ordered at {:.1} sim-min",
            active.name,
            active.administered_at_minutes
        );
        self.store.push_intervention(active);
        self.bus.emit(&event);
        order_id
    }

    // ── Read surface ───────────────────────────────────────────────

    pub fn state(&self) -> &PatientState {
        self.store.state()
    }

    pub fn state_history(&self) -> &VecDeque<HistorySnapshot> {
        self.store.history()
    }

    pub fn active_interventions(&self) -> &[ActiveIntervention] {
        self.store.interventions()
    }

    pub fn simulated_time(&self) -> NaiveDateTime {
        self.clock.sim_time()
    }

    pub fn elapsed_minutes(&self) -> Minutes {
        self.clock.elapsed_minutes
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn current_vitals(&self) -> VitalsView {
        VitalsView::from_state(self.store.state())
    }

    pub fn symptoms_description(&self) -> String {
        view::symptoms_description(self.store.state())
    }

    // ── Event subscription ─────────────────────────────────────────

    pub fn on(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&SimEvent) + 'static,
    ) -> SubscriberId {
        self.bus.on(kind, callback)
    }

    pub fn on_any(&mut self, callback: impl FnMut(&SimEvent) + 'static) -> SubscriberId {
        self.bus.on_any(callback)
    }

    pub fn off(&mut self, id: SubscriberId) -> bool {
        self.bus.off(id)
    }
}
