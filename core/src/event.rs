//! The event channel — everything collaborators observe.
//!
//! RULE: Collaborators consume the simulation ONLY through events and
//! the read-only getters on the engine. They never mutate PatientState.
//!
//! Delivery is synchronous and ordered: `Tick` fires once per tick
//! after state mutation completes; trigger-derived events fire within
//! the same tick, after `Tick`, before the next tick begins. A
//! panicking subscriber is contained and logged — it neither aborts
//! the tick nor stops delivery to later subscribers.

use crate::{
    intervention::Route,
    state::Trajectory,
    trigger::{AlertPriority, LabValue},
    types::{Minutes, OrderId},
    view::VitalsView,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Every event emitted during simulation.
/// Variants are added as the platform grows — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SimEvent {
    // ── Lifecycle events ───────────────────────────
    ScenarioLoaded {
        label: String,
    },
    SimulationStarted {
        elapsed_minutes: Minutes,
    },
    SimulationPaused {
        elapsed_minutes: Minutes,
    },
    SimulationResumed {
        elapsed_minutes: Minutes,
    },
    SimulationStopped {
        elapsed_minutes: Minutes,
    },
    SimulationReset,
    TimeScaleChanged {
        time_scale: f64,
    },

    // ── Tick events ────────────────────────────────
    Tick {
        elapsed_minutes: Minutes,
        sim_time: NaiveDateTime,
        trajectory: Trajectory,
        vitals: VitalsView,
    },

    // ── Trigger events ─────────────────────────────
    TriggerActivated {
        trigger_id: String,
        elapsed_minutes: Minutes,
    },
    NurseAlert {
        message: String,
        priority: AlertPriority,
    },
    LabResult {
        values: Vec<LabValue>,
    },

    // ── Order events ───────────────────────────────
    InterventionApplied {
        order_id: OrderId,
        name: String,
        dose: f64,
        route: Route,
        elapsed_minutes: Minutes,
    },
}

impl SimEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ScenarioLoaded { .. } => EventKind::ScenarioLoaded,
            Self::SimulationStarted { .. } => EventKind::SimulationStarted,
            Self::SimulationPaused { .. } => EventKind::SimulationPaused,
            Self::SimulationResumed { .. } => EventKind::SimulationResumed,
            Self::SimulationStopped { .. } => EventKind::SimulationStopped,
            Self::SimulationReset => EventKind::SimulationReset,
            Self::TimeScaleChanged { .. } => EventKind::TimeScaleChanged,
            Self::Tick { .. } => EventKind::Tick,
            Self::TriggerActivated { .. } => EventKind::TriggerActivated,
            Self::NurseAlert { .. } => EventKind::NurseAlert,
            Self::LabResult { .. } => EventKind::LabResult,
            Self::InterventionApplied { .. } => EventKind::InterventionApplied,
        }
    }

    /// Stable string name, used in log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ScenarioLoaded { .. } => "scenario_loaded",
            Self::SimulationStarted { .. } => "simulation_started",
            Self::SimulationPaused { .. } => "simulation_paused",
            Self::SimulationResumed { .. } => "simulation_resumed",
            Self::SimulationStopped { .. } => "simulation_stopped",
            Self::SimulationReset => "simulation_reset",
            Self::TimeScaleChanged { .. } => "time_scale_changed",
            Self::Tick { .. } => "tick",
            Self::TriggerActivated { .. } => "trigger_activated",
            Self::NurseAlert { .. } => "nurse_alert",
            Self::LabResult { .. } => "lab_result",
            Self::InterventionApplied { .. } => "intervention_applied",
        }
    }
}

/// Discriminant for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ScenarioLoaded,
    SimulationStarted,
    SimulationPaused,
    SimulationResumed,
    SimulationStopped,
    SimulationReset,
    TimeScaleChanged,
    Tick,
    TriggerActivated,
    NurseAlert,
    LabResult,
    InterventionApplied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Subscriber {
    id: SubscriberId,
    filter: Option<EventKind>,
    callback: Box<dyn FnMut(&SimEvent)>,
}

/// Synchronous publish/subscribe channel for SimEvent.
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self { subscribers: Vec::new(), next_id: 0 }
    }

    /// Subscribe to one event kind.
    pub fn on(&mut self, kind: EventKind, callback: impl FnMut(&SimEvent) + 'static) -> SubscriberId {
        self.register(Some(kind), Box::new(callback))
    }

    /// Subscribe to every event.
    pub fn on_any(&mut self, callback: impl FnMut(&SimEvent) + 'static) -> SubscriberId {
        self.register(None, Box::new(callback))
    }

    fn register(&mut self, filter: Option<EventKind>, callback: Box<dyn FnMut(&SimEvent)>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, filter, callback });
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn off(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver an event to every matching subscriber, in subscription
    /// order. A panicking callback is caught and logged; delivery to
    /// the remaining subscribers continues.
    pub fn emit(&mut self, event: &SimEvent) {
        for sub in &mut self.subscribers {
            if let Some(kind) = sub.filter {
                if kind != event.kind() {
                    continue;
                }
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| (sub.callback)(event)));
            if outcome.is_err() {
                log::warn!(
                    "subscriber panicked during {} delivery; continuing",
                    event.type_name()
                );
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
