//! Scripted clinical triggers — one-shot scenario events.
//!
//! State machine per trigger: pending → fired (terminal). The latch
//! only resets on scenario (re)load. Triggers are evaluated every tick
//! in scenario-declared order, after physiology and intervention
//! effects have settled.

use crate::{
    event::SimEvent,
    intervention::ActiveIntervention,
    state::{Field, PatientState},
    types::Minutes,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDef {
    pub id: String,
    #[serde(flatten)]
    pub kind: TriggerKind,
    pub action: TriggerAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TriggerKind {
    /// Fires once simulated elapsed time reaches the mark.
    Time { at_minutes: Minutes },
    /// Fires once a state field satisfies the comparison.
    State { field: Field, op: Comparison, value: f64 },
    /// Fires once an intervention of the named type has been ordered.
    Intervention { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
}

impl Comparison {
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => (lhs - rhs).abs() < 1e-9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TriggerAction {
    /// Merge a patch of absolute field values into the state. Writes
    /// go through the clamped setters; patches to recomputed fields
    /// only survive until the next physiology pass.
    ModifyState { patch: Vec<FieldPatch> },
    /// Emit a message for the external chat collaborator to display.
    NurseAlert { message: String, priority: AlertPriority },
    /// Emit lab values for the external labs collaborator to ingest.
    LabResult { values: Vec<LabValue> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    pub field: Field,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabValue {
    pub label: String,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

struct TriggerState {
    def: TriggerDef,
    fired: bool,
}

/// Evaluates scenario triggers each tick and owns the one-shot latches.
pub struct TriggerEvaluator {
    triggers: Vec<TriggerState>,
}

impl TriggerEvaluator {
    pub fn new(defs: &[TriggerDef]) -> Self {
        Self {
            triggers: defs
                .iter()
                .map(|def| TriggerState { def: def.clone(), fired: false })
                .collect(),
        }
    }

    /// Replace the trigger set and reset every latch. Called on
    /// scenario load and reset.
    pub fn reset(&mut self, defs: &[TriggerDef]) {
        *self = Self::new(defs);
    }

    /// Ids of triggers that have fired this run, in declaration order.
    pub fn fired_ids(&self) -> Vec<&str> {
        self.triggers
            .iter()
            .filter(|t| t.fired)
            .map(|t| t.def.id.as_str())
            .collect()
    }

    /// Check every pending trigger against the post-effect state.
    /// A trigger that fires latches immediately and executes its action
    /// exactly once; the returned events are published by the engine
    /// after the `Tick` event, in declaration order.
    pub fn evaluate(
        &mut self,
        state: &mut PatientState,
        elapsed_minutes: Minutes,
        interventions: &[ActiveIntervention],
    ) -> Vec<SimEvent> {
        let mut events = Vec::new();

        for trigger in &mut self.triggers {
            if trigger.fired {
                continue;
            }

            let satisfied = match &trigger.def.kind {
                TriggerKind::Time { at_minutes } => elapsed_minutes >= *at_minutes,
                TriggerKind::State { field, op, value } => op.holds(field.get(state), *value),
                TriggerKind::Intervention { name } => {
                    interventions.iter().any(|i| i.name == *name)
                }
            };
            if !satisfied {
                continue;
            }

            trigger.fired = true;
            log::info!(
                "trigger '{}' fired at {elapsed_minutes:.1} sim-min",
                trigger.def.id
            );
            events.push(SimEvent::TriggerActivated {
                trigger_id: trigger.def.id.clone(),
                elapsed_minutes,
            });

            match &trigger.def.action {
                TriggerAction::ModifyState { patch } => {
                    for entry in patch {
                        entry.field.set(state, entry.value);
                    }
                }
                TriggerAction::NurseAlert { message, priority } => {
                    events.push(SimEvent::NurseAlert {
                        message: message.clone(),
                        priority: *priority,
                    });
                }
                TriggerAction::LabResult { values } => {
                    events.push(SimEvent::LabResult { values: values.clone() });
                }
            }
        }

        events
    }
}
