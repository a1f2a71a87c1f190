//! In-memory state store — the canonical PatientState, the bounded
//! history log, and the active intervention list.
//!
//! RULE: the tick is the only writer of PatientState. The one
//! out-of-tick mutation, `push_intervention`, is append-only and never
//! touches the state tree, so a clinician order can land at any moment
//! without racing an in-flight tick.

use crate::{intervention::ActiveIntervention, state::PatientState, types::Minutes};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// History is recorded at a fixed simulated cadence, not every tick,
/// so memory stays bounded regardless of time scale.
pub const SNAPSHOT_CADENCE_MINUTES: Minutes = 15.0;

/// Rolling retention window relative to the newest snapshot.
pub const RETENTION_WINDOW_MINUTES: Minutes = 24.0 * 60.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub elapsed_minutes: Minutes,
    pub state: PatientState,
}

pub struct PatientStateStore {
    state: PatientState,
    history: VecDeque<HistorySnapshot>,
    interventions: Vec<ActiveIntervention>,
    last_recorded_at: Minutes,
}

impl PatientStateStore {
    /// Build from a value-cloned initial state with a single snapshot.
    /// The clone guarantees the store never aliases the scenario's
    /// template state.
    pub fn new(initial: &PatientState) -> Self {
        let mut history = VecDeque::new();
        history.push_back(HistorySnapshot { elapsed_minutes: 0.0, state: initial.clone() });
        Self {
            state: initial.clone(),
            history,
            interventions: Vec::new(),
            last_recorded_at: 0.0,
        }
    }

    pub fn state(&self) -> &PatientState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PatientState {
        &mut self.state
    }

    /// Split borrow for the tick: the effect engine needs the order
    /// list and the state tree at once.
    pub fn state_and_interventions_mut(
        &mut self,
    ) -> (&mut PatientState, &mut Vec<ActiveIntervention>) {
        (&mut self.state, &mut self.interventions)
    }

    pub fn interventions(&self) -> &[ActiveIntervention] {
        &self.interventions
    }

    pub fn push_intervention(&mut self, order: ActiveIntervention) {
        self.interventions.push(order);
    }

    pub fn history(&self) -> &VecDeque<HistorySnapshot> {
        &self.history
    }

    /// Record a snapshot if the cadence is due, then prune entries
    /// that fell out of the retention window. Returns whether a
    /// snapshot was recorded.
    pub fn record_if_due(&mut self, elapsed_minutes: Minutes) -> bool {
        if elapsed_minutes - self.last_recorded_at < SNAPSHOT_CADENCE_MINUTES {
            return false;
        }
        self.history.push_back(HistorySnapshot {
            elapsed_minutes,
            state: self.state.clone(),
        });
        self.last_recorded_at = elapsed_minutes;

        let cutoff = elapsed_minutes - RETENTION_WINDOW_MINUTES;
        while self
            .history
            .front()
            .is_some_and(|oldest| oldest.elapsed_minutes < cutoff)
        {
            self.history.pop_front();
        }
        true
    }
}
