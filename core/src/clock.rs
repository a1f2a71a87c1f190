//! Simulation clock — owns run lifecycle, time scale, and the
//! wall-tick to simulated-minutes conversion.
//!
//! The clock does not own a timer. The host (sim-runner, a UI shell,
//! or a test) calls `SimEngine::tick()` once per wall-clock period;
//! the clock converts that period into simulated minutes and refuses
//! to advance unless the run is active. Pausing therefore never
//! synthesizes catch-up ticks — paused wall time simply never becomes
//! simulated time.

use crate::types::Minutes;
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Wall-clock period of one tick.
pub const DEFAULT_TICK_PERIOD_MS: u64 = 1_000;

/// Default simulated-minutes-per-real-minute multiplier.
/// At 60, one real second becomes one simulated minute.
pub const DEFAULT_TIME_SCALE: f64 = 60.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Scenario loaded, not yet started.
    Idle,
    Running,
    Paused,
    /// Terminal until the next scenario load.
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub run_state: RunState,
    pub time_scale: f64,
    pub tick_period_ms: u64,
    pub elapsed_minutes: Minutes,
    pub scenario_start: NaiveDateTime,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            run_state: RunState::Idle,
            time_scale: DEFAULT_TIME_SCALE,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            elapsed_minutes: 0.0,
            scenario_start: Self::canonical_start(),
        }
    }

    /// The canonical scenario start instant: today at 14:00 local.
    /// Fixed so generated data sorts correctly against the static
    /// historical records the chart collaborators render.
    pub fn canonical_start() -> NaiveDateTime {
        let two_pm = NaiveTime::from_hms_opt(14, 0, 0).unwrap_or(NaiveTime::MIN);
        Local::now().date_naive().and_time(two_pm)
    }

    /// Re-arm for a freshly loaded scenario. Preserves the operator's
    /// time scale and tick period; resets lifecycle and elapsed time.
    pub fn arm(&mut self) {
        self.run_state = RunState::Idle;
        self.elapsed_minutes = 0.0;
        self.scenario_start = Self::canonical_start();
    }

    /// Begin ticking. No-op unless Idle — starting a running clock is
    /// idempotent, and a stopped clock stays stopped until the next
    /// scenario load re-arms it. Returns whether a transition happened.
    pub fn start(&mut self) -> bool {
        match self.run_state {
            RunState::Idle => {
                self.run_state = RunState::Running;
                true
            }
            other => {
                log::debug!("start() ignored in state {other:?}");
                false
            }
        }
    }

    pub fn pause(&mut self) -> bool {
        match self.run_state {
            RunState::Running => {
                self.run_state = RunState::Paused;
                true
            }
            other => {
                log::debug!("pause() ignored in state {other:?}");
                false
            }
        }
    }

    pub fn resume(&mut self) -> bool {
        match self.run_state {
            RunState::Paused => {
                self.run_state = RunState::Running;
                true
            }
            other => {
                log::debug!("resume() ignored in state {other:?}");
                false
            }
        }
    }

    pub fn stop(&mut self) -> bool {
        match self.run_state {
            RunState::Running | RunState::Paused => {
                self.run_state = RunState::Stopped;
                true
            }
            other => {
                log::debug!("stop() ignored in state {other:?}");
                false
            }
        }
    }

    /// Change the multiplier for subsequent ticks only — already
    /// accrued simulated time is never restated.
    pub fn set_time_scale(&mut self, scale: f64) -> bool {
        if !scale.is_finite() || scale <= 0.0 {
            log::warn!("set_time_scale({scale}) rejected; keeping {}", self.time_scale);
            return false;
        }
        self.time_scale = scale;
        true
    }

    /// Simulated minutes one tick is worth at the current scale.
    pub fn tick_delta_minutes(&self) -> Minutes {
        (self.tick_period_ms as f64 / 60_000.0) * self.time_scale
    }

    /// Advance one tick. Returns the simulated delta, or None when the
    /// run is not active (the tick is silently dropped).
    pub fn advance(&mut self) -> Option<Minutes> {
        if self.run_state != RunState::Running {
            return None;
        }
        let delta = self.tick_delta_minutes();
        self.elapsed_minutes += delta;
        Some(delta)
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    /// The current simulated instant.
    pub fn sim_time(&self) -> NaiveDateTime {
        self.scenario_start + Duration::microseconds((self.elapsed_minutes * 60_000_000.0).round() as i64)
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}
