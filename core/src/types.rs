//! Shared primitive types used across the entire simulation.

/// Simulated minutes. The engine's native time unit; one tick advances
/// the clock by `tick_period_ms / 60_000 * time_scale` of these.
pub type Minutes = f64;

/// The canonical identifier for a clinician order.
pub type OrderId = uuid::Uuid;
