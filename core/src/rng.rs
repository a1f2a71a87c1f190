//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All physiologic noise flows through SystemRng instances derived
//! from the single master seed the engine was built with.
//!
//! Each body system gets its own RNG stream, seeded deterministically
//! from (master_seed XOR system_index). This means:
//!   - Adding a new system never changes existing systems' streams.
//!   - Each system's stream is fully reproducible in isolation.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single body system.
pub struct SystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SystemRng {
    /// Create a system RNG from the master seed and a stable system
    /// index. The index must never change once assigned.
    pub fn new(master_seed: u64, system_index: u64) -> Self {
        let derived_seed = master_seed ^ (system_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Bounded noise: a uniform value in [-max_dev, +max_dev].
    /// Callers must draw every tick even when scaling the result to
    /// zero, so that streams stay aligned across configurations.
    pub fn noise(&mut self, max_dev: f64) -> f64 {
        (self.next_f64() * 2.0 - 1.0) * max_dev
    }
}

/// All system RNGs for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_system(&self, slot: SystemSlot) -> SystemRng {
        SystemRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable system slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every system's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SystemSlot {
    Cardiovascular = 0,
    Renal = 1,
    Respiratory = 2,
    // Add new systems here — append only.
}

impl SystemSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cardiovascular => "cardiovascular",
            Self::Renal => "renal",
            Self::Respiratory => "respiratory",
        }
    }
}

/// The per-system noise streams the physiology model draws from,
/// created once per scenario load so replay is seed-deterministic.
pub struct NoiseStreams {
    pub cardiovascular: SystemRng,
    pub renal: SystemRng,
    pub respiratory: SystemRng,
}

impl NoiseStreams {
    pub fn new(bank: &RngBank) -> Self {
        Self {
            cardiovascular: bank.for_system(SystemSlot::Cardiovascular),
            renal: bank.for_system(SystemSlot::Renal),
            respiratory: bank.for_system(SystemSlot::Respiratory),
        }
    }
}
