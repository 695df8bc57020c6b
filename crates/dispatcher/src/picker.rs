//! Uniform random selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Picks one item uniformly at random.
///
/// Seeded once per process; tests seed it explicitly.
pub struct Picker {
    rng: Mutex<StdRng>,
}

impl Picker {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic picker.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn pick<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..items.len());
        items.get(index)
    }
}

impl Default for Picker {
    fn default() -> Self {
        Self::new()
    }
}
