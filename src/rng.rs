//! Shared random source and index sampling.

use std::sync::{Mutex, PoisonError};

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};

use crate::common::Bounds;
use crate::error::{EngineError, Result};

/// Seedable, thread-safe source of uniform draws.
///
/// Every draw serializes on an internal mutex, so a single instance can be
/// shared across worker threads. For parallel phases the engine instead
/// derives one private sub-stream per population slot via [`stream_seed`],
/// which keeps draw sequences independent of thread interleaving.
///
/// [`stream_seed`]: RandomSource::stream_seed
pub struct RandomSource {
    generator: Mutex<StdRng>,
}

impl RandomSource {
    /// A deterministic source; two instances with the same seed produce
    /// identical draw sequences.
    pub fn new(seed: u64) -> Self {
        Self {
            generator: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// A source seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self {
            generator: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the generator state; affects future draws only.
    pub fn reseed(&self, seed: u64) {
        let mut generator = self.lock();
        *generator = StdRng::seed_from_u64(seed);
    }

    /// One uniform draw from `[lower, upper]`. `lower <= upper` is a
    /// caller precondition.
    pub fn uniform(&self, lower: f64, upper: f64) -> f64 {
        self.lock().gen_range(lower..=upper)
    }

    /// A position drawn uniformly within `bounds`, one independent draw
    /// per dimension, under a single lock acquisition.
    pub fn sample_within(&self, bounds: &Bounds) -> Array1<f64> {
        let mut generator = self.lock();
        let mut position = Array1::zeros(bounds.dim());
        for (value, (lo, hi)) in position
            .iter_mut()
            .zip(bounds.lower().iter().zip(bounds.upper().iter()))
        {
            let unit: f64 = generator.gen();
            *value = lo + unit * (hi - lo);
        }
        position
    }

    /// Seed for a derived private sub-stream.
    pub fn stream_seed(&self) -> u64 {
        self.lock().next_u64()
    }

    /// `count` pairwise-distinct indices in `[0, pool_size)`, optionally
    /// excluding one slot.
    pub fn choose_distinct(
        &self,
        count: usize,
        pool_size: usize,
        exclude: Option<usize>,
    ) -> Result<Vec<usize>> {
        let mut generator = self.lock();
        distinct_indices(&mut *generator, count, pool_size, exclude)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StdRng> {
        self.generator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sample `count` pairwise-distinct indices in `[0, pool_size)` without
/// replacement, skipping `exclude` if given.
///
/// Fails with [`EngineError::Sampling`] when the pool minus exclusions
/// cannot supply `count` indices.
pub fn distinct_indices<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    pool_size: usize,
    exclude: Option<usize>,
) -> Result<Vec<usize>> {
    let excluded = match exclude {
        Some(slot) if slot < pool_size => 1,
        _ => 0,
    };
    let available = pool_size - excluded;
    if count > available {
        return Err(EngineError::Sampling {
            requested: count,
            available,
        });
    }

    // Shuffle the full pool and take the first `count` not excluded
    let mut indices: Vec<usize> = (0..pool_size).collect();
    indices.shuffle(rng);
    let mut picked = Vec::with_capacity(count);
    for index in indices {
        if Some(index) == exclude {
            continue;
        }
        picked.push(index);
        if picked.len() == count {
            break;
        }
    }
    Ok(picked)
}
