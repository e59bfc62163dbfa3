use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Fitness value of a candidate that has not been evaluated yet.
pub const UNEVALUATED: f64 = f64::MAX;

/// One point in the search space plus its fitness.
///
/// Swarm-style strategies additionally carry a velocity vector and the
/// best position this candidate has personally visited; both stay `None`
/// for strategies that do not use them. Elementwise vector arithmetic is
/// done directly on `position` through ndarray operators.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub position: Array1<f64>,
    pub fitness: f64,
    pub velocity: Option<Array1<f64>>,
    pub best_position: Option<Array1<f64>>,
    pub best_fitness: f64,
}

impl Candidate {
    /// A candidate at `position` whose fitness is not yet known.
    pub fn unevaluated(position: Array1<f64>) -> Self {
        Self {
            position,
            fitness: UNEVALUATED,
            velocity: None,
            best_position: None,
            best_fitness: UNEVALUATED,
        }
    }

    /// A zero-position candidate of the given dimensionality.
    pub fn zeros(dim: usize) -> Self {
        Self::unevaluated(Array1::zeros(dim))
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness < UNEVALUATED
    }

    /// Clamp every position component into the given bounds.
    pub fn clip(&mut self, bounds: &Bounds) {
        bounds.clip(&mut self.position);
    }
}

/// Per-dimension inclusive `[lower, upper]` clipping ranges.
///
/// `lower[i] <= upper[i]` is a caller precondition and is not checked;
/// a violated pair clips in an unspecified order but never panics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bounds {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl Bounds {
    pub fn new(lower: Array1<f64>, upper: Array1<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(EngineError::BoundsMismatch {
                lower_len: lower.len(),
                upper_len: upper.len(),
            });
        }
        Ok(Self { lower, upper })
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    /// Clamp every component of `position` into its range.
    pub fn clip(&self, position: &mut Array1<f64>) {
        for (value, (lo, hi)) in position
            .iter_mut()
            .zip(self.lower.iter().zip(self.upper.iter()))
        {
            if *value < *lo {
                *value = *lo;
            } else if *value > *hi {
                *value = *hi;
            }
        }
    }

    /// `true` if every component of `position` lies within its range.
    pub fn contains(&self, position: &Array1<f64>) -> bool {
        position
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(value, (lo, hi))| *value >= *lo && *value <= *hi)
    }
}

/// The externally supplied fitness evaluator; lower is better.
///
/// Must be safe to invoke concurrently from multiple worker threads with
/// distinct candidates — the engine shares it read-only across the pool.
pub trait FitnessFunction: Send + Sync {
    fn evaluate(&self, position: &Array1<f64>) -> f64;
}

impl<F> FitnessFunction for F
where
    F: Fn(&Array1<f64>) -> f64 + Send + Sync,
{
    fn evaluate(&self, position: &Array1<f64>) -> f64 {
        self(position)
    }
}

/// Configuration for the engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    pub population_size: usize,
    pub max_iterations: usize,
    /// Worker thread count; 1 means strictly in-thread execution with no
    /// threads spawned.
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_iterations: 50,
            worker_threads: 1,
        }
    }
}

/// The result of an optimization run.
#[derive(Debug, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best_position: Array1<f64>,
    pub best_fitness: f64,
    /// Best fitness after each generation; non-increasing.
    pub history: Vec<f64>,
}
