use rand::rngs::StdRng;
use rand::Rng;

use crate::common::Candidate;
use crate::error::Result;
use crate::rng::distinct_indices;

use super::{UpdateContext, UpdateStrategy};

/// Differential evolution: mutation, binomial crossover, greedy selection.
///
/// For each candidate, three donors are sampled without replacement from
/// the previous generation, excluding the candidate's own slot; the trial
/// vector `a + F * (b - c)` is crossed with the original per dimension,
/// clipped, evaluated and kept only on strict fitness improvement.
pub struct DifferentialEvolution {
    /// Scaling factor F applied to the donor difference.
    pub mutation_factor: f64,
    /// Crossover probability CR; a dimension keeps the original
    /// component when the draw exceeds it.
    pub crossover_probability: f64,
}

impl DifferentialEvolution {
    pub const DEFAULT_MUTATION_FACTOR: f64 = 0.5;
    pub const DEFAULT_CROSSOVER_PROBABILITY: f64 = 0.7;

    pub fn new() -> Self {
        Self {
            mutation_factor: Self::DEFAULT_MUTATION_FACTOR,
            crossover_probability: Self::DEFAULT_CROSSOVER_PROBABILITY,
        }
    }
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateStrategy for DifferentialEvolution {
    fn name(&self) -> &'static str {
        "differential-evolution"
    }

    fn update(
        &self,
        slot: usize,
        candidate: &mut Candidate,
        population: &[Candidate],
        ctx: &UpdateContext<'_>,
        rng: &mut StdRng,
    ) -> Result<()> {
        let donors = distinct_indices(rng, 3, population.len(), Some(slot))?;
        let a = &population[donors[0]];
        let b = &population[donors[1]];
        let c = &population[donors[2]];

        // Mutation
        let scaled = (&b.position - &c.position) * self.mutation_factor;
        let mut trial = &a.position + &scaled;

        // Crossover
        for j in 0..trial.len() {
            if rng.gen::<f64>() > self.crossover_probability {
                trial[j] = candidate.position[j];
            }
        }

        ctx.bounds.clip(&mut trial);

        // Selection
        let trial_fitness = ctx.evaluator.evaluate(&trial);
        if trial_fitness < candidate.fitness {
            candidate.position = trial;
            candidate.fitness = trial_fitness;
        }
        Ok(())
    }
}
