use ndarray::Array1;
use rand::rngs::StdRng;
use rand::Rng;

use crate::common::Candidate;
use crate::error::Result;

use super::{UpdateContext, UpdateStrategy};

/// Particle-swarm velocity update.
///
/// Each dimension blends the previous velocity with attraction toward the
/// candidate's personal best and the global best, using two independent
/// uniform draws per dimension; the moved position is clipped into
/// bounds. Personal bests refresh on strict improvement after each
/// evaluation.
pub struct SwarmVelocity {
    pub inertia: f64,
    pub cognitive: f64,
    pub social: f64,
}

impl SwarmVelocity {
    pub const DEFAULT_INERTIA: f64 = 0.5;
    pub const DEFAULT_COGNITIVE: f64 = 1.0;
    pub const DEFAULT_SOCIAL: f64 = 1.0;

    pub fn new() -> Self {
        Self {
            inertia: Self::DEFAULT_INERTIA,
            cognitive: Self::DEFAULT_COGNITIVE,
            social: Self::DEFAULT_SOCIAL,
        }
    }
}

impl Default for SwarmVelocity {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateStrategy for SwarmVelocity {
    fn name(&self) -> &'static str {
        "swarm-velocity"
    }

    fn prepare(&self, population: &mut [Candidate]) {
        for candidate in population.iter_mut() {
            let dim = candidate.position.len();
            candidate.velocity = Some(Array1::zeros(dim));
            candidate.best_position = Some(candidate.position.clone());
            candidate.best_fitness = candidate.fitness;
        }
    }

    fn update(
        &self,
        _slot: usize,
        candidate: &mut Candidate,
        _population: &[Candidate],
        ctx: &UpdateContext<'_>,
        rng: &mut StdRng,
    ) -> Result<()> {
        let dim = candidate.position.len();
        let mut velocity = candidate
            .velocity
            .take()
            .unwrap_or_else(|| Array1::zeros(dim));
        let personal_best = candidate
            .best_position
            .clone()
            .unwrap_or_else(|| candidate.position.clone());

        for j in 0..dim {
            let r1: f64 = rng.gen();
            let r2: f64 = rng.gen();
            velocity[j] = self.inertia * velocity[j]
                + self.cognitive * r1 * (personal_best[j] - candidate.position[j])
                + self.social * r2 * (ctx.best.position[j] - candidate.position[j]);
            candidate.position[j] += velocity[j];
        }

        candidate.clip(ctx.bounds);
        candidate.velocity = Some(velocity);
        Ok(())
    }

    fn post_evaluate(&self, population: &mut [Candidate]) {
        for candidate in population.iter_mut() {
            if candidate.fitness < candidate.best_fitness {
                candidate.best_fitness = candidate.fitness;
                candidate.best_position = Some(candidate.position.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Bounds, UNEVALUATED};
    use ndarray::array;
    use rand::SeedableRng;

    fn sphere(position: &Array1<f64>) -> f64 {
        position.iter().map(|x| x * x).sum()
    }

    #[test]
    fn test_prepare_seeds_swarm_memory() {
        let strategy = SwarmVelocity::new();
        let mut population = vec![
            Candidate::unevaluated(array![1.0, -2.0]),
            Candidate::unevaluated(array![3.0, 4.0]),
        ];
        strategy.prepare(&mut population);
        for candidate in &population {
            assert_eq!(candidate.velocity, Some(array![0.0, 0.0]));
            assert_eq!(candidate.best_position, Some(candidate.position.clone()));
            assert_eq!(candidate.best_fitness, UNEVALUATED);
        }
    }

    #[test]
    fn test_update_stays_within_bounds_and_keeps_velocity() {
        let bounds = Bounds::new(array![-1.0, -1.0], array![1.0, 1.0]).unwrap();
        let strategy = SwarmVelocity::new();
        let evaluator = |p: &Array1<f64>| sphere(p);
        let mut best = Candidate::unevaluated(array![0.05, -0.05]);
        best.fitness = sphere(&best.position);
        let ctx = UpdateContext {
            bounds: &bounds,
            best: &best,
            evaluator: &evaluator,
        };
        let mut rng = StdRng::seed_from_u64(17);

        let mut candidate = Candidate::unevaluated(array![0.9, -0.9]);
        candidate.fitness = sphere(&candidate.position);
        let mut population = vec![candidate];
        strategy.prepare(&mut population);
        let snapshot = population.clone();
        for _ in 0..100 {
            strategy
                .update(0, &mut population[0], &snapshot, &ctx, &mut rng)
                .unwrap();
            assert!(bounds.contains(&population[0].position));
            assert!(population[0].velocity.is_some());
        }
    }

    #[test]
    fn test_post_evaluate_refreshes_personal_best_on_strict_improvement() {
        let strategy = SwarmVelocity::new();
        let mut improved = Candidate::unevaluated(array![0.1]);
        improved.fitness = 1.0;
        improved.best_position = Some(array![0.5]);
        improved.best_fitness = 2.0;
        let mut tied = Candidate::unevaluated(array![0.9]);
        tied.fitness = 3.0;
        tied.best_position = Some(array![0.4]);
        tied.best_fitness = 3.0;

        let mut population = vec![improved, tied];
        strategy.post_evaluate(&mut population);

        assert_eq!(population[0].best_fitness, 1.0);
        assert_eq!(population[0].best_position, Some(array![0.1]));
        // A tie is not an improvement
        assert_eq!(population[1].best_fitness, 3.0);
        assert_eq!(population[1].best_position, Some(array![0.4]));
    }
}
