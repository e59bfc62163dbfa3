//! Per-candidate update strategies.

use rand::rngs::StdRng;

use crate::common::{Bounds, Candidate, FitnessFunction};
use crate::error::Result;

pub mod de;
pub mod swarm;

pub use de::DifferentialEvolution;
pub use swarm::SwarmVelocity;

/// Read-only state shared by every update of one phase.
pub struct UpdateContext<'a> {
    pub bounds: &'a Bounds,
    /// Snapshot of the best solution; never mutated during a phase.
    pub best: &'a Candidate,
    pub evaluator: &'a dyn FitnessFunction,
}

/// The polymorphic per-candidate update operation.
///
/// `update` receives the candidate exclusively, plus the frozen
/// previous-generation population — it must not read any other
/// candidate's current-generation state, so updates are safely
/// reorderable across worker threads.
pub trait UpdateStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// One-time population seeding after initialization, before the
    /// first evaluation.
    fn prepare(&self, _population: &mut [Candidate]) {}

    /// Update the candidate at `slot` in place, drawing randomness only
    /// from `rng` (a private per-slot stream).
    fn update(
        &self,
        slot: usize,
        candidate: &mut Candidate,
        population: &[Candidate],
        ctx: &UpdateContext<'_>,
        rng: &mut StdRng,
    ) -> Result<()>;

    /// Single-threaded per-generation bookkeeping, run after the
    /// Evaluate barrier and before the best-solution refresh.
    fn post_evaluate(&self, _population: &mut [Candidate]) {}
}
