//! Population-based metaheuristic optimization engine.
//!
//! A fixed-size population of candidate solutions is evolved inside
//! per-dimension bounds by a pluggable update strategy (particle-swarm
//! velocity or differential evolution), with fitness evaluation and
//! candidate updates optionally fanned out over a persistent worker pool.

pub mod algorithms;
pub mod best;
pub mod common;
pub mod engine;
pub mod error;
pub mod instrument;
pub mod pool;
pub mod rng;

pub use algorithms::{DifferentialEvolution, SwarmVelocity, UpdateContext, UpdateStrategy};
pub use best::BestTracker;
pub use common::*;
pub use engine::PopulationEngine;
pub use error::{EngineError, Result};
pub use instrument::{InstrumentationSink, NullSink, Phase, PhaseTimer};
pub use pool::{TaskHandle, WorkerPool};
pub use rng::RandomSource;

/// Initialize the optimization engine
pub fn init() {
    tracing::info!("Metapop Optimization Engine Initialized");
}
