//! Generational driver for the population.

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::algorithms::{DifferentialEvolution, UpdateContext, UpdateStrategy};
use crate::best::BestTracker;
use crate::common::{Bounds, Candidate, EngineConfig, FitnessFunction, OptimizationResult};
use crate::error::{EngineError, Result};
use crate::instrument::{InstrumentationSink, NullSink, Phase};
use crate::pool::WorkerPool;
use crate::rng::RandomSource;

/// Owns the population and drives the generational loop:
/// initialize, evaluate, then repeat update / evaluate / refresh-best
/// until the iteration cap.
///
/// Each generation's Update and Evaluate phases either run in-thread
/// (`worker_threads == 1`) or fan out one task per population slot over
/// the worker pool, with a barrier before the next phase. Candidates are
/// moved into their tasks and reassembled in slot order from the task
/// handles, so no slot is ever aliased across threads. Results are
/// independent of the worker count: every update draws from a private
/// per-slot stream seeded off the shared random source before dispatch.
pub struct PopulationEngine {
    config: EngineConfig,
    bounds: Arc<Bounds>,
    population: Vec<Candidate>,
    rng: RandomSource,
    pool: WorkerPool,
    tracker: BestTracker,
    strategy: Arc<dyn UpdateStrategy>,
    evaluator: Option<Arc<dyn FitnessFunction>>,
    sink: Arc<dyn InstrumentationSink>,
}

impl std::fmt::Debug for PopulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopulationEngine")
            .field("config", &self.config)
            .field("bounds", &self.bounds)
            .field("population", &self.population.len())
            .field("has_evaluator", &self.evaluator.is_some())
            .finish_non_exhaustive()
    }
}

impl PopulationEngine {
    /// Build an engine for the given configuration and bounds.
    ///
    /// Defaults: differential-evolution strategy, entropy-seeded random
    /// source, no instrumentation. Fails on a zero population size or a
    /// zero worker count.
    pub fn new(config: EngineConfig, bounds: Bounds) -> Result<Self> {
        if config.population_size == 0 {
            return Err(EngineError::EmptyPopulation);
        }
        let pool = WorkerPool::new(config.worker_threads)?;
        Ok(Self {
            config,
            bounds: Arc::new(bounds),
            population: Vec::new(),
            rng: RandomSource::from_entropy(),
            pool,
            tracker: BestTracker::new(0),
            strategy: Arc::new(DifferentialEvolution::new()),
            evaluator: None,
            sink: Arc::new(NullSink),
        })
    }

    /// Store the external evaluator; not called until [`run`].
    ///
    /// [`run`]: PopulationEngine::run
    pub fn set_fitness_function<F>(&mut self, evaluator: F)
    where
        F: FitnessFunction + 'static,
    {
        self.evaluator = Some(Arc::new(evaluator));
    }

    pub fn set_strategy<S>(&mut self, strategy: S)
    where
        S: UpdateStrategy + 'static,
    {
        self.strategy = Arc::new(strategy);
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    /// Inject a random source; tests pass a seeded one.
    pub fn set_random_source(&mut self, rng: RandomSource) {
        self.rng = rng;
    }

    pub fn set_instrumentation(&mut self, sink: Arc<dyn InstrumentationSink>) {
        self.sink = sink;
    }

    /// Execute the full generational loop and return the best solution
    /// found. Re-invoking restarts from initialization, overwriting all
    /// prior population and best-solution state.
    pub fn run(&mut self) -> Result<OptimizationResult> {
        let evaluator = self
            .evaluator
            .clone()
            .ok_or(EngineError::MissingFitnessFunction)?;
        tracing::info!(
            strategy = self.strategy.name(),
            population = self.config.population_size,
            workers = self.config.worker_threads,
            max_iterations = self.config.max_iterations,
            "starting optimization run"
        );
        if self.config.worker_threads > 1 {
            self.pool.start();
        }
        let outcome = self.run_generations(&evaluator);
        self.pool.stop();
        let result = outcome?;
        tracing::info!(best_fitness = result.best_fitness, "optimization run finished");
        Ok(result)
    }

    /// Final population state; useful for inspecting a finished run.
    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Best candidate observed so far.
    pub fn best(&self) -> &Candidate {
        self.tracker.best()
    }

    fn run_generations(
        &mut self,
        evaluator: &Arc<dyn FitnessFunction>,
    ) -> Result<OptimizationResult> {
        let strategy = Arc::clone(&self.strategy);

        self.initialize();
        strategy.prepare(&mut self.population);
        self.evaluate(evaluator)?;
        strategy.post_evaluate(&mut self.population);
        self.tracker.refresh(&self.population);
        tracing::debug!(best_fitness = self.tracker.best().fitness, "initial best");

        let mut history = Vec::with_capacity(self.config.max_iterations);
        for generation in 0..self.config.max_iterations {
            self.update(evaluator)?;
            self.evaluate(evaluator)?;
            strategy.post_evaluate(&mut self.population);
            self.tracker.refresh(&self.population);
            history.push(self.tracker.best().fitness);
            if generation % 10 == 0 {
                tracing::debug!(
                    generation,
                    best_fitness = self.tracker.best().fitness,
                    "generation complete"
                );
            }
            if self.converged() {
                break;
            }
        }

        let best = self.tracker.best();
        Ok(OptimizationResult {
            best_position: best.position.clone(),
            best_fitness: best.fitness,
            history,
        })
    }

    fn initialize(&mut self) {
        let sink = Arc::clone(&self.sink);
        sink.phase_started(Phase::Initialize);
        let started = Instant::now();

        self.population.clear();
        for _ in 0..self.config.population_size {
            let position = self.rng.sample_within(&self.bounds);
            self.population.push(Candidate::unevaluated(position));
        }
        self.tracker = BestTracker::new(self.bounds.dim());

        sink.phase_finished(Phase::Initialize, started.elapsed());
    }

    fn evaluate(&mut self, evaluator: &Arc<dyn FitnessFunction>) -> Result<()> {
        let sink = Arc::clone(&self.sink);
        sink.phase_started(Phase::Evaluate);
        let started = Instant::now();

        let outcome = if self.pool.is_running() {
            self.evaluate_parallel(evaluator)
        } else {
            for candidate in self.population.iter_mut() {
                candidate.fitness = evaluator.evaluate(&candidate.position);
            }
            Ok(())
        };

        sink.phase_finished(Phase::Evaluate, started.elapsed());
        outcome
    }

    fn evaluate_parallel(&mut self, evaluator: &Arc<dyn FitnessFunction>) -> Result<()> {
        let mut handles = Vec::with_capacity(self.population.len());
        for candidate in self.population.drain(..) {
            let evaluator = Arc::clone(evaluator);
            handles.push(self.pool.submit(move || {
                let mut candidate = candidate;
                candidate.fitness = evaluator.evaluate(&candidate.position);
                candidate
            })?);
        }

        // Barrier: every task completes before the first failure surfaces
        let mut first_failure = None;
        for handle in handles {
            match handle.join() {
                Ok(candidate) => self.population.push(candidate),
                Err(error) => {
                    if first_failure.is_none() {
                        first_failure = Some(error);
                    }
                }
            }
        }
        match first_failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn update(&mut self, evaluator: &Arc<dyn FitnessFunction>) -> Result<()> {
        let sink = Arc::clone(&self.sink);
        sink.phase_started(Phase::Update);
        let started = Instant::now();

        // Per-slot streams are derived in slot order before any task runs,
        // fixing every draw sequence regardless of thread interleaving.
        let seeds: Vec<u64> = (0..self.population.len())
            .map(|_| self.rng.stream_seed())
            .collect();
        let best = self.tracker.best().clone();

        let outcome = if self.pool.is_running() {
            self.update_parallel(evaluator, &seeds, best)
        } else {
            self.update_sequential(evaluator, &seeds, &best)
        };

        sink.phase_finished(Phase::Update, started.elapsed());
        outcome
    }

    fn update_sequential(
        &mut self,
        evaluator: &Arc<dyn FitnessFunction>,
        seeds: &[u64],
        best: &Candidate,
    ) -> Result<()> {
        let snapshot = self.population.clone();
        let strategy = Arc::clone(&self.strategy);
        let bounds = Arc::clone(&self.bounds);
        for (slot, candidate) in self.population.iter_mut().enumerate() {
            let mut rng = StdRng::seed_from_u64(seeds[slot]);
            let ctx = UpdateContext {
                bounds: bounds.as_ref(),
                best,
                evaluator: evaluator.as_ref(),
            };
            strategy.update(slot, candidate, &snapshot, &ctx, &mut rng)?;
        }
        Ok(())
    }

    fn update_parallel(
        &mut self,
        evaluator: &Arc<dyn FitnessFunction>,
        seeds: &[u64],
        best: Candidate,
    ) -> Result<()> {
        let snapshot = Arc::new(self.population.clone());
        let best = Arc::new(best);

        let mut handles = Vec::with_capacity(self.population.len());
        for (slot, candidate) in self.population.drain(..).enumerate() {
            let seed = seeds[slot];
            let snapshot = Arc::clone(&snapshot);
            let best = Arc::clone(&best);
            let strategy = Arc::clone(&self.strategy);
            let bounds = Arc::clone(&self.bounds);
            let evaluator = Arc::clone(evaluator);
            handles.push(self.pool.submit(move || -> Result<Candidate> {
                let mut candidate = candidate;
                let mut rng = StdRng::seed_from_u64(seed);
                let ctx = UpdateContext {
                    bounds: bounds.as_ref(),
                    best: best.as_ref(),
                    evaluator: evaluator.as_ref(),
                };
                strategy.update(slot, &mut candidate, &snapshot, &ctx, &mut rng)?;
                Ok(candidate)
            })?);
        }

        let mut first_failure = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(candidate)) => self.population.push(candidate),
                Ok(Err(error)) | Err(error) => {
                    if first_failure.is_none() {
                        first_failure = Some(error);
                    }
                }
            }
        }
        match first_failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    // Convergence hook; always false, the iteration cap terminates the loop.
    fn converged(&self) -> bool {
        false
    }
}
