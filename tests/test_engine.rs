use std::sync::Arc;

use metapop::{
    Bounds, DifferentialEvolution, EngineConfig, Phase, PhaseTimer, PopulationEngine,
    RandomSource, SwarmVelocity,
};
use ndarray::{array, Array1};

fn sphere(position: &Array1<f64>) -> f64 {
    position.iter().map(|x| x * x).sum()
}

fn sphere_engine(worker_threads: usize, max_iterations: usize, seed: u64) -> PopulationEngine {
    let bounds = Bounds::new(array![-5.0, -5.0], array![5.0, 5.0]).unwrap();
    let config = EngineConfig {
        population_size: 30,
        max_iterations,
        worker_threads,
    };
    let mut engine = PopulationEngine::new(config, bounds).unwrap();
    engine.set_random_source(RandomSource::new(seed));
    engine.set_fitness_function(sphere);
    engine
}

#[test]
fn test_de_sphere_convergence() {
    let mut engine = sphere_engine(1, 50, 2024);
    engine.set_strategy(DifferentialEvolution::new());
    let result = engine.run().unwrap();

    assert!(
        result.best_fitness < 0.01,
        "DE failed to minimize the sphere function: fitness {}",
        result.best_fitness
    );
}

#[test]
fn test_swarm_sphere_convergence() {
    let mut engine = sphere_engine(1, 200, 2024);
    engine.set_strategy(SwarmVelocity::new());
    let result = engine.run().unwrap();

    assert!(
        result.best_fitness < 0.1,
        "Swarm failed to minimize the sphere function: fitness {}",
        result.best_fitness
    );
}

#[test]
fn test_worker_count_does_not_change_the_result() {
    let mut sequential = sphere_engine(1, 25, 42);
    sequential.set_strategy(DifferentialEvolution::new());
    let a = sequential.run().unwrap();

    let mut parallel = sphere_engine(4, 25, 42);
    parallel.set_strategy(DifferentialEvolution::new());
    let b = parallel.run().unwrap();

    assert_eq!(a.best_fitness, b.best_fitness);
    assert_eq!(a.best_position, b.best_position);
    assert_eq!(a.history, b.history);
}

#[test]
fn test_best_history_is_non_increasing() {
    for strategy in 0..2 {
        let mut engine = sphere_engine(1, 60, 7);
        if strategy == 0 {
            engine.set_strategy(DifferentialEvolution::new());
        } else {
            engine.set_strategy(SwarmVelocity::new());
        }
        let result = engine.run().unwrap();
        assert_eq!(result.history.len(), 60);
        for pair in result.history.windows(2) {
            assert!(
                pair[1] <= pair[0],
                "best fitness worsened from {} to {}",
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn test_population_stays_within_bounds_after_parallel_run() {
    let bounds = Bounds::new(array![-5.0, -5.0], array![5.0, 5.0]).unwrap();
    let mut engine = sphere_engine(2, 30, 99);
    engine.set_strategy(SwarmVelocity::new());
    engine.run().unwrap();

    assert_eq!(engine.population().len(), 30);
    for candidate in engine.population() {
        assert!(
            bounds.contains(&candidate.position),
            "candidate escaped bounds: {:?}",
            candidate.position
        );
    }
    assert!(bounds.contains(&engine.best().position));
}

#[test]
fn test_de_needs_at_least_four_candidates() {
    let bounds = Bounds::new(array![-5.0], array![5.0]).unwrap();
    let config = EngineConfig {
        population_size: 3,
        max_iterations: 10,
        worker_threads: 1,
    };
    let mut engine = PopulationEngine::new(config, bounds).unwrap();
    engine.set_random_source(RandomSource::new(1));
    engine.set_fitness_function(sphere);
    engine.set_strategy(DifferentialEvolution::new());

    let err = engine.run().unwrap_err();
    assert!(err.is_sampling());
}

#[test]
fn test_rerun_restarts_from_initialization() {
    let mut engine = sphere_engine(1, 20, 5);
    engine.set_strategy(DifferentialEvolution::new());
    let first = engine.run().unwrap();
    let second = engine.run().unwrap();

    assert_eq!(first.history.len(), 20);
    assert_eq!(second.history.len(), 20);
    assert!(second.best_fitness.is_finite());
    assert_eq!(engine.population().len(), 30);
}

#[test]
fn test_instrumentation_sees_every_phase() {
    let timer = Arc::new(PhaseTimer::new());
    let mut engine = sphere_engine(2, 5, 11);
    engine.set_strategy(DifferentialEvolution::new());
    engine.set_instrumentation(timer.clone());
    engine.run().unwrap();

    assert_eq!(timer.invocations(Phase::Initialize), 1);
    assert_eq!(timer.invocations(Phase::Update), 5);
    // One initial evaluation plus one per generation
    assert_eq!(timer.invocations(Phase::Evaluate), 6);
}

#[test]
fn test_evaluator_panic_is_reported_as_task_failure() {
    let bounds = Bounds::new(array![-5.0, -5.0], array![5.0, 5.0]).unwrap();
    let config = EngineConfig {
        population_size: 8,
        max_iterations: 3,
        worker_threads: 2,
    };
    let mut engine = PopulationEngine::new(config, bounds).unwrap();
    engine.set_random_source(RandomSource::new(21));
    engine.set_fitness_function(|_: &Array1<f64>| -> f64 { panic!("bad evaluator") });

    let err = engine.run().unwrap_err();
    assert!(err.is_evaluation(), "unexpected error: {err}");
}
