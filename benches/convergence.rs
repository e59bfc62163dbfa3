use criterion::{black_box, criterion_group, criterion_main, Criterion};
use metapop::{
    Bounds, DifferentialEvolution, EngineConfig, PopulationEngine, RandomSource, SwarmVelocity,
};
use ndarray::{array, Array1};

fn sphere(position: &Array1<f64>) -> f64 {
    position.iter().map(|x| x * x).sum()
}

fn engine(worker_threads: usize) -> PopulationEngine {
    let bounds = Bounds::new(array![-5.0, -5.0], array![5.0, 5.0]).unwrap();
    let config = EngineConfig {
        population_size: 30,
        max_iterations: 10,
        worker_threads,
    };
    let mut engine = PopulationEngine::new(config, bounds).unwrap();
    engine.set_random_source(RandomSource::new(12345));
    engine.set_fitness_function(sphere);
    engine
}

fn bench_strategies(c: &mut Criterion) {
    c.bench_function("de_sphere_2d", |b| {
        b.iter(|| {
            let mut engine = engine(1);
            engine.set_strategy(DifferentialEvolution::new());
            black_box(engine.run().unwrap().best_fitness)
        })
    });

    c.bench_function("swarm_sphere_2d", |b| {
        b.iter(|| {
            let mut engine = engine(1);
            engine.set_strategy(SwarmVelocity::new());
            black_box(engine.run().unwrap().best_fitness)
        })
    });
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);
