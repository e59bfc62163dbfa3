//! Error types for the optimization engine.

use thiserror::Error;

/// Errors that can occur while configuring or running the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Lower and upper bounds have different lengths.
    #[error("bounds mismatch: lower has {lower_len} elements, upper has {upper_len}")]
    BoundsMismatch {
        /// Length of the lower bounds vector
        lower_len: usize,
        /// Length of the upper bounds vector
        upper_len: usize,
    },

    /// Population size is zero.
    #[error("population size must be greater than 0")]
    EmptyPopulation,

    /// Worker thread count is zero.
    #[error("worker thread count must be at least 1")]
    ZeroWorkers,

    /// `run()` was called before a fitness function was set.
    #[error("no fitness function configured")]
    MissingFitnessFunction,

    /// More distinct indices were requested than the pool can supply.
    #[error("cannot sample {requested} distinct indices from a pool of {available}")]
    Sampling {
        /// Number of distinct indices requested
        requested: usize,
        /// Number of indices actually available after exclusions
        available: usize,
    },

    /// A task was submitted to a pool that is not running.
    #[error("submit on stopped worker pool")]
    PoolStopped,

    /// A fitness or update task panicked; the payload is forwarded to
    /// whoever joins the task handle.
    #[error("task failed: {message}")]
    TaskFailed {
        /// Captured panic message
        message: String,
    },
}

/// A specialized `Result` type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Returns `true` if this is a construction-time configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EngineError::BoundsMismatch { .. }
                | EngineError::EmptyPopulation
                | EngineError::ZeroWorkers
                | EngineError::MissingFitnessFunction
        )
    }

    /// Returns `true` if this is an index-sampling error.
    pub fn is_sampling(&self) -> bool {
        matches!(self, EngineError::Sampling { .. })
    }

    /// Returns `true` if this is a worker-pool lifecycle error.
    pub fn is_pool_state(&self) -> bool {
        matches!(self, EngineError::PoolStopped)
    }

    /// Returns `true` if this is a failure propagated from an
    /// evaluation or update task.
    pub fn is_evaluation(&self) -> bool {
        matches!(self, EngineError::TaskFailed { .. })
    }
}
