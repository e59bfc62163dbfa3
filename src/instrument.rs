//! Phase-boundary instrumentation.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// The engine phases reported to instrumentation sinks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Initialize,
    Update,
    Evaluate,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Initialize => "initialize",
            Phase::Update => "update",
            Phase::Evaluate => "evaluate",
        }
    }

    fn index(&self) -> usize {
        match self {
            Phase::Initialize => 0,
            Phase::Update => 1,
            Phase::Evaluate => 2,
        }
    }
}

/// Receives phase start/stop notifications from the engine.
///
/// Purely observational; implementations must not assume any ordering
/// beyond start-before-finish per phase invocation.
pub trait InstrumentationSink: Send + Sync {
    fn phase_started(&self, _phase: Phase) {}
    fn phase_finished(&self, _phase: Phase, _elapsed: Duration) {}
}

/// The default sink; discards every notification.
pub struct NullSink;

impl InstrumentationSink for NullSink {}

#[derive(Default)]
struct PhaseTotals {
    elapsed: [Duration; 3],
    invocations: [u64; 3],
}

/// Accumulates total elapsed time and invocation counts per phase.
#[derive(Default)]
pub struct PhaseTimer {
    totals: Mutex<PhaseTotals>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total time spent in `phase` so far.
    pub fn total(&self, phase: Phase) -> Duration {
        self.lock().elapsed[phase.index()]
    }

    /// Number of completed `phase` invocations so far.
    pub fn invocations(&self, phase: Phase) -> u64 {
        self.lock().invocations[phase.index()]
    }

    /// Report accumulated totals through tracing.
    pub fn log_summary(&self) {
        let totals = self.lock();
        tracing::info!(
            initialize = ?totals.elapsed[Phase::Initialize.index()],
            update = ?totals.elapsed[Phase::Update.index()],
            evaluate = ?totals.elapsed[Phase::Evaluate.index()],
            "phase timing totals"
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PhaseTotals> {
        self.totals.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InstrumentationSink for PhaseTimer {
    fn phase_finished(&self, phase: Phase, elapsed: Duration) {
        let mut totals = self.lock();
        totals.elapsed[phase.index()] += elapsed;
        totals.invocations[phase.index()] += 1;
    }
}
