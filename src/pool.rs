//! Persistent worker pool with a FIFO task queue.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::error::{EngineError, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueueState {
    tasks: VecDeque<Job>,
    stop: bool,
}

struct PoolShared {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl PoolShared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A bounded set of persistent worker threads consuming a shared FIFO
/// queue.
///
/// The pool starts in the stopped state. [`start`] spawns the workers,
/// [`stop`] drains the remaining queue, wakes everyone and joins the
/// threads; both are idempotent. Submitting while stopped fails with
/// [`EngineError::PoolStopped`].
///
/// [`start`]: WorkerPool::start
/// [`stop`]: WorkerPool::stop
pub struct WorkerPool {
    threads: usize,
    shared: Arc<PoolShared>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .field("workers", &self.workers.len())
            .finish()
    }
}

impl WorkerPool {
    /// A pool of `threads` workers; they are not spawned until [`start`].
    ///
    /// [`start`]: WorkerPool::start
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(EngineError::ZeroWorkers);
        }
        Ok(Self {
            threads,
            shared: Arc::new(PoolShared {
                state: Mutex::new(QueueState {
                    tasks: VecDeque::new(),
                    stop: true,
                }),
                available: Condvar::new(),
            }),
            workers: Vec::new(),
        })
    }

    /// Spawn the worker threads; no effect if already running.
    pub fn start(&mut self) {
        if !self.workers.is_empty() {
            return;
        }
        self.shared.lock().stop = false;
        for _ in 0..self.threads {
            let shared = Arc::clone(&self.shared);
            self.workers.push(thread::spawn(move || worker_loop(shared)));
        }
    }

    /// Signal stop, drain the remaining queue and join every worker.
    /// Blocks until all workers have exited; no effect if already stopped.
    pub fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.shared.lock().stop = true;
        self.shared.available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }

    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }

    /// Enqueue a task in FIFO order and hand back a handle to wait on.
    ///
    /// A panic inside the task is caught and reported through the handle;
    /// the worker keeps serving the queue.
    pub fn submit<T, F>(&self, task: F) -> Result<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let completion = Arc::new(Completion {
            cell: Mutex::new(None),
            done: Condvar::new(),
        });
        let report = Arc::clone(&completion);
        let job: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(task)).map_err(|payload| {
                EngineError::TaskFailed {
                    message: panic_message(payload.as_ref()),
                }
            });
            let mut cell = report.cell.lock().unwrap_or_else(PoisonError::into_inner);
            *cell = Some(outcome);
            report.done.notify_all();
        });

        {
            let mut state = self.shared.lock();
            if state.stop {
                return Err(EngineError::PoolStopped);
            }
            state.tasks.push_back(job);
        }
        self.shared.available.notify_one();
        Ok(TaskHandle { completion })
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(shared: Arc<PoolShared>) {
    loop {
        let job = {
            let mut state = shared.lock();
            loop {
                if let Some(job) = state.tasks.pop_front() {
                    break job;
                }
                if state.stop {
                    return;
                }
                state = shared
                    .available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };
        job();
    }
}

struct Completion<T> {
    cell: Mutex<Option<Result<T>>>,
    done: Condvar,
}

/// Handle for one submitted task; [`join`] blocks until the task has run
/// and yields its result, or the error it failed with.
///
/// [`join`]: TaskHandle::join
pub struct TaskHandle<T> {
    completion: Arc<Completion<T>>,
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").finish_non_exhaustive()
    }
}

impl<T> TaskHandle<T> {
    pub fn join(self) -> Result<T> {
        let mut cell = self
            .completion
            .cell
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = cell.take() {
                return outcome;
            }
            cell = self
                .completion
                .done
                .wait(cell)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
