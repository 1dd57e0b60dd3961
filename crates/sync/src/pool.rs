//! Fixed-size pool of worker threads fed from a single FIFO queue.
//!
//! `await_completion` is a barrier on the number of submitted tasks that have
//! not finished yet. It does not stop new submissions. Calling it from inside a
//! pooled task deadlocks, since that task itself is still pending.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, LockResult, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, warn};

use crate::error::PoolError;

/// Worker count used when a caller asks for fewer than one worker.
pub const DEFAULT_WORKERS: usize = 5;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Queue {
    tasks: VecDeque<Task>,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
    pending: Mutex<usize>,
    drained: Condvar,
}

// Neither mutex is held while a task runs, so poisoning cannot leave the
// guarded state half-updated.
fn relock<'a, T>(result: LockResult<MutexGuard<'a, T>>) -> MutexGuard<'a, T> {
    result.unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn next_task(&self) -> Option<Task> {
        let mut queue = relock(self.queue.lock());
        loop {
            if let Some(task) = queue.tasks.pop_front() {
                return Some(task);
            }
            if queue.shutdown {
                return None;
            }
            queue = relock(self.available.wait(queue));
        }
    }

    fn finish_one(&self) {
        let mut pending = relock(self.pending.lock());
        *pending -= 1;
        if *pending == 0 {
            self.drained.notify_all();
        }
    }
}

pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl WorkerPool {
    /// Spawns `size` workers, or [`DEFAULT_WORKERS`] when `size` is zero.
    pub fn new(size: usize) -> Self {
        let size = if size == 0 { DEFAULT_WORKERS } else { size };
        let shared = Arc::new(Shared::default());

        let workers = (0..size)
            .map(|id| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("textscope-worker-{id}"))
                    .spawn(move || run_worker(id, &shared))
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    error!("failed to spawn worker thread: {e}");
                    None
                }
            })
            .collect::<Vec<_>>();

        if workers.len() < size {
            warn!("worker pool running with {} of {} workers", workers.len(), size);
        }
        Self::from_workers(shared, workers)
    }

    fn from_workers(shared: Arc<Shared>, workers: Vec<JoinHandle<()>>) -> Self {
        if workers.is_empty() {
            error!("worker pool has no workers; submissions will be rejected");
        }
        Self {
            shared,
            size: workers.len(),
            workers: Mutex::new(workers),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of submitted tasks that have not finished.
    pub fn pending(&self) -> usize {
        *relock(self.shared.pending.lock())
    }

    /// Queues a task for execution. Never blocks on the task itself.
    pub fn submit<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.size == 0 {
            return Err(PoolError::NoWorkers);
        }
        let mut queue = relock(self.shared.queue.lock());
        if queue.shutdown {
            return Err(PoolError::ShutDown);
        }
        // Counted before it becomes visible to workers so the barrier can never
        // observe zero while this task is still queued.
        *relock(self.shared.pending.lock()) += 1;
        queue.tasks.push_back(Box::new(task));
        drop(queue);
        self.shared.available.notify_one();
        Ok(())
    }

    /// Blocks until every task submitted so far has finished.
    pub fn await_completion(&self) {
        let mut pending = relock(self.shared.pending.lock());
        while *pending > 0 {
            pending = relock(self.shared.drained.wait(pending));
        }
    }

    /// Stops accepting tasks. Queued tasks still run before the workers exit.
    pub fn shutdown(&self) {
        let mut queue = relock(self.shared.queue.lock());
        if !queue.shutdown {
            queue.shutdown = true;
            debug!("worker pool shutting down with {} queued tasks", queue.tasks.len());
        }
        drop(queue);
        self.shared.available.notify_all();
    }

    /// Shuts the pool down and waits for every worker thread to exit.
    pub fn join(&self) {
        self.shutdown();
        let handles = std::mem::take(&mut *relock(self.workers.lock()));
        for handle in handles {
            if handle.join().is_err() {
                error!("worker thread exited abnormally");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join();
    }
}

fn run_worker(id: usize, shared: &Shared) {
    while let Some(task) = shared.next_task() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            error!("worker {id}: task failed: {}", panic_message(payload.as_ref()));
        }
        shared.finish_one();
    }
    debug!("worker {id} exiting");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}
