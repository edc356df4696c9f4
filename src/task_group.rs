//! Bounded group of blocking tasks with completion-order delivery.
//!
//! Submit N closures, then pull `(index, value)` pairs as each finishes. When
//! [`TaskGroup::next`] returns `None` every task has completed, which is the
//! group-completion signal.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub struct TaskGroup<T> {
    permits: Arc<Semaphore>,
    set: JoinSet<Option<(usize, T)>>,
    submitted: usize,
}

impl<T: Send + 'static> TaskGroup<T> {
    /// A group whose tasks share `permits` worker slots.
    ///
    /// Must be created inside a tokio runtime.
    pub fn new(permits: Arc<Semaphore>) -> Self {
        Self {
            permits,
            set: JoinSet::new(),
            submitted: 0,
        }
    }

    /// A group with its own pool of `workers` slots (at least one).
    pub fn with_workers(workers: usize) -> Self {
        Self::new(Arc::new(Semaphore::new(workers.max(1))))
    }

    /// Queue `task` on the blocking pool. Returns its submission index.
    ///
    /// The task starts once a worker slot is free.
    pub fn spawn<F>(&mut self, task: F) -> usize
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let index = self.submitted;
        self.submitted += 1;

        let permits = Arc::clone(&self.permits);
        self.set.spawn(async move {
            // The semaphore is never closed while the group is alive.
            let _permit = permits.acquire_owned().await.ok()?;
            match tokio::task::spawn_blocking(task).await {
                Ok(value) => Some((index, value)),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    log::warn!("Task {} was cancelled: {}", index, e);
                    None
                }
            }
        });
        index
    }

    /// Number of tasks submitted so far.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Wait for the next task to finish.
    ///
    /// Returns `None` once all submitted tasks have completed.
    ///
    /// # Panics
    /// Re-raises the panic of any task that panicked.
    pub async fn next(&mut self) -> Option<(usize, T)> {
        while let Some(joined) = self.set.join_next().await {
            match joined {
                Ok(Some(done)) => return Some(done),
                Ok(None) => {}
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => log::warn!("Task group member was cancelled: {}", e),
            }
        }
        None
    }
}
