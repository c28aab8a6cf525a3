//! Fixed-size worker pool for CPU-bound units.
//!
//! # Responsibilities
//! - Own a fixed set of OS worker threads, sized once at startup
//! - Bound occupancy with a semaphore (backpressure)
//! - Track active and peak occupancy
//! - Keep a panicking unit from taking its worker down
//!
//! # Design Decisions
//! - A permit is acquired before submission and released only when the unit
//!   finishes, so occupancy can never exceed the pool size
//! - Jobs travel over a bounded MPMC channel shared by all workers
//! - Shutdown drains queued jobs before the workers exit

use crossbeam_channel::{Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tokio::sync::{oneshot, OwnedSemaphorePermit, Semaphore};

use crate::observability::metrics;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// The pool no longer accepts work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("worker pool is shut down")]
pub struct PoolClosed;

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    /// Configured number of workers.
    pub size: usize,
    /// Workers currently running a unit.
    pub active: usize,
    /// Highest `active` value observed since start.
    pub peak: usize,
    /// Permits not currently held.
    pub available: usize,
}

#[derive(Debug, Default)]
struct Counters {
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// Marks a worker as busy for as long as it lives.
struct ActiveGuard<'a> {
    counters: &'a Counters,
}

impl<'a> ActiveGuard<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak.fetch_max(now, Ordering::SeqCst);
        metrics::record_pool_active(now);
        Self { counters }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let now = self.counters.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_pool_active(now);
    }
}

/// A reserved worker slot. Dropping it without submitting frees the slot.
#[derive(Debug)]
pub struct WorkerPermit {
    _permit: OwnedSemaphorePermit,
}

/// Bounded pool of worker threads.
#[derive(Debug)]
pub struct WorkerPool {
    size: usize,
    permits: Arc<Semaphore>,
    jobs: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl WorkerPool {
    /// Start `size` workers. A size of zero is raised to one.
    pub fn new(size: usize) -> std::io::Result<Self> {
        let size = size.max(1);
        let (tx, rx) = crossbeam_channel::bounded::<Job>(size);

        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("dispatch-worker-{index}"))
                .spawn(move || worker_loop(index, rx))?;
            workers.push(handle);
        }

        tracing::info!(size, "Worker pool started");

        Ok(Self {
            size,
            permits: Arc::new(Semaphore::new(size)),
            jobs: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn occupancy(&self) -> Occupancy {
        Occupancy {
            size: self.size,
            active: self.counters.active.load(Ordering::SeqCst),
            peak: self.counters.peak.load(Ordering::SeqCst),
            available: self.permits.available_permits(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Every worker slot is reserved.
    pub fn is_saturated(&self) -> bool {
        !self.is_closed() && self.permits.available_permits() == 0
    }

    /// Wait for a free worker slot. Suspends the calling task only.
    pub async fn acquire(&self) -> Result<WorkerPermit, PoolClosed> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map(|permit| WorkerPermit { _permit: permit })
            .map_err(|_| PoolClosed)
    }

    /// Hand a unit to a worker. The result arrives on the returned receiver;
    /// if the receiver is dropped first the result is discarded.
    pub fn submit<T, F>(&self, permit: WorkerPermit, unit: F) -> Result<oneshot::Receiver<T>, PoolClosed>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let counters = self.counters.clone();

        let job: Job = Box::new(move || {
            // Declared first, dropped last: the slot frees after the unit ends.
            let _permit = permit;
            let _active = ActiveGuard::enter(&counters);

            match panic::catch_unwind(AssertUnwindSafe(unit)) {
                Ok(value) => {
                    if tx.send(value).is_err() {
                        tracing::debug!("Pooled result discarded, caller stopped waiting");
                    }
                }
                Err(_) => tracing::error!("Pooled computation panicked"),
            }
        });

        let jobs = self.jobs.lock().expect("worker pool mutex poisoned");
        match jobs.as_ref() {
            Some(sender) => sender.send(job).map_err(|_| PoolClosed)?,
            None => return Err(PoolClosed),
        }
        Ok(rx)
    }

    /// Stop accepting work, let queued units finish, and join the workers.
    ///
    /// Blocks the calling thread; call it from a blocking context.
    pub fn shutdown(&self) {
        self.permits.close();
        let sender = self.jobs.lock().expect("worker pool mutex poisoned").take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let handles = std::mem::take(&mut *self.workers.lock().expect("worker pool mutex poisoned"));
        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("Dispatch worker exited abnormally");
            }
        }
        tracing::info!("Worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Workers exit on their own once the channel disconnects.
        self.permits.close();
        if let Ok(jobs) = self.jobs.get_mut() {
            jobs.take();
        }
    }
}

fn worker_loop(index: usize, jobs: Receiver<Job>) {
    tracing::debug!(worker = index, "Dispatch worker started");
    for job in jobs.iter() {
        job();
    }
    tracing::debug!(worker = index, "Dispatch worker stopped");
}
