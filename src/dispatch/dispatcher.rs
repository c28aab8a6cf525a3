//! Execution-mode selection and the dispatch loop.
//!
//! An `Inline` unit is awaited on the calling task and must yield between
//! steps. A `Pooled` unit runs on a worker thread; the calling task only
//! waits for its result, so the event loop keeps serving other requests.

use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;

use super::error::DispatchError;
use super::pool::WorkerPool;
use crate::config::schema::DispatchConfig;
use crate::normalize::{ResponseValue, ToResponseValue};
use crate::observability::metrics;

/// Where a unit runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// On the request's own task.
    Inline,
    /// On a worker thread from the bounded pool.
    Pooled,
}

impl ExecutionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Inline => "inline",
            ExecutionMode::Pooled => "pooled",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A computation together with its execution-mode hint.
pub enum WorkUnit<T> {
    /// Cooperative work. Must reach an await point regularly.
    Inline(BoxFuture<'static, T>),
    /// Blocking or CPU-bound work.
    Pooled(Box<dyn FnOnce() -> T + Send + 'static>),
}

impl<T> WorkUnit<T> {
    pub fn inline<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        WorkUnit::Inline(Box::pin(future))
    }

    pub fn pooled<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        WorkUnit::Pooled(Box::new(work))
    }

    pub fn mode(&self) -> ExecutionMode {
        match self {
            WorkUnit::Inline(_) => ExecutionMode::Inline,
            WorkUnit::Pooled(_) => ExecutionMode::Pooled,
        }
    }
}

impl<T> fmt::Debug for WorkUnit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WorkUnit").field(&self.mode()).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome<T> {
    Completed(T),
    /// The caller stopped waiting. A pooled unit may still be running; its
    /// result will be discarded.
    Abandoned,
}

/// What a dispatch produced, how it ran, and how long it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult<T> {
    outcome: DispatchOutcome<T>,
    mode: ExecutionMode,
    duration: Duration,
}

impl<T> DispatchResult<T> {
    fn new(outcome: DispatchOutcome<T>, mode: ExecutionMode, duration: Duration) -> Self {
        Self {
            outcome,
            mode,
            duration,
        }
    }

    pub fn outcome(&self) -> &DispatchOutcome<T> {
        &self.outcome
    }

    pub fn value(&self) -> Option<&T> {
        match &self.outcome {
            DispatchOutcome::Completed(value) => Some(value),
            DispatchOutcome::Abandoned => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self.outcome {
            DispatchOutcome::Completed(value) => Some(value),
            DispatchOutcome::Abandoned => None,
        }
    }

    pub fn is_abandoned(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Abandoned)
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}

impl<T> ToResponseValue for DispatchResult<T>
where
    T: Clone + Into<ResponseValue>,
{
    fn to_response_value(&self) -> ResponseValue {
        ResponseValue::object()
            .with_field("result", self.value().cloned())
            .with_field("mode", self.mode.as_str())
            .with_field("duration_ms", self.duration_ms())
    }
}

/// Timeouts applied to pooled units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchLimits {
    /// Longest wait for a free worker before `PoolSaturated`.
    pub submission_timeout: Duration,
    /// Longest wait for a running unit's result before `TimedOut`.
    pub computation_timeout: Duration,
}

impl From<&DispatchConfig> for DispatchLimits {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            submission_timeout: config.submission_timeout(),
            computation_timeout: config.computation_timeout(),
        }
    }
}

/// Runs work units in the mode they ask for.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    pool: Arc<WorkerPool>,
    limits: DispatchLimits,
    abandoned: Arc<AtomicU64>,
}

impl Dispatcher {
    pub fn new(pool: Arc<WorkerPool>, limits: DispatchLimits) -> Self {
        Self {
            pool,
            limits,
            abandoned: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    pub fn limits(&self) -> DispatchLimits {
        self.limits
    }

    /// Dispatches abandoned by their caller so far, in either mode and
    /// including callers dropped mid-wait.
    pub fn abandoned(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    /// Run `unit` with the dispatcher's default limits.
    pub async fn dispatch<T>(
        &self,
        unit: WorkUnit<T>,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult<T>, DispatchError>
    where
        T: Send + 'static,
    {
        self.dispatch_with_limits(unit, self.limits, cancel).await
    }

    /// Run `unit` with explicit limits, e.g. limits read from the current
    /// configuration snapshot.
    pub async fn dispatch_with_limits<T>(
        &self,
        unit: WorkUnit<T>,
        limits: DispatchLimits,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult<T>, DispatchError>
    where
        T: Send + 'static,
    {
        let start = Instant::now();
        let mode = unit.mode();

        let result = match unit {
            WorkUnit::Inline(future) => Ok(run_inline(future, start, cancel).await),
            WorkUnit::Pooled(work) => self.run_pooled(work, limits, start, cancel).await,
        };

        match &result {
            Ok(done) => {
                if done.is_abandoned() {
                    self.abandoned.fetch_add(1, Ordering::Relaxed);
                }
                let outcome = if done.is_abandoned() { "abandoned" } else { "completed" };
                metrics::record_dispatch(mode, outcome, done.duration());
                tracing::debug!(
                    mode = %mode,
                    outcome,
                    duration_ms = done.duration_ms(),
                    "Dispatch finished"
                );
            }
            Err(e) => {
                metrics::record_dispatch(mode, e.outcome_label(), e.elapsed());
                tracing::warn!(
                    mode = %mode,
                    error = %e,
                    elapsed_ms = e.elapsed().as_secs_f64() * 1000.0,
                    "Dispatch failed"
                );
            }
        }

        result
    }

    async fn run_pooled<T>(
        &self,
        work: Box<dyn FnOnce() -> T + Send + 'static>,
        limits: DispatchLimits,
        start: Instant,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult<T>, DispatchError>
    where
        T: Send + 'static,
    {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                // Nothing submitted yet, nothing to discard.
                metrics::record_abandoned(ExecutionMode::Pooled);
                return Ok(DispatchResult::new(
                    DispatchOutcome::Abandoned,
                    ExecutionMode::Pooled,
                    start.elapsed(),
                ));
            }
            acquired = timeout(limits.submission_timeout, self.pool.acquire()) => match acquired {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => return Err(DispatchError::PoolClosed { elapsed: start.elapsed() }),
                Err(_) => {
                    metrics::record_pool_saturated();
                    return Err(DispatchError::PoolSaturated { waited: start.elapsed() });
                }
            },
        };

        let receiver = self
            .pool
            .submit(permit, work)
            .map_err(|_| DispatchError::PoolClosed { elapsed: start.elapsed() })?;

        let mut watch = AbandonWatch::arm(start, self.abandoned.clone());
        let settled = tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(None),
            received = timeout(limits.computation_timeout, receiver) => match received {
                Ok(Ok(value)) => Ok(Some(value)),
                Ok(Err(_)) => Err(DispatchError::WorkerLost { elapsed: start.elapsed() }),
                Err(_) => Err(DispatchError::TimedOut {
                    limit: limits.computation_timeout,
                    elapsed: start.elapsed(),
                }),
            },
        };
        watch.disarm();

        let outcome = match settled? {
            Some(value) => DispatchOutcome::Completed(value),
            None => {
                metrics::record_abandoned(ExecutionMode::Pooled);
                tracing::warn!(
                    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Pooled computation abandoned, result will be discarded"
                );
                DispatchOutcome::Abandoned
            }
        };

        Ok(DispatchResult::new(outcome, ExecutionMode::Pooled, start.elapsed()))
    }
}

async fn run_inline<T>(
    future: BoxFuture<'static, T>,
    start: Instant,
    cancel: &CancellationToken,
) -> DispatchResult<T> {
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            metrics::record_abandoned(ExecutionMode::Inline);
            tracing::info!("Inline computation cancelled with its request");
            DispatchOutcome::Abandoned
        }
        value = future => DispatchOutcome::Completed(value),
    };

    DispatchResult::new(outcome, ExecutionMode::Inline, start.elapsed())
}

/// Fires if a pooled wait is dropped mid-flight, e.g. when the server drops
/// the handler future of a disconnected client.
struct AbandonWatch {
    start: Instant,
    armed: bool,
    abandoned: Arc<AtomicU64>,
}

impl AbandonWatch {
    fn arm(start: Instant, abandoned: Arc<AtomicU64>) -> Self {
        Self {
            start,
            armed: true,
            abandoned,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonWatch {
    fn drop(&mut self) {
        if self.armed {
            self.abandoned.fetch_add(1, Ordering::Relaxed);
            metrics::record_abandoned(ExecutionMode::Pooled);
            tracing::warn!(
                elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0,
                "Pooled computation abandoned by a dropped caller, result will be discarded"
            );
        }
    }
}
