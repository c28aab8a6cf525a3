//! Per-request memoization scope.
//!
//! # Responsibilities
//! - Invoke each producer at most once per scope
//! - Park concurrent callers on the in-flight entry instead of re-invoking
//! - Keep the in-flight entry alive when the caller that started it goes away
//! - Cache failures as well as values
//! - Refuse work once the owning request has finished

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::any::{Any, TypeId};
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::observability::metrics;
use crate::resolver::error::{ResolverError, ResolverFailure};

/// What a slot settles to: a type-erased value or the producer's failure.
type Resolved = Result<Arc<dyn Any + Send + Sync>, ResolverFailure>;

/// A producer run shared by every caller of the same id. The slot holds its
/// own handle, so dropping any caller never discards the run.
type Slot = Shared<BoxFuture<'static, Resolved>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum IdentityKey {
    Type(TypeId),
    Address(usize),
}

/// Identity of a producer within a scope.
///
/// Two ids are equal when they name the same producer definition or the same
/// shared allocation. Values captured by a producer play no part in identity.
#[derive(Debug, Clone, Copy)]
pub struct ResolverId {
    key: IdentityKey,
    label: &'static str,
}

impl ResolverId {
    /// Identity of a function item or closure, taken from its type.
    pub fn of<F: 'static>(_producer: &F) -> Self {
        Self {
            key: IdentityKey::Type(TypeId::of::<F>()),
            label: std::any::type_name::<F>(),
        }
    }

    /// Identity of a shared allocation. Only stable while the `Arc` is alive.
    pub fn of_shared<T: ?Sized>(shared: &Arc<T>, label: &'static str) -> Self {
        Self {
            key: IdentityKey::Address(Arc::as_ptr(shared) as *const () as usize),
            label,
        }
    }

    /// Human-readable name used in logs and errors.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl PartialEq for ResolverId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ResolverId {}

impl Hash for ResolverId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Counters describing how a scope was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeStats {
    /// Producers actually invoked.
    pub invocations: u64,
    /// Calls answered from a stored or in-flight entry.
    pub hits: u64,
    /// Distinct ids seen.
    pub entries: usize,
}

/// Memoization boundary owned by exactly one request.
pub struct ResolverScope {
    id: Uuid,
    slots: DashMap<ResolverId, Slot>,
    closed: AtomicBool,
    invocations: AtomicU64,
    hits: AtomicU64,
}

impl ResolverScope {
    /// Open a new, empty scope.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            slots: DashMap::new(),
            closed: AtomicBool::new(false),
            invocations: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Unique id of this scope, for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Resolve `id`, invoking `producer` only if nothing is stored or in flight.
    ///
    /// A caller arriving while the producer is still running suspends until it
    /// settles and then observes the same value or failure.
    pub async fn resolve<T, F, Fut>(&self, id: ResolverId, producer: F) -> Result<T, ResolverError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ResolverFailure>> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(ResolverError::ScopeClosed {
                scope: self.id,
                resolver: id.label,
            });
        }

        // The map guard must not be held across the await below.
        let slot = match self.slots.entry(id) {
            Entry::Occupied(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                self.invocations.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(scope = %self.id, resolver = id.label, "Invoking producer");
                let run = async move {
                    producer()
                        .await
                        .map(|value| Arc::new(value) as Arc<dyn Any + Send + Sync>)
                }
                .boxed()
                .shared();
                entry.insert(run.clone());
                run
            }
        };

        match slot.await {
            Ok(value) => value
                .downcast_ref::<T>()
                .cloned()
                .ok_or(ResolverError::TypeMismatch { resolver: id.label }),
            Err(failure) => Err(ResolverError::Failed {
                resolver: id.label,
                failure,
            }),
        }
    }

    /// Resolve a producer whose own type is its identity.
    pub async fn resolve_fn<T, F, Fut>(&self, producer: F) -> Result<T, ResolverError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ResolverFailure>> + Send + 'static,
    {
        let id = ResolverId::of(&producer);
        self.resolve(id, producer).await
    }

    /// Current usage counters.
    pub fn stats(&self) -> ScopeStats {
        ScopeStats {
            invocations: self.invocations.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            entries: self.slots.len(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Tear the scope down and drop every cached entry. Idempotent.
    pub fn close(&self) -> ScopeStats {
        let stats = self.stats();
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.slots.clear();
            metrics::record_resolver_scope(stats.invocations, stats.hits);
            tracing::debug!(
                scope = %self.id,
                invocations = stats.invocations,
                hits = stats.hits,
                entries = stats.entries,
                "Resolver scope closed"
            );
        }
        stats
    }
}

impl fmt::Debug for ResolverScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverScope")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for ResolverScope {
    fn default() -> Self {
        Self::new()
    }
}
