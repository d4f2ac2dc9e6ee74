use super::super::cache::key::RecordIdentifier;
use async_trait::async_trait;
use lru::LruCache;
use meridian_dns_application::ports::Resolver;
use meridian_dns_domain::{now_millis, Answer, DomainError, Query, QueryFlags, ResultCode};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

type Outcome = Option<Result<Answer, DomainError>>;
type FlightSender = Arc<watch::Sender<Outcome>>;
type EntryMap = Arc<Mutex<LruCache<RecordIdentifier, CacheEntry>>>;

/// Pending while the channel holds `None`, completed once it holds the answer.
struct CacheEntry {
    generation: u64,
    tx: FlightSender,
}

enum EntryState {
    Pending,
    Fresh(Answer),
    Stale,
}

enum Lookup {
    Hit(Answer),
    Wait(watch::Receiver<Outcome>),
}

fn lock(entries: &EntryMap) -> MutexGuard<'_, LruCache<RecordIdentifier, CacheEntry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

fn remove_if_current(
    entries: &mut LruCache<RecordIdentifier, CacheEntry>,
    key: &RecordIdentifier,
    generation: u64,
) {
    if entries.peek(key).is_some_and(|e| e.generation == generation) {
        entries.pop(key);
    }
}

/// Answers worth keeping: the name exists or authoritatively does not, and
/// at least one record bounds how long that stays true.
fn is_cacheable(answer: &Answer) -> bool {
    matches!(
        answer.result_code(),
        ResultCode::NoError | ResultCode::NxDomain
    ) && answer.records().next().is_some()
}

/// NO_RECURSION changes what the chain answers, so such queries must not
/// share entries with ordinary lookups of the same key.
fn skips_cache(query: &Query) -> bool {
    query.has_flag(QueryFlags::BYPASS_CACHE) || query.has_flag(QueryFlags::NO_RECURSION)
}

/// Owns one upstream call. Dropping it unfinished (task cancelled or aborted)
/// clears the entry it created and tells every waiter the flight was cancelled.
struct FlightGuard {
    entries: EntryMap,
    key: RecordIdentifier,
    generation: u64,
    tx: FlightSender,
    completed: bool,
}

impl FlightGuard {
    /// True when nobody is waiting any more; the entry is then withdrawn under
    /// the lock so no new waiter can join a flight about to be abandoned.
    fn abandon_if_unobserved(&self) -> bool {
        let mut entries = lock(&self.entries);
        if self.tx.receiver_count() > 0 {
            return false;
        }
        remove_if_current(&mut entries, &self.key, self.generation);
        true
    }

    fn complete(mut self, outcome: Result<Answer, DomainError>) {
        self.completed = true;
        let keep = match &outcome {
            Ok(answer) => is_cacheable(answer),
            Err(e) => {
                warn!(
                    domain = %self.key.domain(),
                    record_type = %self.key.record_type(),
                    error = %e,
                    "Upstream resolution failed"
                );
                false
            }
        };
        if !keep {
            remove_if_current(&mut lock(&self.entries), &self.key, self.generation);
        }
        self.tx.send_replace(Some(outcome));
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if !self.completed {
            remove_if_current(&mut lock(&self.entries), &self.key, self.generation);
            self.tx.send_replace(Some(Err(DomainError::Cancelled)));
        }
    }
}

/// TTL-aware, single-flight memoizing decorator.
///
/// Concurrent identical queries share one upstream call. Upstream work runs
/// on the injected runtime handle and is abandoned once every waiter has gone.
pub struct CachingResolver {
    inner: Arc<dyn Resolver>,
    entries: EntryMap,
    next_generation: AtomicU64,
    runtime: Handle,
}

impl CachingResolver {
    pub fn new(inner: Arc<dyn Resolver>, max_entries: usize, runtime: Handle) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        debug!(max_entries = capacity.get(), "Caching resolver created");
        Self {
            inner,
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            next_generation: AtomicU64::new(0),
            runtime,
        }
    }

    /// Number of entries, pending ones included.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    fn lookup_or_start(&self, query: &Query) -> Lookup {
        let key = RecordIdentifier::from_query(query);
        let mut entries = lock(&self.entries);

        if let Some(entry) = entries.get(&key) {
            let state = match &*entry.tx.borrow() {
                None => EntryState::Pending,
                Some(Ok(answer)) if answer.is_unexpired_at(now_millis()) => {
                    EntryState::Fresh(answer.clone())
                }
                Some(_) => EntryState::Stale,
            };
            match state {
                EntryState::Pending => {
                    debug!(
                        domain = %query.domain,
                        record_type = %query.record_type,
                        "Cache JOIN in-flight"
                    );
                    return Lookup::Wait(entry.tx.subscribe());
                }
                EntryState::Fresh(answer) => {
                    debug!(
                        domain = %query.domain,
                        record_type = %query.record_type,
                        "Cache HIT"
                    );
                    return Lookup::Hit(answer);
                }
                EntryState::Stale => {
                    debug!(
                        domain = %query.domain,
                        record_type = %query.record_type,
                        "Cache entry expired"
                    );
                }
            }
        } else {
            debug!(
                domain = %query.domain,
                record_type = %query.record_type,
                "Cache MISS"
            );
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        let tx = Arc::new(tx);
        entries.put(
            key.clone(),
            CacheEntry {
                generation,
                tx: Arc::clone(&tx),
            },
        );
        drop(entries);

        self.start_flight(
            FlightGuard {
                entries: Arc::clone(&self.entries),
                key,
                generation,
                tx,
                completed: false,
            },
            query.clone(),
        );
        Lookup::Wait(rx)
    }

    fn start_flight(&self, guard: FlightGuard, query: Query) {
        let inner = Arc::clone(&self.inner);
        self.runtime.spawn(async move {
            let resolve = inner.resolve(&query);
            tokio::pin!(resolve);

            let outcome = loop {
                tokio::select! {
                    result = &mut resolve => break result,
                    _ = guard.tx.closed() => {
                        if guard.abandon_if_unobserved() {
                            debug!(
                                domain = %query.domain,
                                "No waiters left, cancelling upstream query"
                            );
                            return;
                        }
                    }
                }
            };

            guard.complete(outcome);
        });
    }
}

async fn await_outcome(mut rx: watch::Receiver<Outcome>) -> Result<Answer, DomainError> {
    loop {
        if let Some(outcome) = rx.borrow_and_update().clone() {
            return outcome;
        }
        if rx.changed().await.is_err() {
            return Err(DomainError::Cancelled);
        }
    }
}

#[async_trait]
impl Resolver for CachingResolver {
    async fn resolve(&self, query: &Query) -> Result<Answer, DomainError> {
        if skips_cache(query) {
            debug!(
                domain = %query.domain,
                record_type = %query.record_type,
                flags = %query.flags,
                "Cache BYPASS"
            );
            return self.inner.resolve(query).await;
        }

        match self.lookup_or_start(query) {
            Lookup::Hit(answer) => Ok(answer),
            Lookup::Wait(rx) => await_outcome(rx).await,
        }
    }
}
