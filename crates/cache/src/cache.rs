//! Single-flight TTL cache
//!
//! Each key holds either a stored value or an in-flight computation. A miss
//! spawns the compute future as its own task and parks a pending marker
//! under the key; concurrent callers for the same key subscribe to that
//! marker instead of computing again.
//!
//! ```text
//!  caller A ──miss──► [Pending #7] ◄──join── caller B
//!                          │
//!                   spawned compute
//!                          │
//!            Ok(v) ──► [Ready v, stored_at, ttl] ──► A, B get v
//!            Err(e) ─► slot removed ──────────────► A, B get Compute(e)
//! ```
//!
//! A waiter that goes away (its cycle timed out) unsubscribes. When the
//! last waiter leaves before the computation finishes, the task is aborted
//! and the marker removed.

use chrono::Duration;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::debug;
use quorum_core::Timestamp;
use quorum_ports::Clock;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use crate::error::CacheError;
use crate::key::CacheKey;

/// A stored value with its expiry metadata
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: CacheKey,
    pub value: V,
    pub stored_at: Timestamp,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Stale once `now - stored_at >= ttl`; a stale entry is never served
    pub fn is_stale(&self, now: Timestamp) -> bool {
        now - self.stored_at >= self.ttl
    }
}

type Outcome<V, E> = Option<Result<V, E>>;

struct Flight<V, E> {
    id: u64,
    rx: watch::Receiver<Outcome<V, E>>,
    subscribers: Arc<Subscribers>,
}

/// Shared by a flight and its waiters, so a flight pushed out of the map
/// by `set` or `invalidate` is still aborted when its last waiter leaves
struct Subscribers {
    count: AtomicUsize,
    task: AbortHandle,
}

enum Slot<V, E> {
    Ready(CacheEntry<V>),
    Pending(Flight<V, E>),
}

struct Inner<V, E> {
    entries: DashMap<CacheKey, Slot<V, E>>,
    clock: Arc<dyn Clock>,
    next_flight: AtomicU64,
}

/// Shared TTL cache with single-flight computation
///
/// Cheap to clone; clones share the same storage.
pub struct Cache<V, E> {
    inner: Arc<Inner<V, E>>,
}

impl<V, E> Clone for Cache<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> Cache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                clock,
                next_flight: AtomicU64::new(1),
            }),
        }
    }

    /// Return the fresh value for `key`, computing it at most once
    ///
    /// `compute` is only invoked when no fresh value and no in-flight
    /// computation exist for `key`. Its future runs on its own task; the
    /// closure itself is called while the key is locked, so it must not
    /// touch this cache.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<V, CacheError<E>>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let now = self.inner.clock.now();

        let (id, rx, subscribers) = match self.inner.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => match occupied.get_mut() {
                Slot::Pending(flight) => {
                    let waiters = flight.subscribers.count.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!("[CACHE] join {} (waiters={})", key, waiters);
                    (flight.id, flight.rx.clone(), flight.subscribers.clone())
                }
                Slot::Ready(entry) => {
                    if !entry.is_stale(now) {
                        debug!("[CACHE] hit {}", key);
                        return Ok(entry.value.clone());
                    }
                    debug!("[CACHE] stale {}", key);
                    let flight = self.launch(key.clone(), ttl, compute);
                    let joined = (flight.id, flight.rx.clone(), flight.subscribers.clone());
                    occupied.insert(Slot::Pending(flight));
                    joined
                }
            },
            Entry::Vacant(vacant) => {
                debug!("[CACHE] miss {}", key);
                let flight = self.launch(key.clone(), ttl, compute);
                let joined = (flight.id, flight.rx.clone(), flight.subscribers.clone());
                vacant.insert(Slot::Pending(flight));
                joined
            }
        };

        let mut waiter = Waiter {
            inner: &self.inner,
            key: &key,
            id,
            rx,
            subscribers,
            settled: false,
        };
        waiter.wait().await
    }

    /// Spawn the computation; the caller inserts the returned marker
    fn launch<F, Fut>(&self, key: CacheKey, ttl: Duration, compute: F) -> Flight<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let id = self.inner.next_flight.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        let inner = Arc::downgrade(&self.inner);
        let fut = compute();

        let task = tokio::spawn(async move {
            let outcome = fut.await;
            if let Some(inner) = inner.upgrade() {
                inner.settle(&key, id, ttl, &outcome);
            }
            // Waiters may all be gone; nobody to tell
            let _ = tx.send(Some(outcome));
        });

        Flight {
            id,
            rx,
            subscribers: Arc::new(Subscribers {
                count: AtomicUsize::new(1),
                task: task.abort_handle(),
            }),
        }
    }

    /// Fresh value for `key`, if any; stale entries are dropped on the way
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = self.inner.clock.now();
        if let Some(slot) = self.inner.entries.get(key) {
            if let Slot::Ready(entry) = slot.value() {
                if !entry.is_stale(now) {
                    return Some(entry.value.clone());
                }
            } else {
                return None;
            }
        }
        self.inner
            .entries
            .remove_if(key, |_, slot| matches!(slot, Slot::Ready(e) if e.is_stale(now)));
        None
    }

    /// Store a value, replacing whatever the key held
    ///
    /// An in-flight computation for the key still answers its waiters but
    /// will not overwrite this value; it is aborted once they all leave.
    pub fn set(&self, key: CacheKey, value: V, ttl: Duration) {
        let entry = CacheEntry {
            key: key.clone(),
            value,
            stored_at: self.inner.clock.now(),
            ttl,
        };
        self.inner.entries.insert(key, Slot::Ready(entry));
    }

    /// Remove the key immediately; returns whether anything was there
    ///
    /// Removing an in-flight marker does not cancel the computation (its
    /// waiters still get the result) but the result is not stored. Once
    /// the last of those waiters leaves, the computation is aborted.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self.inner.entries.remove(key).is_some();
        if removed {
            debug!("[CACHE] invalidated {}", key);
        }
        removed
    }

    /// Drop every stale entry; returns how many were evicted
    pub fn evict_expired(&self) -> usize {
        self.inner.evict_expired()
    }

    /// Run `evict_expired` every `every` until the handle is aborted
    ///
    /// The janitor only holds a weak reference and exits on its own once
    /// every clone of the cache is dropped.
    pub fn spawn_janitor(&self, every: std::time::Duration) -> JoinHandle<()> {
        let inner: Weak<Inner<V, E>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                inner.evict_expired();
            }
        })
    }

    /// Drop all stored values and in-flight markers
    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    /// Number of keys held (stored or in flight)
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

impl<V, E> Inner<V, E> {
    /// Store or discard a finished computation, if its marker is still ours
    fn settle(&self, key: &CacheKey, id: u64, ttl: Duration, outcome: &Result<V, E>)
    where
        V: Clone,
    {
        let Entry::Occupied(mut occupied) = self.entries.entry(key.clone()) else {
            return;
        };
        if !matches!(occupied.get(), Slot::Pending(f) if f.id == id) {
            return;
        }
        match outcome {
            Ok(value) => {
                debug!("[CACHE] stored {} (ttl={}s)", key, ttl.num_seconds());
                occupied.insert(Slot::Ready(CacheEntry {
                    key: key.clone(),
                    value: value.clone(),
                    stored_at: self.clock.now(),
                    ttl,
                }));
            }
            Err(_) => {
                debug!("[CACHE] computation failed for {}, nothing stored", key);
                occupied.remove();
            }
        }
    }

    fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut evicted = 0;
        self.entries.retain(|_, slot| match slot {
            Slot::Ready(entry) if entry.is_stale(now) => {
                evicted += 1;
                false
            }
            _ => true,
        });
        if evicted > 0 {
            debug!("[CACHE] evicted {} expired entries", evicted);
        }
        evicted
    }

    /// Forget a flight that ended without a result
    fn drop_flight(&self, key: &CacheKey, id: u64) {
        self.entries
            .remove_if(key, |_, slot| matches!(slot, Slot::Pending(f) if f.id == id));
    }
}

/// One subscriber to an in-flight computation
///
/// Dropping it before the result arrives unsubscribes; the last one out
/// aborts the computation.
struct Waiter<'a, V, E> {
    inner: &'a Inner<V, E>,
    key: &'a CacheKey,
    id: u64,
    rx: watch::Receiver<Outcome<V, E>>,
    subscribers: Arc<Subscribers>,
    settled: bool,
}

impl<V: Clone, E: Clone> Waiter<'_, V, E> {
    async fn wait(&mut self) -> Result<V, CacheError<E>> {
        loop {
            let current = self.rx.borrow_and_update().clone();
            if let Some(outcome) = current {
                self.settled = true;
                return outcome.map_err(CacheError::Compute);
            }
            if self.rx.changed().await.is_err() {
                // Sender gone: either it sent just before closing or the task died
                let last = self.rx.borrow().clone();
                self.settled = true;
                return match last {
                    Some(outcome) => outcome.map_err(CacheError::Compute),
                    None => {
                        self.inner.drop_flight(self.key, self.id);
                        Err(CacheError::Interrupted)
                    }
                };
            }
        }
    }
}

impl<V, E> Drop for Waiter<'_, V, E> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // Joins happen under the key's lock; leave under it too
        let entry = self.inner.entries.entry(self.key.clone());
        if self.subscribers.count.fetch_sub(1, Ordering::SeqCst) != 1 {
            return;
        }
        self.subscribers.task.abort();
        debug!("[CACHE] last waiter left {}, computation aborted", self.key);
        if let Entry::Occupied(occupied) = entry {
            if matches!(occupied.get(), Slot::Pending(f) if f.id == self.id) {
                occupied.remove();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quorum_clock::ManualClock;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    fn key(source: &str) -> CacheKey {
        CacheKey::new("AAPL", source, 1)
    }

    fn cache_with_clock() -> (Cache<u32, String>, Arc<ManualClock>) {
        let clock = ManualClock::new(Utc::now());
        (Cache::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_value_served_until_ttl_then_recomputed() {
        let (cache, clock) = cache_with_clock();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::seconds(60);

        let fetch = |calls: Arc<AtomicUsize>| {
            let cache = cache.clone();
            async move {
                cache
                    .get_or_compute(key("technical"), ttl, move || async move {
                        Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst) as u32)
                    })
                    .await
            }
        };

        assert_eq!(fetch(calls.clone()).await, Ok(0));

        clock.advance(Duration::seconds(59));
        assert_eq!(fetch(calls.clone()).await, Ok(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::seconds(2));
        assert_eq!(fetch(calls.clone()).await, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_entry_is_stale_at_exactly_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.set(key("sentiment"), 7, Duration::seconds(10));

        clock.advance(Duration::milliseconds(9_999));
        assert_eq!(cache.get(&key("sentiment")), Some(7));

        clock.advance(Duration::milliseconds(1));
        assert_eq!(cache.get(&key("sentiment")), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_computation() {
        let (cache, _clock) = cache_with_clock();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(key("order_flow"), Duration::seconds(60), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                        Ok::<_, String>(42)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&key("order_flow")), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_reaches_every_waiter_and_is_not_cached() {
        let (cache, _clock) = cache_with_clock();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(key("technical"), Duration::seconds(60), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                        Err::<u32, _>("feed down".to_string())
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(
                handle.await.unwrap(),
                Err(CacheError::Compute("feed down".to_string()))
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_empty());

        let retried = cache
            .get_or_compute(key("technical"), Duration::seconds(60), || async { Ok::<_, String>(5) })
            .await;
        assert_eq!(retried, Ok(5));
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let (cache, _clock) = cache_with_clock();
        cache.set(key("technical"), 1, Duration::seconds(60));
        assert!(cache.invalidate(&key("technical")));
        assert!(!cache.invalidate(&key("technical")));

        let value = cache
            .get_or_compute(key("technical"), Duration::seconds(60), || async { Ok::<_, String>(2) })
            .await;
        assert_eq!(value, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_waiter_leaving_aborts_computation() {
        let (cache, _clock) = cache_with_clock();
        let finished = Arc::new(AtomicBool::new(false));

        let flag = finished.clone();
        let attempt = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            cache.get_or_compute(key("sentiment"), Duration::seconds(60), move || async move {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                flag.store(true, Ordering::SeqCst);
                Ok::<_, String>(1)
            }),
        )
        .await;

        assert!(attempt.is_err());
        assert!(cache.is_empty());

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwritten_flight_aborted_when_waiters_leave() {
        let (cache, _clock) = cache_with_clock();
        let finished = Arc::new(AtomicBool::new(false));

        let waiter = {
            let cache = cache.clone();
            let flag = finished.clone();
            tokio::spawn(async move {
                tokio::time::timeout(
                    std::time::Duration::from_millis(50),
                    cache.get_or_compute(key("order_flow"), Duration::seconds(60), move || async move {
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                        flag.store(true, Ordering::SeqCst);
                        Ok::<_, String>(1)
                    }),
                )
                .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        cache.set(key("order_flow"), 7, Duration::seconds(60));

        assert!(waiter.await.unwrap().is_err());
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(!finished.load(Ordering::SeqCst));
        assert_eq!(cache.get(&key("order_flow")), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidated_flight_still_answers_waiter() {
        let (cache, _clock) = cache_with_clock();

        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute(key("technical"), Duration::seconds(60), || async {
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                        Ok::<_, String>(3)
                    })
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        assert!(cache.invalidate(&key("technical")));

        assert_eq!(waiter.await.unwrap(), Ok(3));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_impatient_waiter_does_not_cancel_others() {
        let (cache, _clock) = cache_with_clock();

        let patient = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute(key("technical"), Duration::seconds(60), || async {
                        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                        Ok::<_, String>(9)
                    })
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;

        let impatient = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            cache.get_or_compute(key("technical"), Duration::seconds(60), || async {
                Ok::<_, String>(0)
            }),
        )
        .await;
        assert!(impatient.is_err());

        assert_eq!(patient.await.unwrap(), Ok(9));
        assert_eq!(cache.get(&key("technical")), Some(9));
    }

    #[tokio::test]
    async fn test_evict_expired_only_drops_stale() {
        let (cache, clock) = cache_with_clock();
        cache.set(key("a"), 1, Duration::seconds(10));
        cache.set(key("b"), 2, Duration::seconds(100));

        clock.advance(Duration::seconds(30));
        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("b")), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_janitor_purges_in_background() {
        let (cache, clock) = cache_with_clock();
        cache.set(key("a"), 1, Duration::seconds(5));
        let janitor = cache.spawn_janitor(std::time::Duration::from_secs(1));

        clock.advance(Duration::seconds(6));
        tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;
        assert!(cache.is_empty());

        janitor.abort();
        cache.clear();
    }
}
