//! Read-through TTL cache in front of the upstream directory.
//!
//! A [`RefreshCache`] holds one value (the whole roster, or the recent-activity list) together
//! with the instant it was fetched. Reads inside the TTL are served from memory; the first read
//! after expiry or [`RefreshCache::invalidate`] triggers one upstream fetch.
//!
//! Concurrency rules:
//! - Concurrent misses coalesce onto a single spawned fetch (single-flight).
//! - The fetch runs on its own task, so a caller that gives up does not cancel it; the result
//!   still lands in the cache for whoever asks next.
//! - Each fetch is bounded by `fetch_timeout`; expiry counts as a [`FetchError::Timeout`].
//! - Failures are never cached and leave the previous value untouched. The next read retries.
//! - Value and timestamp are swapped together under one write lock. No lock is held across
//!   an await point.
//! - `invalidate()` bumps a generation counter. A fetch that started before the bump may still
//!   store its value, but that value is never considered fresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::directory::{Activity, DirectoryClient, Member};
use crate::error::FetchError;

/// Default roster TTL (5 minutes).
pub const DEFAULT_ROSTER_TTL: Duration = Duration::from_secs(300);

/// Default TTL of the derived "last seen" projection.
pub const DEFAULT_ACTIVITY_TTL: Duration = Duration::from_secs(120);

/// Default upper bound on a single upstream fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Produces a fresh value from upstream. Called at most once per cache miss.
pub type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, FetchError>> + Send + Sync>;

type SharedFetch<T> = Shared<BoxFuture<'static, Result<Arc<T>, FetchError>>>;

pub type RosterCache = RefreshCache<Vec<Member>>;
pub type ActivityCache = RefreshCache<Vec<Activity>>;

struct Snapshot<T> {
    value: Option<Arc<T>>,
    fetched_at: Option<Instant>,
    generation: u64,
}

struct InFlight<T> {
    generation: u64,
    fetch: SharedFetch<T>,
}

struct Inner<T> {
    name: &'static str,
    ttl: Duration,
    fetch_timeout: Duration,
    loader: Loader<T>,
    snapshot: RwLock<Snapshot<T>>,
    in_flight: Mutex<Option<InFlight<T>>>,
    generation: AtomicU64,
    fetches: AtomicU64,
}

pub struct RefreshCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RefreshCache<T> {
    fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<T: Send + Sync + 'static> RefreshCache<T> {
    /// Creates an empty cache. Nothing is fetched until the first [`get`](Self::get).
    pub fn new(name: &'static str, ttl: Duration, fetch_timeout: Duration, loader: Loader<T>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                ttl,
                fetch_timeout,
                loader,
                snapshot: RwLock::new(Snapshot { value: None, fetched_at: None, generation: 0 }),
                in_flight: Mutex::new(None),
                generation: AtomicU64::new(0),
                fetches: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the cached value while it is younger than the TTL, otherwise fetches.
    ///
    /// # Errors
    ///
    /// Propagates the upstream [`FetchError`] unchanged. No retry is attempted here.
    pub async fn get(&self) -> Result<Arc<T>, FetchError> {
        let generation = self.inner.generation.load(Ordering::Acquire);
        if let Some(v) = self.inner.fresh(generation) {
            debug!(target: "rollcall::cache", cache = self.inner.name, "hit");
            return Ok(v);
        }

        let fetch = {
            let mut slot = self.inner.in_flight.lock();
            // A fetch may have published between the first check and taking the lock.
            if let Some(v) = self.inner.fresh(generation) {
                return Ok(v);
            }
            match slot.as_ref() {
                Some(f) if f.generation == generation && f.fetch.peek().is_none() => {
                    debug!(target: "rollcall::cache", cache = self.inner.name, "miss, joining in-flight fetch");
                    f.fetch.clone()
                }
                _ => {
                    debug!(target: "rollcall::cache", cache = self.inner.name, generation, "miss, starting fetch");
                    let fetch = Inner::start_fetch(&self.inner, generation);
                    *slot = Some(InFlight { generation, fetch: fetch.clone() });
                    fetch
                }
            }
        };
        fetch.await
    }

    /// Forces the next [`get`](Self::get) to go upstream regardless of age.
    pub fn invalidate(&self) {
        let g = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(target: "rollcall::cache", cache = self.inner.name, generation = g, "invalidated");
    }

    /// Last successfully fetched value, fresh or not. Never touches upstream.
    pub fn peek(&self) -> Option<Arc<T>> {
        self.inner.snapshot.read().value.clone()
    }

    /// Time since the last successful fetch.
    pub fn age(&self) -> Option<Duration> {
        self.inner.snapshot.read().fetched_at.map(|t| t.elapsed())
    }

    /// Number of upstream fetches started over the cache's lifetime.
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetches.load(Ordering::Relaxed)
    }

    pub fn ttl(&self) -> Duration { self.inner.ttl }

    pub fn name(&self) -> &'static str { self.inner.name }
}

impl<T: Send + Sync + 'static> Inner<T> {
    fn fresh(&self, generation: u64) -> Option<Arc<T>> {
        let snap = self.snapshot.read();
        match (&snap.value, snap.fetched_at) {
            (Some(v), Some(at)) if snap.generation == generation && at.elapsed() < self.ttl => Some(Arc::clone(v)),
            _ => None,
        }
    }

    fn start_fetch(inner: &Arc<Self>, generation: u64) -> SharedFetch<T> {
        inner.fetches.fetch_add(1, Ordering::Relaxed);
        let task = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(task.fetch_timeout, (task.loader)()).await {
                Ok(r) => r,
                Err(_) => Err(FetchError::Timeout(task.fetch_timeout)),
            };
            let result = match outcome {
                Ok(value) => {
                    let value = Arc::new(value);
                    task.publish(generation, Arc::clone(&value));
                    info!(target: "rollcall::cache", cache = task.name, elapsed_ms = started.elapsed().as_millis() as u64, "refreshed");
                    Ok(value)
                }
                Err(e) => {
                    warn!(target: "rollcall::cache", cache = task.name, kind = e.kind(), "refresh failed: {}", e);
                    Err(e)
                }
            };
            task.finish(generation);
            result
        });
        async move {
            match handle.await {
                Ok(r) => r,
                Err(e) => Err(FetchError::Aborted(e.to_string())),
            }
        }
        .boxed()
        .shared()
    }

    fn publish(&self, generation: u64, value: Arc<T>) {
        let mut snap = self.snapshot.write();
        if snap.value.is_some() && snap.generation > generation {
            // A fetch started after ours already landed.
            return;
        }
        *snap = Snapshot { value: Some(value), fetched_at: Some(Instant::now()), generation };
    }

    fn finish(&self, generation: u64) {
        let mut slot = self.in_flight.lock();
        if matches!(slot.as_ref(), Some(f) if f.generation == generation) {
            *slot = None;
        }
    }
}

/// Roster cache over [`DirectoryClient::fetch_roster`].
///
/// An empty member list is treated as a failed fetch: it is never stored, so the next read
/// goes upstream again instead of serving "no members" for a whole TTL.
pub fn roster_cache(directory: Arc<dyn DirectoryClient>, ttl: Duration, fetch_timeout: Duration) -> RosterCache {
    let loader: Loader<Vec<Member>> = Arc::new(move || {
        let d = Arc::clone(&directory);
        async move {
            match d.fetch_roster().await {
                Ok(members) if members.is_empty() => Err(FetchError::Malformed("empty roster".into())),
                other => other,
            }
        }
        .boxed()
    });
    RefreshCache::new("roster", ttl, fetch_timeout, loader)
}

/// Recent-activity cache over [`DirectoryClient::fetch_recent_activity`].
pub fn activity_cache(directory: Arc<dyn DirectoryClient>, ttl: Duration, fetch_timeout: Duration) -> ActivityCache {
    let loader: Loader<Vec<Activity>> = Arc::new(move || {
        let d = Arc::clone(&directory);
        async move { d.fetch_recent_activity().await }.boxed()
    });
    RefreshCache::new("activity", ttl, fetch_timeout, loader)
}
