//! Query cache shared by every data-access call.
//!
//! Entries are keyed by [`QueryKey`]. A fetch returns the cached value while it is fresh, joins the
//! request already in flight for the same key, or starts a new one. Invalidation marks entries
//! stale and refetches the ones that are currently observed.

use futures_util::{
    FutureExt, TryFutureExt,
    future::{BoxFuture, Shared},
};
use plaza_common::model::{Id, post::PostMarker, user::UserMarker};
use plaza_remote::platform::RemoteError;
use std::{
    any::Any,
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::{runtime::Handle, sync::watch, time::Instant};
use tracing::{debug, warn};

pub const POSTS_STALE_TIME: Duration = Duration::from_secs(5 * 60);
/// How long an unobserved entry is kept after its last fetch.
pub const GC_TIME: Duration = Duration::from_secs(5 * 60);

type AnyValue = Arc<dyn Any + Send + Sync>;
type AnyResult = Result<AnyValue, RemoteError>;
type SharedFetch = Shared<BoxFuture<'static, AnyResult>>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, AnyResult> + Send + Sync>;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum QueryKind {
    Posts,
    UserPosts,
    Post,
    Comments,
    UserProfile,
    Liked,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum QueryKey {
    Posts { page: u32 },
    UserPosts { user: Id<UserMarker> },
    Post { post: Id<PostMarker> },
    Comments { post: Id<PostMarker> },
    UserProfile { user: Id<UserMarker> },
    Liked { post: Id<PostMarker>, user: Id<UserMarker> },
}

impl QueryKey {
    #[must_use]
    pub fn kind(&self) -> QueryKind {
        match self {
            QueryKey::Posts { .. } => QueryKind::Posts,
            QueryKey::UserPosts { .. } => QueryKind::UserPosts,
            QueryKey::Post { .. } => QueryKind::Post,
            QueryKey::Comments { .. } => QueryKind::Comments,
            QueryKey::UserProfile { .. } => QueryKind::UserProfile,
            QueryKey::Liked { .. } => QueryKind::Liked,
        }
    }

    /// How long a fetched value is served without asking the platform again.
    #[must_use]
    pub fn stale_time(&self) -> Duration {
        match self {
            QueryKey::Posts { .. } => POSTS_STALE_TIME,
            _ => Duration::ZERO,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum QueryFilter {
    Kind(QueryKind),
    Exact(QueryKey),
}

impl QueryFilter {
    #[must_use]
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            QueryFilter::Kind(kind) => key.kind() == *kind,
            QueryFilter::Exact(exact) => exact == key,
        }
    }
}

struct Cached {
    value: AnyValue,
    fetched_at: Instant,
    epoch: u64,
}

struct Entry {
    cached: Option<Cached>,
    /// Bumped by every invalidation. Values fetched under an older epoch are stale.
    epoch: u64,
    in_flight: Option<(u64, SharedFetch)>,
    fetcher: Option<Fetcher>,
    observers: watch::Sender<u64>,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            cached: None,
            epoch: 0,
            in_flight: None,
            fetcher: None,
            observers: watch::channel(0).0,
        }
    }
}

impl Entry {
    fn fresh_value(&self, stale_time: Duration) -> Option<&AnyValue> {
        self.cached
            .as_ref()
            .filter(|cached| cached.epoch == self.epoch && cached.fetched_at.elapsed() < stale_time)
            .map(|cached| &cached.value)
    }

    /// Nobody shows the entry, nothing is loading it and its value outlived [`GC_TIME`].
    fn is_garbage(&self) -> bool {
        self.observers.receiver_count() == 0
            && self.in_flight.is_none()
            && self
                .cached
                .as_ref()
                .is_none_or(|cached| cached.fetched_at.elapsed() >= GC_TIME)
    }

    fn current_fetch(&self) -> Option<&SharedFetch> {
        self.in_flight
            .as_ref()
            .filter(|(epoch, _)| *epoch == self.epoch)
            .map(|(_, fetch)| fetch)
    }
}

type Entries = Mutex<HashMap<QueryKey, Entry>>;

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

fn collect_garbage(entries: &mut HashMap<QueryKey, Entry>) {
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_garbage());

    let evicted = before - entries.len();
    if evicted > 0 {
        debug!(evicted, "Evicted unused queries");
    }
}

/// Stores the outcome of the fetch started under `epoch`, unless the entry moved on since.
fn settle(entries: &Entries, key: &QueryKey, epoch: u64, result: &AnyResult) {
    let mut entries = lock(entries);
    let Some(entry) = entries.get_mut(key) else {
        return;
    };

    if entry
        .in_flight
        .as_ref()
        .is_some_and(|(in_flight, _)| *in_flight == epoch)
    {
        entry.in_flight = None;
    }

    if epoch != entry.epoch {
        debug!(?key, "Discarding result of superseded fetch");
        return;
    }

    if let Ok(value) = result {
        entry.cached = Some(Cached {
            value: Arc::clone(value),
            fetched_at: Instant::now(),
            epoch,
        });
        entry.observers.send_modify(|version| *version += 1);
    }
}

fn downcast<T>(key: &QueryKey, value: AnyValue) -> Result<Arc<T>, RemoteError>
where
    T: Send + Sync + 'static,
{
    value.downcast::<T>().map_err(|_| {
        RemoteError::Decode(format!("Cached value for {key:?} has an unexpected type"))
    })
}

#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<Entries>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &lock(&self.entries).len())
            .finish()
    }
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&self, key: QueryKey, entry: &mut Entry, fetcher: &Fetcher) -> SharedFetch {
        let epoch = entry.epoch;
        let entries: Weak<Entries> = Arc::downgrade(&self.entries);
        let fetch = fetcher();

        let shared = async move {
            let result = fetch.await;
            if let Some(entries) = entries.upgrade() {
                settle(&entries, &key, epoch, &result);
            }
            result
        }
        .boxed()
        .shared();

        entry.in_flight = Some((epoch, shared.clone()));
        shared
    }

    /// Returns the value for `key`, fetching it with `fetch` unless a fresh one is cached.
    ///
    /// Concurrent calls for the same key share one request. `fetch` is also remembered to refetch
    /// the key in the background after an invalidation while it is observed.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>, RemoteError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        let fetcher: Fetcher = Arc::new(move || {
            fetch()
                .map_ok(|value| Arc::new(value) as AnyValue)
                .boxed()
        });

        let shared = {
            let mut entries = lock(&self.entries);
            collect_garbage(&mut entries);
            let entry = entries.entry(key).or_default();
            entry.fetcher = Some(Arc::clone(&fetcher));

            if let Some(value) = entry.fresh_value(key.stale_time()) {
                debug!(?key, "Query cache hit");
                return downcast(&key, Arc::clone(value));
            }

            if let Some(in_flight) = entry.current_fetch() {
                debug!(?key, "Joining in-flight query");
                in_flight.clone()
            } else {
                debug!(?key, "Query cache miss");
                self.start(key, entry, &fetcher)
            }
        };

        downcast(&key, shared.await?)
    }

    /// The last value fetched for `key`, fresh or not.
    #[must_use]
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let entries = lock(&self.entries);
        let value = Arc::clone(&entries.get(key)?.cached.as_ref()?.value);
        value.downcast().ok()
    }

    /// Marks every matching entry stale and refetches the observed ones in the background.
    pub fn invalidate(&self, filter: &QueryFilter) {
        let mut refetches = Vec::new();
        {
            let mut entries = lock(&self.entries);
            for (key, entry) in entries.iter_mut().filter(|(key, _)| filter.matches(key)) {
                entry.epoch += 1;
                entry.in_flight = None;

                if entry.observers.receiver_count() > 0
                    && let Some(fetcher) = entry.fetcher.clone()
                {
                    refetches.push(self.start(*key, entry, &fetcher));
                }
            }
        }

        debug!(?filter, refetches = refetches.len(), "Invalidated queries");
        if refetches.is_empty() {
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                for refetch in refetches {
                    handle.spawn(async move {
                        if let Err(err) = refetch.await {
                            warn!(%err, "Background refetch failed");
                        }
                    });
                }
            }
            Err(_) => warn!("No runtime to refetch invalidated queries on"),
        }
    }

    /// Runs a remote write and invalidates `dependents` once it succeeded.
    pub async fn mutate<T, E, Fut>(&self, mutation: Fut, dependents: &[QueryFilter]) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let value = mutation.await?;
        for dependent in dependents {
            self.invalidate(dependent);
        }

        Ok(value)
    }

    /// Marks `key` as displayed so invalidations refetch it.
    #[must_use]
    pub fn observe(&self, key: QueryKey) -> QueryObserver {
        let mut entries = lock(&self.entries);
        let receiver = entries.entry(key).or_default().observers.subscribe();

        QueryObserver { key, receiver }
    }
}

/// A displayed query. Dropping it stops background refetches for the key.
#[derive(Clone, Debug)]
pub struct QueryObserver {
    key: QueryKey,
    receiver: watch::Receiver<u64>,
}

impl QueryObserver {
    #[must_use]
    pub fn key(&self) -> QueryKey {
        self.key
    }

    /// Waits until a new value for the key was stored.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Treats every value stored so far as seen.
    pub fn mark_seen(&mut self) {
        self.receiver.mark_unchanged();
    }
}
