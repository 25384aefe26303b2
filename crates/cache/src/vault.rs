//! Single-flight, memoizing resource cache
//!
//! Entries are keyed by canonical URI and resource kind. A miss stores a
//! shared pending fetch before any network I/O starts, so concurrent callers
//! for the same key join one request. The fetch future does its own
//! bookkeeping when it settles: success replaces the pending slot with the
//! value, failure evicts it and dispatches `tpen-vault-error`. A slot that was
//! replaced or evicted in the meantime is left alone.

use crate::errors::VaultError;
use crate::fetcher::{HttpFetcher, ResourceFetcher};
use crate::keys::{canonicalize, CacheKey, ResourceKind};
use crate::prefetch::embedded_resources;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tpen_config::VaultSettings;
use tpen_core::constants::EVENT_VAULT_ERROR;
use tpen_core::events::ResourceFailure;
use tpen_core::EventDispatcher;
use tpen_utils::tracing::vault_span;
use tracing::{debug, info, warn, Instrument};

type PendingFetch = Shared<BoxFuture<'static, Option<Arc<Value>>>>;

enum Slot {
    Pending { generation: u64, fetch: PendingFetch },
    Ready(Arc<Value>),
}

enum Lookup {
    Ready(Arc<Value>),
    Joined(PendingFetch),
    Started(PendingFetch),
}

/// Counters since the vault was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VaultStats {
    /// Lookups answered from a resolved entry
    pub hits: u64,
    /// Lookups that started a fetch
    pub misses: u64,
    /// Lookups that joined a fetch already in flight
    pub joined: u64,
    /// Network requests issued
    pub fetches: u64,
    pub failures: u64,
    /// Entries stored from manifest walks
    pub prefetched: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    joined: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
    prefetched: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> VaultStats {
        VaultStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            joined: self.joined.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            prefetched: self.prefetched.load(Ordering::Relaxed),
        }
    }
}

struct Inner {
    entries: DashMap<CacheKey, Slot>,
    /// child URI -> manifest URI expected to embed it
    hints: DashMap<String, String>,
    fetcher: Arc<dyn ResourceFetcher>,
    dispatcher: Arc<EventDispatcher>,
    prefetch_limit: usize,
    generation: AtomicU64,
    counters: Counters,
}

/// Resource cache ("vault") for IIIF JSON documents. Cheap to clone.
#[derive(Clone)]
pub struct Vault {
    inner: Arc<Inner>,
}

impl Vault {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                hints: DashMap::new(),
                fetcher,
                dispatcher,
                prefetch_limit: VaultSettings::default().prefetch_limit,
                generation: AtomicU64::new(0),
                counters: Counters::default(),
            }),
        }
    }

    /// A vault fetching over HTTP with the configured timeout and walk bound
    pub fn from_settings(settings: &VaultSettings, dispatcher: Arc<EventDispatcher>) -> Result<Self, VaultError> {
        let fetcher = HttpFetcher::new(settings.request_timeout())?;
        Ok(Self::new(Arc::new(fetcher), dispatcher).with_prefetch_limit(settings.prefetch_limit))
    }

    /// Bound on JSON nodes visited per manifest walk. Must be set before the
    /// vault is cloned.
    pub fn with_prefetch_limit(mut self, limit: usize) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.prefetch_limit = limit;
        } else {
            warn!("Vault already shared, prefetch limit unchanged");
        }
        self
    }

    /// Resolve `uri` as `kind`.
    ///
    /// Resolved entries are returned directly unless `force_refresh` is set.
    /// A pending entry is always joined, so at most one request per key is in
    /// flight. Otherwise one fetch is started and stored before it runs.
    /// Failures resolve to `None` and are reported as a
    /// `tpen-vault-error` event tagged with `requester`.
    pub async fn get(
        &self,
        uri: &str,
        kind: impl Into<ResourceKind>,
        force_refresh: bool,
        requester: Option<&str>,
    ) -> Option<Arc<Value>> {
        let key = CacheKey::new(uri, kind.into());
        let span = vault_span(&key.uri, key.kind.as_str());
        self.resolve(key, force_refresh, requester.map(str::to_string))
            .instrument(span)
            .await
    }

    async fn resolve(&self, key: CacheKey, force_refresh: bool, requester: Option<String>) -> Option<Arc<Value>> {
        if !force_refresh && !self.inner.entries.contains_key(&key) {
            if let Some(manifest) = self.manifest_hint(&key) {
                debug!(manifest = %manifest, "Resolving hinted manifest first");
                let manifest_key = CacheKey {
                    uri: manifest,
                    kind: ResourceKind::Manifest,
                };
                match self.lookup(manifest_key, false, requester.clone()) {
                    Lookup::Ready(_) => {}
                    Lookup::Joined(fetch) | Lookup::Started(fetch) => {
                        fetch.await;
                    }
                }
            }
        }

        match self.lookup(key, force_refresh, requester) {
            Lookup::Ready(value) => {
                Counters::bump(&self.inner.counters.hits);
                Some(value)
            }
            Lookup::Joined(fetch) => {
                Counters::bump(&self.inner.counters.joined);
                fetch.await
            }
            Lookup::Started(fetch) => {
                Counters::bump(&self.inner.counters.misses);
                fetch.await
            }
        }
    }

    fn manifest_hint(&self, key: &CacheKey) -> Option<String> {
        if key.kind == ResourceKind::Manifest {
            return None;
        }
        self.inner.hints.get(&key.uri).map(|m| m.value().clone())
    }

    /// Find or create the slot for `key`. The shard lock is held only while
    /// deciding, never across an await.
    fn lookup(&self, key: CacheKey, force_refresh: bool, requester: Option<String>) -> Lookup {
        match self.inner.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                match occupied.get() {
                    // A fetch in flight is joined even on a forced refresh
                    Slot::Pending { fetch, .. } => return Lookup::Joined(fetch.clone()),
                    Slot::Ready(value) if !force_refresh => return Lookup::Ready(Arc::clone(value)),
                    Slot::Ready(_) => {}
                }
                let (generation, fetch) = self.start_fetch(key, requester);
                occupied.insert(Slot::Pending {
                    generation,
                    fetch: fetch.clone(),
                });
                Lookup::Started(fetch)
            }
            Entry::Vacant(vacant) => {
                let (generation, fetch) = self.start_fetch(key, requester);
                vacant.insert(Slot::Pending {
                    generation,
                    fetch: fetch.clone(),
                });
                Lookup::Started(fetch)
            }
        }
    }

    /// Build the shared fetch for `key`. Nothing runs until it is polled.
    fn start_fetch(&self, key: CacheKey, requester: Option<String>) -> (u64, PendingFetch) {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let inner = Arc::clone(&self.inner);
        let fetch = async move {
            Counters::bump(&inner.counters.fetches);
            let result = inner.fetcher.fetch(&key.uri).await;
            inner.settle(key, generation, requester, result)
        }
        .boxed()
        .shared();
        (generation, fetch)
    }

    /// Record that `child_uri` is expected to be embedded in `manifest_uri`
    pub fn register_manifest_hint(&self, child_uri: &str, manifest_uri: &str) {
        let child = canonicalize(child_uri);
        let manifest = canonicalize(manifest_uri);
        debug!(child = %child, manifest = %manifest, "Manifest hint registered");
        self.inner.hints.insert(child, manifest);
    }

    /// Store `value` as the resolved entry for `uri`/`kind`
    pub fn insert(&self, uri: &str, kind: impl Into<ResourceKind>, value: Value) -> Arc<Value> {
        let value = Arc::new(value);
        self.inner
            .entries
            .insert(CacheKey::new(uri, kind.into()), Slot::Ready(Arc::clone(&value)));
        value
    }

    /// The resolved entry, without fetching or joining
    pub fn peek(&self, uri: &str, kind: impl Into<ResourceKind>) -> Option<Arc<Value>> {
        let key = CacheKey::new(uri, kind.into());
        match self.inner.entries.get(&key)?.value() {
            Slot::Ready(value) => Some(Arc::clone(value)),
            Slot::Pending { .. } => None,
        }
    }

    /// Whether a fetch for `uri`/`kind` is in flight
    pub fn is_pending(&self, uri: &str, kind: impl Into<ResourceKind>) -> bool {
        let key = CacheKey::new(uri, kind.into());
        self.inner
            .entries
            .get(&key)
            .is_some_and(|slot| matches!(slot.value(), Slot::Pending { .. }))
    }

    /// Drop the entry for `uri`/`kind`. Callers awaiting a pending fetch
    /// still receive its result.
    pub fn evict(&self, uri: &str, kind: impl Into<ResourceKind>) -> bool {
        self.inner
            .entries
            .remove(&CacheKey::new(uri, kind.into()))
            .is_some()
    }

    pub fn clear(&self) {
        self.inner.entries.clear();
        info!("Vault cleared");
    }

    /// Number of entries, pending ones included
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn stats(&self) -> VaultStats {
        self.inner.counters.snapshot()
    }
}

impl Inner {
    fn settle(
        &self,
        key: CacheKey,
        generation: u64,
        requester: Option<String>,
        result: Result<Value, VaultError>,
    ) -> Option<Arc<Value>> {
        match result {
            Ok(value) => {
                if let Some(declared) = ResourceKind::declared_by(&value) {
                    if declared != key.kind {
                        warn!(declared = %declared, "Resource declares a different kind than requested");
                    }
                }
                let value = Arc::new(value);
                if let Some(mut slot) = self.entries.get_mut(&key) {
                    if matches!(*slot, Slot::Pending { generation: g, .. } if g == generation) {
                        *slot = Slot::Ready(Arc::clone(&value));
                    }
                }
                debug!("Resource cached");
                if key.kind == ResourceKind::Manifest {
                    self.prefetch_from(&value);
                }
                Some(value)
            }
            Err(error) => {
                self.entries.remove_if(&key, |_, slot| {
                    matches!(slot, Slot::Pending { generation: g, .. } if *g == generation)
                });
                Counters::bump(&self.counters.failures);
                warn!(error = %error, requester = ?requester, "Resource unavailable");
                self.dispatcher.dispatch(
                    EVENT_VAULT_ERROR,
                    ResourceFailure {
                        uri: key.uri,
                        kind: key.kind.to_string(),
                        requester,
                        reason: error.to_string(),
                    },
                );
                None
            }
        }
    }

    /// Store resources embedded in `manifest` that have no entry yet
    fn prefetch_from(&self, manifest: &Value) {
        let mut stored = 0u64;
        for resource in embedded_resources(manifest, self.prefetch_limit) {
            let key = CacheKey {
                uri: resource.uri,
                kind: resource.kind,
            };
            if let Entry::Vacant(vacant) = self.entries.entry(key) {
                vacant.insert(Slot::Ready(Arc::new(resource.value)));
                stored += 1;
            }
        }
        if stored > 0 {
            self.counters.prefetched.fetch_add(stored, Ordering::Relaxed);
            debug!(stored, "Prefetched embedded resources");
        }
    }
}
