//! Memoized query results.
//!
//! Entries are keyed by query signature and result item type and live until
//! evicted: there is no expiry and no size bound.

use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use stowage_db::ResultSet;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::error::StowageResult;

type Slot<E> = OnceCell<Arc<ResultSet<E>>>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    signature: String,
    item_type: TypeId,
}

struct CacheEntry {
    /// A `Slot<E>` for the key's item type.
    slot: Arc<dyn Any + Send + Sync>,
    item_name: &'static str,
    loaded: fn(&(dyn Any + Send + Sync)) -> bool,
}

fn slot_loaded<E: Send + Sync + 'static>(slot: &(dyn Any + Send + Sync)) -> bool {
    slot.downcast_ref::<Slot<E>>()
        .is_some_and(|cell| cell.initialized())
}

/// Signature-keyed store of query results.
///
/// With in-flight deduplication, concurrent misses on one signature share a
/// single load. Without it, every concurrent miss runs its own loader and the
/// last one to finish is what stays cached. A load that overlaps an eviction
/// is returned to its caller but not stored.
pub struct ResultCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    /// Bumped under the entries lock on every eviction.
    evictions: AtomicU64,
    dedupe_in_flight: bool,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ResultCache {
    pub fn new(dedupe_in_flight: bool) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            evictions: AtomicU64::new(0),
            dedupe_in_flight,
        }
    }

    pub fn dedupe_in_flight(&self) -> bool {
        self.dedupe_in_flight
    }

    /// Returns the cached result for `signature`, or runs `loader` and caches
    /// what it returns. Failures are passed through and never cached.
    pub async fn fetch<E, F, Fut>(&self, signature: &str, loader: F) -> StowageResult<Arc<ResultSet<E>>>
    where
        E: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StowageResult<Arc<ResultSet<E>>>>,
    {
        if let Some(hit) = self.lookup::<E>(signature)? {
            debug!(signature, "cache hit");
            return Ok(hit);
        }

        if !self.dedupe_in_flight {
            debug!(signature, "cache miss");
            let started = self.evictions.load(Ordering::Acquire);
            let result = loader().await?;
            self.store(signature, result.clone(), started)?;
            return Ok(result);
        }

        let slot = self.slot::<E>(signature)?;
        let loaded = slot
            .get_or_try_init(|| async {
                debug!(signature, "cache miss");
                loader().await
            })
            .await;

        match loaded {
            Ok(result) => Ok(result.clone()),
            Err(err) => {
                self.discard::<E>(signature, &slot)?;
                Err(err)
            }
        }
    }

    /// Number of cached results. Loads still in flight are not counted.
    pub fn len(&self) -> usize {
        self.lock()
            .map(|entries| entries.values().filter(|e| (e.loaded)(e.slot.as_ref())).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a result of any item type is cached for `signature`.
    pub fn contains(&self, signature: &str) -> bool {
        self.lock()
            .map(|entries| {
                entries
                    .iter()
                    .any(|(k, e)| k.signature == signature && (e.loaded)(e.slot.as_ref()))
            })
            .unwrap_or(false)
    }

    /// Evicts every result stored under `signature`.
    pub fn invalidate(&self, signature: &str) -> StowageResult<usize> {
        let mut entries = self.lock()?;
        self.evictions.fetch_add(1, Ordering::AcqRel);
        let before = entries.len();
        entries.retain(|k, _| k.signature != signature);
        Ok(before - entries.len())
    }

    /// Evicts every result whose items are of type `E`.
    pub fn invalidate_type<E: 'static>(&self) -> StowageResult<usize> {
        let item_type = TypeId::of::<E>();
        let mut entries = self.lock()?;
        self.evictions.fetch_add(1, Ordering::AcqRel);
        let before = entries.len();
        entries.retain(|k, e| {
            let evict = k.item_type == item_type;
            if evict {
                trace!(signature = %k.signature, item = e.item_name, "evicting");
            }
            !evict
        });
        Ok(before - entries.len())
    }

    pub fn clear(&self) -> StowageResult<()> {
        let mut entries = self.lock()?;
        self.evictions.fetch_add(1, Ordering::AcqRel);
        entries.clear();
        Ok(())
    }

    fn lock(&self) -> StowageResult<MutexGuard<'_, HashMap<CacheKey, CacheEntry>>> {
        Ok(self.entries.lock()?)
    }

    fn key<E: 'static>(signature: &str) -> CacheKey {
        CacheKey {
            signature: signature.to_string(),
            item_type: TypeId::of::<E>(),
        }
    }

    fn entry<E: Send + Sync + 'static>(slot: Arc<Slot<E>>) -> CacheEntry {
        CacheEntry {
            slot,
            item_name: type_name::<E>(),
            loaded: slot_loaded::<E>,
        }
    }

    fn lookup<E: Send + Sync + 'static>(
        &self,
        signature: &str,
    ) -> StowageResult<Option<Arc<ResultSet<E>>>> {
        let entries = self.lock()?;
        Ok(entries
            .get(&Self::key::<E>(signature))
            .and_then(|e| e.slot.downcast_ref::<Slot<E>>())
            .and_then(|slot| slot.get().cloned()))
    }

    /// The slot for `(signature, E)`, created empty if absent.
    fn slot<E: Send + Sync + 'static>(&self, signature: &str) -> StowageResult<Arc<Slot<E>>> {
        let key = Self::key::<E>(signature);
        let mut entries = self.lock()?;

        if let Some(slot) = entries
            .get(&key)
            .and_then(|e| e.slot.clone().downcast::<Slot<E>>().ok())
        {
            return Ok(slot);
        }

        let slot = Arc::new(Slot::<E>::new());
        entries.insert(key, Self::entry(slot.clone()));
        Ok(slot)
    }

    /// Stores `result` unless an eviction happened after `started`.
    fn store<E: Send + Sync + 'static>(
        &self,
        signature: &str,
        result: Arc<ResultSet<E>>,
        started: u64,
    ) -> StowageResult<()> {
        let mut entries = self.lock()?;
        if self.evictions.load(Ordering::Acquire) != started {
            debug!(signature, "evicted during load, not storing");
            return Ok(());
        }
        let slot = Arc::new(Slot::<E>::new_with(Some(result)));
        entries.insert(Self::key::<E>(signature), Self::entry(slot));
        Ok(())
    }

    /// Drops `slot` after a failed load, unless it has since been replaced
    /// or filled by another caller.
    fn discard<E: Send + Sync + 'static>(
        &self,
        signature: &str,
        slot: &Arc<Slot<E>>,
    ) -> StowageResult<()> {
        let key = Self::key::<E>(signature);
        let mut entries = self.lock()?;

        let stale = entries.get(&key).is_some_and(|e| {
            std::ptr::addr_eq(Arc::as_ptr(&e.slot), Arc::as_ptr(slot)) && !slot.initialized()
        });
        if stale {
            entries.remove(&key);
        }
        Ok(())
    }
}
