//! The repository contract and its caching layer.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use stowage_db::{Resource, ResultSet};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    cache::ResultCache,
    error::{StowageError, StowageResult},
    query::Query,
};

/// Something that stores resources and answers queries.
///
/// Repositories chain: a caching layer wraps a terminal store, and a remote
/// transport would wrap or replace the terminal store the same way.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn save<E: Resource>(&self, resource: E) -> StowageResult<()>;

    async fn fetch<Q: Query>(&self, query: Q) -> StowageResult<Arc<ResultSet<Q::Item>>>;
}

/// The caller-facing layer: memoizes fetches by query signature and bounds
/// every operation by an optional timeout.
pub struct CachedRepository<R> {
    inner: R,
    cache: ResultCache,
    timeout: Option<Duration>,
    invalidate_on_save: bool,
}

impl<R: Repository> CachedRepository<R> {
    /// Wraps `inner` with deduplicating cache, no timeout and no eviction on
    /// save.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: ResultCache::new(true),
            timeout: None,
            invalidate_on_save: false,
        }
    }

    pub fn with_dedupe(mut self, dedupe_in_flight: bool) -> Self {
        self.cache = ResultCache::new(dedupe_in_flight);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// When enabled, saving an `E` evicts every cached result holding `E`s.
    /// When disabled, cached results may be stale after a save.
    pub fn with_invalidate_on_save(mut self, invalidate_on_save: bool) -> Self {
        self.invalidate_on_save = invalidate_on_save;
        self
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Like [`Repository::fetch`], but gives up as soon as `token` is
    /// cancelled. A cancelled fetch caches nothing.
    pub async fn fetch_with_cancel<Q: Query>(
        &self,
        query: Q,
        token: &CancellationToken,
    ) -> StowageResult<Arc<ResultSet<Q::Item>>> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(StowageError::Cancelled {
                operation: "fetch".into(),
            }),
            result = self.fetch(query) => result,
        }
    }

    /// Like [`Repository::save`], but gives up as soon as `token` is
    /// cancelled. Work already handed to the store may still complete.
    pub async fn save_with_cancel<E: Resource>(
        &self,
        resource: E,
        token: &CancellationToken,
    ) -> StowageResult<()> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(StowageError::Cancelled {
                operation: "save".into(),
            }),
            result = self.save(resource) => result,
        }
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> StowageResult<T>
    where
        F: Future<Output = StowageResult<T>>,
    {
        match self.timeout {
            Some(after) => tokio::time::timeout(after, fut).await.map_err(|_| {
                StowageError::Timeout {
                    operation: operation.to_string(),
                    after,
                }
            })?,
            None => fut.await,
        }
    }
}

#[async_trait]
impl<R: Repository> Repository for CachedRepository<R> {
    async fn save<E: Resource>(&self, resource: E) -> StowageResult<()> {
        self.bounded("save", self.inner.save(resource)).await?;

        if self.invalidate_on_save {
            let evicted = self.cache.invalidate_type::<E>()?;
            debug!(evicted, "invalidated cached results after save");
        }
        Ok(())
    }

    async fn fetch<Q: Query>(&self, query: Q) -> StowageResult<Arc<ResultSet<Q::Item>>> {
        let signature = query.signature();
        let inner = &self.inner;

        self.bounded(
            "fetch",
            self.cache
                .fetch(&signature, move || async move { inner.fetch(query).await }),
        )
        .await
    }
}
