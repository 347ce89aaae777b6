//! Wiring a repository chain from configuration.

use std::sync::Arc;

use stowage_config::{Config, DialectKind};
use stowage_db::{DbConnection, DescriptorRegistry, Dialect, SchemaCatalog, SqliteDialect};
use tracing::{debug, trace};

use crate::{error::StowageResult, local::LocalRepository, repository::CachedRepository};

/// Shared state for every store opened from one configuration.
///
/// The descriptor registry and schema catalog live here, so repositories
/// opened from the same context share memoized descriptors and migration
/// records. Cloning is cheap.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    config: Config,
    registry: Arc<DescriptorRegistry>,
    catalog: Arc<SchemaCatalog>,
}

impl Context {
    pub fn new(config: Config) -> StowageResult<Self> {
        trace!("creating new Context");
        let dialect: Arc<dyn Dialect> = match config.dialect()? {
            DialectKind::Sqlite => Arc::new(SqliteDialect),
        };

        Ok(Self {
            inner: Arc::new(ContextInner {
                config,
                registry: Arc::new(DescriptorRegistry::new()),
                catalog: Arc::new(SchemaCatalog::new(dialect)),
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<DescriptorRegistry> {
        &self.inner.registry
    }

    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.inner.catalog
    }

    /// The terminal repository for the configured store. The store itself is
    /// opened on first use.
    pub fn local(&self) -> StowageResult<LocalRepository> {
        let path = self.inner.config.get_store_path()?;
        debug!(store = %path.display(), "using local store");

        Ok(LocalRepository::new(
            Arc::new(DbConnection::new(path)),
            self.inner.catalog.clone(),
            self.inner.registry.clone(),
        ))
    }

    /// The configured store behind a cache, with the configured fetch timeout
    /// and cache policy.
    pub fn open_local(&self) -> StowageResult<CachedRepository<LocalRepository>> {
        let config = &self.inner.config;
        Ok(CachedRepository::new(self.local()?)
            .with_dedupe(config.dedupe_in_flight())
            .with_timeout(config.fetch_timeout()?)
            .with_invalidate_on_save(config.invalidate_on_save()))
    }
}

/// Shorthand for `Context::new(config)?.open_local()`.
pub fn open_local(config: Config) -> StowageResult<CachedRepository<LocalRepository>> {
    Context::new(config)?.open_local()
}
