//! The terminal repository backed by a local SQLite store.

use std::sync::Arc;

use async_trait::async_trait;
use stowage_db::{
    execute, insert, DbConnection, DescriptorRegistry, Describe, Resource, ResultSet,
    SchemaCatalog, SelectQuery, TableInfo,
};
use tracing::trace;

use crate::{error::StowageResult, query::Query, repository::Repository};

/// Runs every save and fetch against one [`DbConnection`], on tokio's
/// blocking pool.
///
/// Cloning is cheap; clones share the connection, catalog and registry.
#[derive(Clone)]
pub struct LocalRepository {
    conn: Arc<DbConnection>,
    catalog: Arc<SchemaCatalog>,
    registry: Arc<DescriptorRegistry>,
}

impl LocalRepository {
    pub fn new(
        conn: Arc<DbConnection>,
        catalog: Arc<SchemaCatalog>,
        registry: Arc<DescriptorRegistry>,
    ) -> Self {
        Self {
            conn,
            catalog,
            registry,
        }
    }

    pub fn connection(&self) -> &Arc<DbConnection> {
        &self.conn
    }

    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    pub fn registry(&self) -> &Arc<DescriptorRegistry> {
        &self.registry
    }

    /// Migrates the table for `E` if this store has not seen it yet.
    pub fn ensure_table<E: Describe>(&self) -> stowage_db::Result<Arc<TableInfo>> {
        let descriptor = self.registry.describe::<E>();
        self.catalog.ensure_table(&self.conn, &descriptor)
    }

    /// The DDL `ensure_table::<E>` would run right now, without running it.
    pub fn pending_migration<E: Describe>(&self) -> stowage_db::Result<Vec<String>> {
        let descriptor = self.registry.describe::<E>();
        Ok(self.catalog.pending(&self.conn, &descriptor)?.statements)
    }

    pub fn save_blocking<E: Resource>(&self, resource: &E) -> stowage_db::Result<()> {
        let table = self.ensure_table::<E>()?;
        insert(&self.conn, &table, resource)?;
        Ok(())
    }

    pub fn fetch_blocking<Q: Query>(&self, query: &Q) -> stowage_db::Result<ResultSet<Q::Item>> {
        let descriptor = self.registry.describe::<Q::Item>();
        let compiled = query.build(SelectQuery::new(descriptor.clone())).compile()?;
        let table = self.catalog.ensure_table(&self.conn, &descriptor)?;
        trace!(store = self.conn.identity(), sql = %compiled.sql, "fetching");
        execute(&self.conn, &table, &compiled)
    }

    async fn run_blocking<T, F>(&self, work: F) -> StowageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(LocalRepository) -> stowage_db::Result<T> + Send + 'static,
    {
        let repo = self.clone();
        Ok(tokio::task::spawn_blocking(move || work(repo)).await??)
    }
}

#[async_trait]
impl Repository for LocalRepository {
    async fn save<E: Resource>(&self, resource: E) -> StowageResult<()> {
        self.run_blocking(move |repo| repo.save_blocking(&resource)).await
    }

    async fn fetch<Q: Query>(&self, query: Q) -> StowageResult<Arc<ResultSet<Q::Item>>> {
        self.run_blocking(move |repo| repo.fetch_blocking(&query))
            .await
            .map(Arc::new)
    }
}
