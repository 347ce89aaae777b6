use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tracing::trace;

use crate::{
    connection::DbConnection,
    descriptor::TypeDescriptor,
    error::Result,
    error::DbError,
    schema::{migrate, plan_migration, Dialect, MigrationPlan, TableInfo},
};

type Tables = Arc<Mutex<HashMap<String, Arc<TableInfo>>>>;

/// Records which tables have been migrated, per store.
///
/// A table is migrated at most once per store for the life of the catalog.
/// Concurrent first accesses to the same store serialize on that store's
/// lock, so a type's DDL never runs twice. A failed migration records
/// nothing and is retried on the next access.
pub struct SchemaCatalog {
    dialect: Arc<dyn Dialect>,
    stores: Mutex<HashMap<String, Tables>>,
}

impl SchemaCatalog {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Returns the table for `descriptor` in the store behind `conn`,
    /// migrating it on first access.
    pub fn ensure_table(
        &self,
        conn: &DbConnection,
        descriptor: &TypeDescriptor,
    ) -> Result<Arc<TableInfo>> {
        let tables = self.tables_for(conn.identity())?;
        let mut tables = tables.lock()?;

        if let Some(table) = tables.get(&descriptor.name) {
            trace!(table = %descriptor.name, "schema cached");
            return Ok(table.clone());
        }

        let table = Arc::new(conn.with_conn(|c| migrate(c, self.dialect.as_ref(), descriptor))?);
        tables.insert(descriptor.name.clone(), table.clone());
        Ok(table)
    }

    /// The DDL `ensure_table` would run against `conn` right now. Nothing is
    /// executed or recorded.
    pub fn pending(&self, conn: &DbConnection, descriptor: &TypeDescriptor) -> Result<MigrationPlan> {
        conn.with_conn(|c| {
            let existing = self
                .dialect
                .existing_columns(c, &descriptor.name)
                .map_err(|e| DbError::query(&descriptor.name, e))?;
            plan_migration(self.dialect.as_ref(), descriptor, &existing)
        })
    }

    /// The recorded table, if `ensure_table` has succeeded for it.
    pub fn table(&self, identity: &str, name: &str) -> Option<Arc<TableInfo>> {
        let stores = self.stores.lock().ok()?;
        let tables = stores.get(identity)?.lock().ok()?;
        tables.get(name).cloned()
    }

    fn tables_for(&self, identity: &str) -> Result<Tables> {
        let mut stores = self.stores.lock()?;
        Ok(stores.entry(identity.to_string()).or_default().clone())
    }
}

impl std::fmt::Debug for SchemaCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCatalog")
            .field("dialect", &self.dialect.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::atomic::AtomicUsize, thread};

    use rusqlite::Connection;

    use super::*;
    use crate::{
        descriptor::FieldDescriptor,
        schema::SqliteDialect,
        value::FieldType,
    };

    /// Counts how often the live schema is inspected, which happens once
    /// per migration attempt.
    #[derive(Default)]
    struct CountingDialect {
        inspections: AtomicUsize,
    }

    impl Dialect for CountingDialect {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn column_type(&self, field_type: FieldType) -> Option<&'static str> {
            SqliteDialect.column_type(field_type)
        }

        fn zero_default(&self, field_type: FieldType) -> Option<&'static str> {
            SqliteDialect.zero_default(field_type)
        }

        fn existing_columns(
            &self,
            conn: &Connection,
            table: &str,
        ) -> rusqlite::Result<Vec<String>> {
            self.inspections
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            SqliteDialect.existing_columns(conn, table)
        }
    }

    fn note() -> TypeDescriptor {
        TypeDescriptor::new(
            "Note",
            vec![
                FieldDescriptor::new("id", FieldType::Integer).primary_key(true),
                FieldDescriptor::new("body", FieldType::Text),
            ],
        )
    }

    #[test]
    fn test_migrates_once_per_store() {
        let dialect = Arc::new(CountingDialect::default());
        let catalog = Arc::new(SchemaCatalog::new(dialect.clone()));
        let conn = Arc::new(DbConnection::memory());

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let catalog = catalog.clone();
                let conn = conn.clone();
                thread::spawn(move || catalog.ensure_table(&conn, &note()).unwrap())
            })
            .collect();
        let tables: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(
            dialect.inspections.load(std::sync::atomic::Ordering::SeqCst),
            1
        );
        assert!(tables.iter().all(|t| Arc::ptr_eq(t, &tables[0])));
        assert!(catalog.table(conn.identity(), "Note").is_some());

        // another store migrates independently
        let other = DbConnection::memory();
        catalog.ensure_table(&other, &note()).unwrap();
        assert_eq!(
            dialect.inspections.load(std::sync::atomic::Ordering::SeqCst),
            2
        );
    }

    #[test]
    fn test_failed_migration_is_not_recorded() {
        let catalog = SchemaCatalog::new(Arc::new(SqliteDialect));
        let conn = DbConnection::memory();

        let mut broken = note();
        broken
            .fields
            .push(FieldDescriptor::new("shape", FieldType::Other("polygon")));

        let err = catalog.ensure_table(&conn, &broken).unwrap_err();
        assert!(matches!(err, DbError::UnsupportedFieldType { .. }));
        assert!(catalog.table(conn.identity(), "Note").is_none());

        // a corrected descriptor migrates on the next attempt
        catalog.ensure_table(&conn, &note()).unwrap();
        assert!(catalog.table(conn.identity(), "Note").is_some());
    }

    #[test]
    fn test_pending_does_not_migrate() {
        let catalog = SchemaCatalog::new(Arc::new(SqliteDialect));
        let conn = DbConnection::memory();

        let plan = catalog.pending(&conn, &note()).unwrap();
        assert_eq!(plan.statements.len(), 1);
        assert!(catalog.table(conn.identity(), "Note").is_none());
        assert_eq!(catalog.pending(&conn, &note()).unwrap(), plan);

        catalog.ensure_table(&conn, &note()).unwrap();
        assert!(catalog.pending(&conn, &note()).unwrap().is_empty());
    }
}
