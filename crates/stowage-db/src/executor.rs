//! Runs compiled statements and materializes rows.

use rusqlite::{types::Value, Statement};
use tracing::{debug, trace};

use crate::{
    connection::DbConnection,
    error::{DbError, Result},
    query::{InsertStatement, QueryDescriptor},
    result::ResultSet,
    schema::TableInfo,
    traits::{Record, Resource},
};

/// Runs `query` and builds one `E` per returned row.
///
/// Result columns are matched to fields by name, ignoring ASCII case, once,
/// on the first row. Columns the table does not declare are ignored, so
/// column order in the store does not matter.
pub fn execute<E: Resource>(
    conn: &DbConnection,
    table: &TableInfo,
    query: &QueryDescriptor,
) -> Result<ResultSet<E>> {
    let name = table.name();

    conn.with_conn(|c| {
        let mut stmt = c.prepare(&query.sql).map_err(|e| DbError::query(name, e))?;
        let bindings = query.bindings();
        let mut rows = stmt
            .query(bindings.as_slice())
            .map_err(|e| DbError::query(name, e))?;

        let mut binding: Option<Vec<(usize, String)>> = None;
        let mut items = Vec::new();

        while let Some(row) = rows.next().map_err(|e| DbError::query(name, e))? {
            let columns = binding.get_or_insert_with(|| bind_columns(row.as_ref(), table));

            let mut item = E::default();
            for (index, field) in columns.iter() {
                let value: Value = row.get(*index).map_err(|e| DbError::query(name, e))?;
                item.set_field(field, value)?;
            }
            items.push(item);
        }

        debug!(table = name, rows = items.len(), "query executed");
        Ok(ResultSet::new(items))
    })
}

/// Writes `resource` to its table, replacing any row with the same primary
/// key. Returns the number of affected rows.
pub fn insert<R: Record>(conn: &DbConnection, table: &TableInfo, resource: &R) -> Result<usize> {
    let statement = InsertStatement::for_resource(table, resource);

    conn.with_conn(|c| {
        let changed = c
            .execute(&statement.sql, statement.bindings().as_slice())
            .map_err(|e| DbError::query(&statement.table, e))?;
        debug!(table = %statement.table, changed, "resource saved");
        Ok(changed)
    })
}

fn bind_columns(stmt: &Statement<'_>, table: &TableInfo) -> Vec<(usize, String)> {
    stmt.column_names()
        .into_iter()
        .enumerate()
        .filter_map(|(index, column)| match table.column(column) {
            Some(declared) => Some((index, declared.name.clone())),
            None => {
                trace!(table = table.name(), column, "skipping undeclared column");
                None
            }
        })
        .collect()
}
