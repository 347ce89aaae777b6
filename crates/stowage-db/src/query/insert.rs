use rusqlite::{types::Value, ToSql};

use crate::{helpers::quote_ident, schema::TableInfo, traits::Record};

/// An INSERT of one resource into its table.
///
/// Tables with a primary key are written with `INSERT OR REPLACE`, so saving
/// a resource twice updates it in place.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub sql: String,
    pub values: Vec<Value>,
}

impl InsertStatement {
    /// Builds the statement from every column of `table`. Columns the
    /// resource does not report are written as NULL.
    pub fn for_resource<R: Record>(table: &TableInfo, resource: &R) -> Self {
        let columns: Vec<String> = table
            .columns()
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect();
        let values: Vec<Value> = table
            .columns()
            .iter()
            .map(|c| resource.field(&c.name).unwrap_or(Value::Null))
            .collect();
        let placeholders = vec!["?"; values.len()].join(", ");

        let verb = if table.primary_key().is_some() {
            "INSERT OR REPLACE"
        } else {
            "INSERT"
        };

        let sql = format!(
            "{} INTO {} ({}) VALUES ({})",
            verb,
            quote_ident(table.name()),
            columns.join(", "),
            placeholders
        );

        Self {
            table: table.name().to_string(),
            sql,
            values,
        }
    }

    pub(crate) fn bindings(&self) -> Vec<&dyn ToSql> {
        self.values.iter().map(|v| v as &dyn ToSql).collect()
    }
}
