//! Engine-specific SQL fragments.

use rusqlite::Connection;

use crate::{
    descriptor::FieldDescriptor,
    error::{DbError, Result},
    helpers::quote_ident,
    value::FieldType,
};

/// What the migrator needs to know about a SQL engine.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Column type for a semantic field type, or `None` if the engine has
    /// no mapping for it.
    fn column_type(&self, field_type: FieldType) -> Option<&'static str>;

    /// Names of the columns `table` currently has. A missing table has none.
    fn existing_columns(&self, conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>>;

    /// Literal a non-nullable column of `field_type` is filled with when it
    /// is added to a table that already has rows.
    fn zero_default(&self, field_type: FieldType) -> Option<&'static str>;

    /// Column definition used in CREATE TABLE and ALTER TABLE ADD COLUMN.
    fn column_definition(
        &self,
        table: &str,
        field: &FieldDescriptor,
        with_primary_key: bool,
    ) -> Result<String> {
        let column_type = self.column_type(field.field_type).ok_or_else(|| {
            DbError::UnsupportedFieldType {
                table: table.to_string(),
                field: field.name.clone(),
                type_name: field.field_type.to_string(),
            }
        })?;

        let mut definition = format!("{} {}", quote_ident(&field.name), column_type);
        if with_primary_key && field.is_primary_key {
            definition.push_str(" PRIMARY KEY");
        }
        Ok(definition)
    }

    /// Definition for ALTER TABLE ADD COLUMN. Rows already in the table read
    /// the zero default for non-nullable fields and NULL for nullable ones.
    fn added_column_definition(&self, table: &str, field: &FieldDescriptor) -> Result<String> {
        let mut definition = self.column_definition(table, field, false)?;
        if !field.nullable {
            if let Some(default) = self.zero_default(field.field_type) {
                definition.push_str(" DEFAULT ");
                definition.push_str(default);
            }
        }
        Ok(definition)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn column_type(&self, field_type: FieldType) -> Option<&'static str> {
        match field_type {
            FieldType::Text => Some("TEXT"),
            FieldType::Integer => Some("INTEGER"),
            FieldType::Real => Some("REAL"),
            FieldType::Boolean => Some("BOOLEAN"),
            FieldType::Timestamp => Some("DATETIME"),
            FieldType::Binary => Some("BLOB"),
            FieldType::Decimal => Some("DECIMAL"),
            FieldType::Other(_) => None,
        }
    }

    fn zero_default(&self, field_type: FieldType) -> Option<&'static str> {
        match field_type {
            FieldType::Text => Some("''"),
            FieldType::Integer | FieldType::Boolean | FieldType::Decimal => Some("0"),
            FieldType::Real => Some("0.0"),
            FieldType::Timestamp => Some("'1970-01-01T00:00:00.000000Z'"),
            FieldType::Binary => Some("X''"),
            FieldType::Other(_) => None,
        }
    }

    fn existing_columns(&self, conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt.query_map([], |row| row.get::<_, String>("name"))?;
        columns.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_column_types() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.column_type(FieldType::Text), Some("TEXT"));
        assert_eq!(dialect.column_type(FieldType::Timestamp), Some("DATETIME"));
        assert_eq!(dialect.column_type(FieldType::Decimal), Some("DECIMAL"));
        assert_eq!(dialect.column_type(FieldType::Other("uuid")), None);
    }

    #[test]
    fn test_column_definition() {
        let dialect = SqliteDialect;
        let id = FieldDescriptor::new("id", FieldType::Text).primary_key(true);

        assert_eq!(
            dialect.column_definition("Message", &id, true).unwrap(),
            "\"id\" TEXT PRIMARY KEY"
        );
        assert_eq!(
            dialect.column_definition("Message", &id, false).unwrap(),
            "\"id\" TEXT"
        );

        let err = dialect
            .column_definition("Message", &FieldDescriptor::new("geo", FieldType::Other("point")), true)
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::UnsupportedFieldType { ref field, ref type_name, .. }
                if field == "geo" && type_name == "point"
        ));
    }

    #[test]
    fn test_added_column_definition_defaults_non_nullable() {
        let dialect = SqliteDialect;
        let title = FieldDescriptor::new("title", FieldType::Text);
        let posted = FieldDescriptor::new("posted", FieldType::Timestamp);
        let score = FieldDescriptor::new("score", FieldType::Real).nullable(true);

        assert_eq!(
            dialect.added_column_definition("Post", &title).unwrap(),
            "\"title\" TEXT DEFAULT ''"
        );
        assert_eq!(
            dialect.added_column_definition("Post", &posted).unwrap(),
            "\"posted\" DATETIME DEFAULT '1970-01-01T00:00:00.000000Z'"
        );
        assert_eq!(
            dialect.added_column_definition("Post", &score).unwrap(),
            "\"score\" REAL"
        );
    }

    #[test]
    fn test_existing_columns_of_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let dialect = SqliteDialect;
        assert!(dialect.existing_columns(&conn, "Nope").unwrap().is_empty());

        conn.execute_batch("CREATE TABLE \"Note\" (\"a\" TEXT, \"b\" INTEGER)")
            .unwrap();
        assert_eq!(dialect.existing_columns(&conn, "Note").unwrap(), ["a", "b"]);
    }
}
