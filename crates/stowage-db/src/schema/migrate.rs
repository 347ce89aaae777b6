//! Additive schema migration.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::{
    descriptor::TypeDescriptor,
    error::{DbError, Result},
    helpers::quote_ident,
    schema::{Dialect, TableInfo},
};

/// DDL needed to bring one table in line with its descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationPlan {
    pub table: String,
    pub statements: Vec<String>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Computes the DDL for `descriptor` given the columns its table already has.
///
/// No existing columns means the table is missing and is created with every
/// field. Otherwise one `ADD COLUMN` is planned per field the table lacks,
/// with a zero default for non-nullable fields so existing rows stay
/// readable. Column names are compared case-insensitively, as SQLite does.
///
/// Every field must have a column type, even ones already present.
pub fn plan_migration(
    dialect: &dyn Dialect,
    descriptor: &TypeDescriptor,
    existing: &[String],
) -> Result<MigrationPlan> {
    let table = &descriptor.name;
    let quoted_table = quote_ident(table);
    let mut statements = Vec::new();

    if existing.is_empty() {
        let columns = descriptor
            .fields
            .iter()
            .map(|field| dialect.column_definition(table, field, true))
            .collect::<Result<Vec<_>>>()?;
        statements.push(format!(
            "CREATE TABLE {} ({})",
            quoted_table,
            columns.join(", ")
        ));
    } else {
        for field in &descriptor.fields {
            let definition = dialect.added_column_definition(table, field)?;
            let present = existing
                .iter()
                .any(|column| column.eq_ignore_ascii_case(&field.name));
            if !present {
                statements.push(format!(
                    "ALTER TABLE {} ADD COLUMN {}",
                    quoted_table, definition
                ));
            }
        }
    }

    Ok(MigrationPlan {
        table: table.clone(),
        statements,
    })
}

/// Inspects the live table and applies the planned DDL in one transaction.
///
/// On failure the transaction is rolled back and the table is left as it was.
pub fn migrate(
    conn: &mut Connection,
    dialect: &dyn Dialect,
    descriptor: &TypeDescriptor,
) -> Result<TableInfo> {
    let table = descriptor.name.as_str();

    let existing = dialect
        .existing_columns(conn, table)
        .map_err(|e| DbError::migration(table, "PRAGMA table_info", e))?;
    let plan = plan_migration(dialect, descriptor, &existing)?;

    if plan.is_empty() {
        debug!(table, "schema up to date");
    } else {
        let tx = conn
            .transaction()
            .map_err(|e| DbError::migration(table, "BEGIN", e))?;
        for statement in &plan.statements {
            debug!(table, statement = %statement, "applying schema change");
            tx.execute(statement, [])
                .map_err(|e| DbError::migration(table, statement, e))?;
        }
        tx.commit()
            .map_err(|e| DbError::migration(table, "COMMIT", e))?;
        info!(
            table,
            statements = plan.statements.len(),
            dialect = dialect.name(),
            "migrated table"
        );
    }

    Ok(TableInfo::from_descriptor(descriptor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{descriptor::FieldDescriptor, schema::SqliteDialect, value::FieldType};

    fn message_v1() -> TypeDescriptor {
        TypeDescriptor::new(
            "Message",
            vec![
                FieldDescriptor::new("id", FieldType::Text).primary_key(true),
                FieldDescriptor::new("channelName", FieldType::Text),
            ],
        )
    }

    fn message_v2() -> TypeDescriptor {
        let mut descriptor = message_v1();
        descriptor
            .fields
            .push(FieldDescriptor::new("postedDate", FieldType::Timestamp));
        descriptor
            .fields
            .push(FieldDescriptor::new("pinned", FieldType::Boolean));
        descriptor
    }

    #[test]
    fn test_plan_create_table() {
        let plan = plan_migration(&SqliteDialect, &message_v1(), &[]).unwrap();
        assert_eq!(
            plan.statements,
            [r#"CREATE TABLE "Message" ("id" TEXT PRIMARY KEY, "channelName" TEXT)"#]
        );
    }

    #[test]
    fn test_plan_adds_missing_columns_only() {
        let existing = vec!["id".to_string(), "CHANNELNAME".to_string()];
        let plan = plan_migration(&SqliteDialect, &message_v2(), &existing).unwrap();

        assert_eq!(
            plan.statements,
            [
                r#"ALTER TABLE "Message" ADD COLUMN "postedDate" DATETIME DEFAULT '1970-01-01T00:00:00.000000Z'"#,
                r#"ALTER TABLE "Message" ADD COLUMN "pinned" BOOLEAN DEFAULT 0"#,
            ]
        );
    }

    #[test]
    fn test_plan_up_to_date_is_empty() {
        let existing = vec!["id".to_string(), "channelName".to_string()];
        let plan = plan_migration(&SqliteDialect, &message_v1(), &existing).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_rejects_unmapped_type() {
        let mut descriptor = message_v1();
        descriptor
            .fields
            .push(FieldDescriptor::new("location", FieldType::Other("geo")));

        let err = plan_migration(&SqliteDialect, &descriptor, &[]).unwrap_err();
        assert!(matches!(err, DbError::UnsupportedFieldType { ref field, .. } if field == "location"));
    }

    #[test]
    fn test_migrate_creates_then_extends() {
        let mut conn = Connection::open_in_memory().unwrap();

        migrate(&mut conn, &SqliteDialect, &message_v1()).unwrap();
        assert_eq!(
            SqliteDialect.existing_columns(&conn, "Message").unwrap(),
            ["id", "channelName"]
        );

        conn.execute(
            r#"INSERT INTO "Message" ("id", "channelName") VALUES ('m1', 'general')"#,
            [],
        )
        .unwrap();

        let table = migrate(&mut conn, &SqliteDialect, &message_v2()).unwrap();
        assert_eq!(table.columns().len(), 4);
        assert_eq!(
            SqliteDialect.existing_columns(&conn, "Message").unwrap(),
            ["id", "channelName", "postedDate", "pinned"]
        );

        let kept: String = conn
            .query_row(r#"SELECT "channelName" FROM "Message""#, [], |r| r.get(0))
            .unwrap();
        assert_eq!(kept, "general");

        let (posted, pinned): (String, bool) = conn
            .query_row(r#"SELECT "postedDate", "pinned" FROM "Message""#, [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(posted, "1970-01-01T00:00:00.000000Z");
        assert!(!pinned);

        // idempotent once up to date
        migrate(&mut conn, &SqliteDialect, &message_v2()).unwrap();
    }

    #[test]
    fn test_migrate_hand_built_decimal_column() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn, &SqliteDialect, &message_v1()).unwrap();
        conn.execute(
            r#"INSERT INTO "Message" ("id", "channelName") VALUES ('m1', 'general')"#,
            [],
        )
        .unwrap();

        let mut priced = message_v1();
        priced
            .fields
            .push(FieldDescriptor::new("price", FieldType::Decimal));
        let table = migrate(&mut conn, &SqliteDialect, &priced).unwrap();
        assert_eq!(
            table.column("price").map(|c| c.field_type),
            Some(FieldType::Decimal)
        );

        let price: i64 = conn
            .query_row(r#"SELECT "price" FROM "Message""#, [], |r| r.get(0))
            .unwrap();
        assert_eq!(price, 0);
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn, &SqliteDialect, &message_v1()).unwrap();

        // The second ADD COLUMN collides with the first.
        let mut broken = message_v1();
        broken
            .fields
            .push(FieldDescriptor::new("extra", FieldType::Text));
        broken
            .fields
            .push(FieldDescriptor::new("extra", FieldType::Integer));

        let err = migrate(&mut conn, &SqliteDialect, &broken).unwrap_err();
        assert!(matches!(
            err,
            DbError::SchemaMigration { ref statement, .. } if statement.contains("\"extra\" INTEGER")
        ));
        assert_eq!(
            SqliteDialect.existing_columns(&conn, "Message").unwrap(),
            ["id", "channelName"]
        );
    }
}
