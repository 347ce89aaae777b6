//! Schema management.
//!
//! Tables are derived from [`crate::TypeDescriptor`]s: the first access to a
//! type creates its table, and fields added to the type later are added as
//! columns. Columns are never dropped or retyped.

pub mod catalog;
pub mod dialect;
pub mod migrate;
pub mod table;

pub use catalog::SchemaCatalog;
pub use dialect::{Dialect, SqliteDialect};
pub use migrate::{migrate, plan_migration, MigrationPlan};
pub use table::{ColumnInfo, TableInfo};
