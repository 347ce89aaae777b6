//! Relational persistence for stowage.
//!
//! Types are declared with [`define_resource!`], queried through the
//! immutable [`SelectQuery`] builder, and stored in SQLite tables that are
//! created and extended on first use by the [`SchemaCatalog`].

pub mod connection;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod expr;
pub mod helpers;
pub mod macros;
pub mod query;
pub mod result;
pub mod schema;
pub mod traits;
pub mod value;

pub use connection::DbConnection;
pub use descriptor::{DescriptorRegistry, FieldDescriptor, TypeDescriptor};
pub use error::{DbError, Result};
pub use executor::{execute, insert};
pub use expr::{Col, Expr};
pub use query::{QueryDescriptor, SelectQuery};
pub use result::ResultSet;
pub use rusqlite::types::Value;
pub use schema::{Dialect, SchemaCatalog, SqliteDialect, TableInfo};
pub use traits::{Describe, Expression, Record, Resource};
pub use value::{ColumnValue, FieldType, IntoValue};
