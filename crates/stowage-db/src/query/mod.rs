//! The query compiler.
//!
//! Start with [`SelectQuery::from`] (or [`SelectQuery::new`] with an explicit
//! descriptor), chain `.filter()`, `.order_by_desc()` and `.limit()`, then
//! call [`SelectQuery::compile`] to obtain a [`QueryDescriptor`].
//!
//! Builders are immutable: every chained call returns a new query and
//! leaves the receiver untouched, so partially built queries can be reused
//! as templates.
//!
//! # Submodules
//!
//! - [`clause`]: clause state shared by the builder.
//! - [`descriptor`]: the compiled statement.
//! - [`insert`]: the statement used to persist a resource.
//! - [`select`]: implementation of [`SelectQuery`].

pub mod clause;
pub mod descriptor;
pub mod insert;
pub mod select;

pub use descriptor::QueryDescriptor;
pub use insert::InsertStatement;
pub use select::SelectQuery;
