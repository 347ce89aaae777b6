//! Filter expressions.
//!
//! [`Col`] names a typed column; comparing it with a value through the
//! [`crate::traits::Expression`] methods yields an [`Expr`] tree that the
//! query compiler later translates, or rejects.

pub mod ast;
pub mod column;

pub use ast::{field, CompareOp, Expr};
pub use column::Col;
