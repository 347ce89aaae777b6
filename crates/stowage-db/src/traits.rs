//! Core traits that power the query compiler and row materialization.
//!
//! These traits define the contract for:
//! - Describing a persistable type's fields (`Describe`)
//! - Reading and writing field values by name (`Record`, `Resource`)
//! - Building filter expressions (`Expression`)

use rusqlite::types::Value;

use crate::{
    descriptor::TypeDescriptor,
    error::Result,
    expr::ast::{CompareOp, Expr},
    value::IntoValue,
};

/// A type with a static field layout.
///
/// Usually generated by [`crate::define_resource!`] or
/// [`crate::define_query!`].
pub trait Describe: 'static {
    fn type_descriptor() -> TypeDescriptor;
}

/// Field access by declared name.
pub trait Record: Describe {
    /// Returns the current value of `name`, or `None` if the type declares
    /// no such field.
    fn field(&self, name: &str) -> Option<Value>;
}

/// A persistable type that can be materialized from rows.
///
/// Instances are built by starting from `Default` and assigning each bound
/// column in turn.
pub trait Resource: Record + Default + Send + Sync {
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;
}

/// A trait for types that can be turned into a filter expression tree.
///
/// Implementors include [`crate::expr::Col<T>`] and [`Expr`] itself, so
/// comparisons chain naturally:
///
/// ```rust
/// use stowage_db::expr::Col;
/// use stowage_db::traits::Expression as _;
///
/// const CHANNEL: Col<String> = Col::new("channelName");
/// let expr = CHANNEL.eq("general");
/// ```
pub trait Expression: Sized {
    fn into_expr(self) -> Expr;

    /// Creates an `=` comparison.
    fn eq<T: IntoValue>(self, value: T) -> Expr {
        Expr::compare(CompareOp::Eq, self.into_expr(), Expr::Value(value.into_value()))
    }

    /// Creates a `!=` comparison.
    fn ne<T: IntoValue>(self, value: T) -> Expr {
        Expr::compare(CompareOp::Ne, self.into_expr(), Expr::Value(value.into_value()))
    }

    /// Creates a `>` comparison.
    fn gt<T: IntoValue>(self, value: T) -> Expr {
        Expr::compare(CompareOp::Gt, self.into_expr(), Expr::Value(value.into_value()))
    }

    /// Creates a `<` comparison.
    fn lt<T: IntoValue>(self, value: T) -> Expr {
        Expr::compare(CompareOp::Lt, self.into_expr(), Expr::Value(value.into_value()))
    }

    /// Creates a `>=` comparison.
    fn gte<T: IntoValue>(self, value: T) -> Expr {
        Expr::compare(CompareOp::Ge, self.into_expr(), Expr::Value(value.into_value()))
    }

    /// Creates a `<=` comparison.
    fn lte<T: IntoValue>(self, value: T) -> Expr {
        Expr::compare(CompareOp::Le, self.into_expr(), Expr::Value(value.into_value()))
    }

    /// Compares two expressions for equality.
    fn eq_expr<E: Expression>(self, other: E) -> Expr {
        Expr::compare(CompareOp::Eq, self.into_expr(), other.into_expr())
    }

    /// Combines two expressions with `AND`.
    fn and<E: Expression>(self, other: E) -> Expr {
        Expr::And(Box::new(self.into_expr()), Box::new(other.into_expr()))
    }

    /// Combines two expressions with `OR`.
    fn or<E: Expression>(self, other: E) -> Expr {
        Expr::Or(Box::new(self.into_expr()), Box::new(other.into_expr()))
    }

    /// Negates this expression.
    fn not(self) -> Expr {
        Expr::Not(Box::new(self.into_expr()))
    }

    /// Accesses a nested member of this expression, e.g. `author.name`.
    fn member(self, name: impl Into<String>) -> Expr {
        Expr::Member {
            base: Box::new(self.into_expr()),
            name: name.into(),
        }
    }
}

impl Expression for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}
