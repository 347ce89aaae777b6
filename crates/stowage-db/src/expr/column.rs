//! Represents a typed column of a persistable type.
//!
//! `Col<T>` ties a column name to a Rust type `T`. It implements
//! [`Expression`], so it can be used directly in filters and ordering.

use std::{fmt, marker::PhantomData};

use crate::{expr::ast::Expr, traits::Expression};

/// A typed reference to a column.
///
/// The type parameter `T` records the field's Rust type; it is not checked
/// against the compared value, the compiler only checks the column name.
///
/// # Example
///
/// ```rust
/// use stowage_db::expr::Col;
/// const POSTED: Col<i64> = Col::new("postedDate");
/// ```
pub struct Col<T> {
    pub name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> Col<T> {
    /// Creates a new column reference.
    ///
    /// # Parameters
    ///
    /// - `name`: the column name as declared by the type (e.g., `"channelName"`)
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }
}

impl<T> Clone for Col<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Col<T> {}

impl<T> fmt::Debug for Col<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Col").field(&self.name).finish()
    }
}

impl<T> Expression for Col<T> {
    fn into_expr(self) -> Expr {
        Expr::Field(self.name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_is_field_reference() {
        const TEXT: Col<String> = Col::new("text");

        assert_eq!(TEXT.into_expr(), Expr::Field("text".into()));
        // Col<String> is Copy even though String is not
        let copy = TEXT;
        assert_eq!(copy.name, TEXT.name);
    }
}
