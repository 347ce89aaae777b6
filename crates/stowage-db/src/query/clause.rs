//! Internal representation of query clauses.
//!
//! Clauses keep the raw expression tree; nothing is validated until
//! [`super::SelectQuery::compile`].

use crate::expr::Expr;

/// A WHERE predicate. Multiple predicates are joined with `AND`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct WhereClause {
    pub expr: Expr,
}

/// An ORDER BY key.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct OrderClause {
    pub key: Expr,
    pub desc: bool,
}
