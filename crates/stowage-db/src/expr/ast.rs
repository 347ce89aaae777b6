//! The filter expression tree.
//!
//! The tree is closed: every shape a caller can build is one of these
//! variants, and the compiler decides which shapes it can translate.

use std::fmt;

use rusqlite::types::Value;

/// A comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A declared field of the queried type.
    Field(String),
    /// A nested member access such as `author.name`.
    Member { base: Box<Expr>, name: String },
    /// A literal value.
    Value(Value),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

/// An untyped field reference, for names not known at compile time.
pub fn field(name: impl Into<String>) -> Expr {
    Expr::Field(name.into())
}

impl Expr {
    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Self {
        Self::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Short name of the node, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Field(_) => "field reference",
            Self::Member { .. } => "member access",
            Self::Value(_) => "literal value",
            Self::Compare { op, .. } => match op {
                CompareOp::Eq => "equality comparison",
                _ => "range comparison",
            },
            Self::And(..) => "conjunction",
            Self::Or(..) => "disjunction",
            Self::Not(_) => "negation",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Member { base, name } => write!(f, "{base}.{name}"),
            Self::Value(value) => match value {
                Value::Null => write!(f, "null"),
                Value::Integer(i) => write!(f, "{i}"),
                Value::Real(r) => write!(f, "{r}"),
                Value::Text(s) => write!(f, "{s:?}"),
                Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            },
            Self::Compare { op, left, right } => write!(f, "{left} {} {right}", op.symbol()),
            Self::And(l, r) => write!(f, "({l} AND {r})"),
            Self::Or(l, r) => write!(f, "({l} OR {r})"),
            Self::Not(e) => write!(f, "NOT {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{expr::Col, traits::Expression as _};

    const COUNT: Col<i64> = Col::new("count");
    const NAME: Col<String> = Col::new("name");

    #[test]
    fn test_builders_produce_tree() {
        let expr = NAME.eq("general").and(COUNT.gt(3));

        let Expr::And(left, right) = expr else {
            panic!("expected conjunction");
        };
        assert_eq!(
            *left,
            Expr::compare(
                CompareOp::Eq,
                Expr::Field("name".into()),
                Expr::Value(Value::Text("general".into()))
            )
        );
        assert_eq!(right.kind(), "range comparison");
    }

    #[test]
    fn test_display() {
        assert_eq!(COUNT.gt(3).to_string(), "count > 3");
        assert_eq!(NAME.eq("x").not().to_string(), "NOT name = \"x\"");
        assert_eq!(field("author").member("name").to_string(), "author.name");
        assert_eq!(
            COUNT.lte(1).or(COUNT.ne(9)).to_string(),
            "(count <= 1 OR count != 9)"
        );
    }
}
