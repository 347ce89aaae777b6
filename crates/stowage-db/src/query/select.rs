//! The main query builder implementation.

use std::{marker::PhantomData, sync::Arc};

use tracing::debug;

use crate::{
    descriptor::{DescriptorRegistry, TypeDescriptor},
    error::{DbError, Result},
    expr::{CompareOp, Expr},
    helpers::{placeholder, quote_ident},
    query::{
        clause::{OrderClause, WhereClause},
        QueryDescriptor,
    },
    traits::{Describe, Expression},
};

/// An immutable SELECT builder over the table of `E`.
///
/// # Example
///
/// ```rust
/// use stowage_db::{define_resource, DescriptorRegistry, SelectQuery};
/// use stowage_db::traits::Expression as _;
///
/// #[derive(Debug, Default)]
/// struct Note {
///     id: i64,
///     topic: String,
/// }
///
/// define_resource!(
///     Note as notes {
///         table: "Note",
///         columns: {
///             #[primary_key]
///             ID(id): i64 => "id",
///             TOPIC(topic): String => "topic"
///         }
///     }
/// );
///
/// let registry = DescriptorRegistry::new();
/// let query = SelectQuery::<Note>::from(&registry)
///     .filter(notes::TOPIC.eq("rust"))
///     .order_by_desc(notes::ID)
///     .limit(10)
///     .compile()
///     .unwrap();
///
/// assert_eq!(
///     query.sql,
///     r#"SELECT * FROM "Note" WHERE ("topic"=:p0) ORDER BY "id" DESC LIMIT 10"#
/// );
/// ```
pub struct SelectQuery<E> {
    descriptor: Arc<TypeDescriptor>,
    wheres: Vec<WhereClause>,
    orders: Vec<OrderClause>,
    limit: Option<u32>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SelectQuery<E> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            wheres: self.wheres.clone(),
            orders: self.orders.clone(),
            limit: self.limit,
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for SelectQuery<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectQuery")
            .field("table", &self.descriptor.name)
            .field("wheres", &self.wheres)
            .field("orders", &self.orders)
            .field("limit", &self.limit)
            .finish()
    }
}

impl<E: Describe> SelectQuery<E> {
    /// Starts a new query on the table of `E`.
    pub fn from(registry: &DescriptorRegistry) -> Self {
        Self::new(registry.describe::<E>())
    }
}

impl<E> SelectQuery<E> {
    /// Starts a new query on the table described by `descriptor`.
    pub fn new(descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            descriptor,
            wheres: vec![],
            orders: vec![],
            limit: None,
            _entity: PhantomData,
        }
    }

    pub fn table(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Adds a WHERE predicate.
    pub fn filter<X: Expression>(&self, expr: X) -> Self {
        let mut next = self.clone();
        next.wheres.push(WhereClause {
            expr: expr.into_expr(),
        });
        next
    }

    /// Adds an ORDER BY key.
    pub fn order_by<X: Expression>(&self, key: X, desc: bool) -> Self {
        let mut next = self.clone();
        next.orders.push(OrderClause {
            key: key.into_expr(),
            desc,
        });
        next
    }

    pub fn order_by_desc<X: Expression>(&self, key: X) -> Self {
        self.order_by(key, true)
    }

    /// Limits the number of rows. A later call replaces an earlier one.
    pub fn limit(&self, limit: u32) -> Self {
        let mut next = self.clone();
        next.limit = Some(limit);
        next
    }

    /// Translates the accumulated clauses into SQL with named parameters.
    ///
    /// Only equality between a declared field and a literal is translatable;
    /// any other predicate shape fails with
    /// [`DbError::UnsupportedExpression`].
    pub fn compile(&self) -> Result<QueryDescriptor> {
        let mut params = Vec::new();
        let mut sql = format!("SELECT * FROM {}", quote_ident(self.table()));

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            let conditions = self
                .wheres
                .iter()
                .map(|w| self.compile_predicate(&w.expr, &mut params))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(&conditions.join(" AND "));
        }

        if !self.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            let orders = self
                .orders
                .iter()
                .map(|o| {
                    let column = self.compile_key(&o.key)?;
                    Ok(format!("{} {}", column, if o.desc { "DESC" } else { "ASC" }))
                })
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(&orders.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        debug!(table = self.table(), sql = %sql, params = params.len(), "compiled query");

        Ok(QueryDescriptor {
            table: self.table().to_string(),
            sql,
            params,
        })
    }

    fn compile_predicate(
        &self,
        expr: &Expr,
        params: &mut Vec<(String, rusqlite::types::Value)>,
    ) -> Result<String> {
        match expr {
            Expr::Compare {
                op: CompareOp::Eq,
                left,
                right,
            } => {
                let (field, value) = match (left.as_ref(), right.as_ref()) {
                    (Expr::Field(field), Expr::Value(value))
                    | (Expr::Value(value), Expr::Field(field)) => (field, value),
                    _ => {
                        return Err(DbError::UnsupportedExpression(format!(
                            "`{expr}` must compare one field with one value"
                        )))
                    }
                };
                let column = self.column(field)?;
                let name = placeholder(params.len());
                let sql = format!("({column}={name})");
                params.push((name, value.clone()));
                Ok(sql)
            }
            other => Err(DbError::UnsupportedExpression(format!(
                "{} `{other}` cannot be used as a filter",
                other.kind()
            ))),
        }
    }

    fn compile_key(&self, key: &Expr) -> Result<String> {
        match key {
            Expr::Field(field) => self.column(field),
            other => Err(DbError::UnsupportedExpression(format!(
                "{} `{other}` cannot be used as an ordering key",
                other.kind()
            ))),
        }
    }

    fn column(&self, field: &str) -> Result<String> {
        if self.descriptor.has_field(field) {
            Ok(quote_ident(field))
        } else {
            Err(DbError::UnsupportedExpression(format!(
                "{} declares no field `{field}`",
                self.table()
            )))
        }
    }
}
