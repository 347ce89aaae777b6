//! The compiled, engine-ready form of a query.

use rusqlite::{types::Value, ToSql};

/// A SQL statement and its named parameter bindings.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryDescriptor {
    /// Table the statement reads from.
    pub table: String,
    pub sql: String,
    /// Bindings in placeholder order, keyed by placeholder name (`:p0`, ...).
    pub params: Vec<(String, Value)>,
}

impl QueryDescriptor {
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub(crate) fn bindings(&self) -> Vec<(&str, &dyn ToSql)> {
        self.params
            .iter()
            .map(|(key, value)| (key.as_str(), value as &dyn ToSql))
            .collect()
    }
}
