use std::{ops::Index, slice};

/// The materialized rows of one query, in row order.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultSet<E> {
    items: Vec<E>,
}

impl<E> ResultSet<E> {
    pub fn new(items: Vec<E>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&E> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&E> {
        self.items.first()
    }

    pub fn iter(&self) -> slice::Iter<'_, E> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[E] {
        &self.items
    }
}

impl<E> Default for ResultSet<E> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<E> Index<usize> for ResultSet<E> {
    type Output = E;

    fn index(&self, index: usize) -> &E {
        &self.items[index]
    }
}

impl<'a, E> IntoIterator for &'a ResultSet<E> {
    type Item = &'a E;
    type IntoIter = slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<E> FromIterator<E> for ResultSet<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
