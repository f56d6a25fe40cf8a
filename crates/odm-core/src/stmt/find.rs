use super::{Document, Value};

use std::cmp::Ordering;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One key of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

/// Sort and window applied to a find. The sort is always applied before the
/// window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Vec<SortKey>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    /// Parses `"name"` as ascending and `"-name"` as descending.
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(spec.strip_prefix('+').unwrap_or(spec)),
        }
    }
}

impl From<&str> for SortKey {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

impl FindOptions {
    pub fn is_windowed(&self) -> bool {
        self.offset > 0 || self.limit.is_some()
    }

    /// Sorts `documents` and applies the window.
    pub fn apply(&self, mut documents: Vec<Document>) -> Vec<Document> {
        if !self.sort.is_empty() {
            documents.sort_by(|a, b| self.compare(a, b));
        }

        let iter = documents.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }

    /// Compares two documents by the sort keys, in order.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for key in &self.sort {
            let lhs = a.get(&key.field).unwrap_or(&Value::Null);
            let rhs = b.get(&key.field).unwrap_or(&Value::Null);
            let ord = match key.direction {
                Direction::Asc => lhs.compare(rhs),
                Direction::Desc => rhs.compare(lhs),
            };
            if ord.is_ne() {
                return ord;
            }
        }
        Ordering::Equal
    }
}
