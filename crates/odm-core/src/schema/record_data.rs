use crate::stmt::Value;

use indexmap::IndexMap;

/// Field values of one record, detached from any live record. Migration
/// transforms read and write through this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordData {
    values: IndexMap<String, Value>,
}

static NULL: Value = Value::Null;

impl RecordData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `field`, or null if it is not set.
    pub fn get(&self, field: &str) -> &Value {
        self.values.get(field).unwrap_or(&NULL)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.values.shift_remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.values
    }
}

impl From<IndexMap<String, Value>> for RecordData {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Value)> for RecordData {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
