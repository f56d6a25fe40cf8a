use super::Value;

use std::hash::{Hash, Hasher};

/// A [`Value`] usable as a hash map key.
///
/// Floats hash and compare by bit pattern so the wrapper can satisfy `Eq`.
/// Negative zero is folded into positive zero.
#[derive(Debug, Clone)]
pub struct ValueKey(Value);

impl ValueKey {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for ValueKey {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&Value> for ValueKey {
    fn from(value: &Value) -> Self {
        Self(value.clone())
    }
}

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        key_eq(&self.0, &other.0)
    }
}

impl Eq for ValueKey {}

impl Hash for ValueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}

fn float_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

fn key_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::F64(a), Value::F64(b)) => float_bits(*a) == float_bits(*b),
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| key_eq(a, b))
        }
        (Value::Ref(a), Value::Ref(b)) => a.schema == b.schema && key_eq(&a.key, &b.key),
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|((ka, va), (kb, vb))| ka == kb && key_eq(va, vb))
        }
        _ => a == b,
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);

    match value {
        Value::Null => {}
        Value::Bool(v) => v.hash(state),
        Value::I64(v) => v.hash(state),
        Value::F64(v) => float_bits(*v).hash(state),
        Value::String(v) => v.hash(state),
        Value::DateTime(v) => v.hash(state),
        Value::List(items) => {
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Ref(v) => {
            v.schema.hash(state);
            hash_value(&v.key, state);
        }
        Value::Map(map) => {
            map.len().hash(state);
            for (key, value) in map {
                key.hash(state);
                hash_value(value, state);
            }
        }
    }
}
