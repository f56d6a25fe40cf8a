//! Comparison support for [`Value`].
//!
//! Two flavours of comparison are provided. [`Value::compare`] is a total
//! order used to sort documents: nulls sort first, numbers compare across the
//! integer/float boundary and unrelated variants are ordered by variant rank.
//! [`Value::partial_compare`] is used by range predicates and only yields an
//! ordering for values of comparable types.

use super::Value;

use std::cmp::Ordering;

macro_rules! impl_value_eq {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl PartialEq<$ty> for Value {
                fn eq(&self, other: &$ty) -> bool {
                    matches!(self, Value::$variant(val) if val == other)
                }
            }

            impl PartialEq<Value> for $ty {
                fn eq(&self, other: &Value) -> bool {
                    other.eq(self)
                }
            }
        )*
    };
}

impl_value_eq! {
    bool => Bool,
    i64 => I64,
    f64 => F64,
    String => String,
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, Value::String(val) if val == other)
    }
}

impl PartialEq<Value> for &str {
    fn eq(&self, other: &Value) -> bool {
        other.eq(self)
    }
}

impl PartialEq<i32> for Value {
    fn eq(&self, other: &i32) -> bool {
        matches!(self, Value::I64(val) if *val == i64::from(*other))
    }
}

impl Value {
    /// Total order over all values.
    pub fn compare(&self, other: &Value) -> Ordering {
        use Value::*;

        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (I64(a), I64(b)) => a.cmp(b),
            (F64(a), F64(b)) => a.total_cmp(b),
            (I64(a), F64(b)) => (*a as f64).total_cmp(b),
            (F64(a), I64(b)) => a.total_cmp(&(*b as f64)),
            (String(a), String(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            (List(a), List(b)) => compare_seq(a.iter(), b.iter()),
            (Ref(a), Ref(b)) => a.schema.cmp(&b.schema).then_with(|| a.key.compare(&b.key)),
            (Map(a), Map(b)) => a.len().cmp(&b.len()).then_with(|| {
                a.iter()
                    .zip(b.iter())
                    .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| va.compare(vb)))
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            }),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Ordering for range predicates. Returns `None` when either side is null
    /// or the two values are not of comparable types.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        if self.is_null() || other.is_null() || self.rank() != other.rank() {
            return None;
        }

        Some(self.compare(other))
    }

    /// Equality used by query predicates: numbers compare by magnitude
    /// regardless of representation, everything else structurally.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::I64(_), Value::F64(_)) | (Value::F64(_), Value::I64(_)) => {
                self.compare(other).is_eq()
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.loose_eq(b))
            }
            _ => self == other,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::I64(_) | Value::F64(_) => 2,
            Value::String(_) => 3,
            Value::DateTime(_) => 4,
            Value::List(_) => 5,
            Value::Ref(_) => 6,
            Value::Map(_) => 7,
        }
    }
}

fn compare_seq<'a>(
    mut a: impl Iterator<Item = &'a Value>,
    mut b: impl Iterator<Item = &'a Value>,
) -> Ordering {
    loop {
        match (a.next(), b.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => match a.compare(b) {
                Ordering::Equal => continue,
                ord => return ord,
            },
        }
    }
}
