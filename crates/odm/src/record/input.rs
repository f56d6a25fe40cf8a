use crate::Record;

use chrono::{DateTime, Utc};
use odm_core::{
    schema::{Field, FieldTy, Schema},
    stmt::{Value, ValueRef},
    Error, Result, ValidationKind,
};

/// A value assigned to a record field: a plain value, another record, or a
/// list of either.
#[derive(Debug, Clone)]
pub enum Input {
    Value(Value),
    Record(Record),
    List(Vec<Input>),
}

impl Input {
    /// Converts the input to the in-memory value stored for `field`.
    ///
    /// A record assigned to a reference field is replaced by its primary key
    /// (or by a schema-tagged reference for abstract reference fields). The
    /// record must have been saved.
    pub(crate) fn into_value(self, field: &Field) -> Result<Value> {
        match self {
            Input::Value(value) => Ok(value),
            Input::Record(record) => {
                let (schema, key, loaded) = {
                    let mut state = record.state();
                    if state.detached {
                        return Err(Error::detached_record(state.schema.name()));
                    }
                    (state.schema.clone(), state.primary_key(), state.loaded)
                };

                if let FieldTy::Foreign(foreign) = &field.ty {
                    if !derives_from(&schema, &foreign.target) {
                        return Err(Error::validation(
                            ValidationKind::Type,
                            &field.name,
                            key,
                            format!(
                                "expected a `{}` record, got a `{}` record",
                                foreign.target,
                                schema.name()
                            ),
                        ));
                    }
                }

                let schema = schema.name().to_string();
                if !loaded || key.is_null() {
                    return Err(Error::record_not_loaded(schema));
                }

                Ok(match &field.ty {
                    FieldTy::AbstractForeign(_) => Value::Ref(ValueRef::new(schema, key)),
                    _ => key,
                })
            }
            Input::List(items) => {
                let item = field.list_item().unwrap_or(field);
                Ok(Value::List(
                    items
                        .into_iter()
                        .map(|input| input.into_value(item))
                        .collect::<Result<_>>()?,
                ))
            }
        }
    }
}

/// True if `schema` is `target` or a later version of it.
fn derives_from(schema: &Schema, target: &str) -> bool {
    let mut current = Some(schema);
    while let Some(schema) = current {
        if schema.name() == target {
            return true;
        }
        current = schema.version_of().map(|prior| &**prior);
    }
    false
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Value(value)
    }
}

impl From<Record> for Input {
    fn from(record: Record) -> Self {
        Input::Record(record)
    }
}

impl From<&Record> for Input {
    fn from(record: &Record) -> Self {
        Input::Record(record.clone())
    }
}

impl From<ValueRef> for Input {
    fn from(value: ValueRef) -> Self {
        Input::Value(Value::Ref(value))
    }
}

macro_rules! impl_input_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Input {
                fn from(value: $ty) -> Self {
                    Input::Value(Value::from(value))
                }
            }
        )*
    };
}

impl_input_from_value! {
    bool,
    i32,
    i64,
    u32,
    f64,
    String,
    &String,
    &str,
    DateTime<Utc>,
}

impl<T> From<Vec<T>> for Input
where
    Input: From<T>,
{
    fn from(items: Vec<T>) -> Self {
        Input::List(items.into_iter().map(Input::from).collect())
    }
}

impl<T> From<Option<T>> for Input
where
    Input: From<T>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Input::from(value),
            None => Input::Value(Value::Null),
        }
    }
}
