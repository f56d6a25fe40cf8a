use crate::{stmt::Value, Error, Result, ValidationKind};

use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveTy {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,

    /// A string-keyed map of arbitrary values.
    Dictionary,
}

impl PrimitiveTy {
    /// Rejects values of the wrong variant. Booleans are never integers.
    pub fn check_type(self, field: &str, value: &Value) -> Result<()> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(Error::validation(
                ValidationKind::Type,
                field,
                value.clone(),
                format!("expected {self}, got {}", value.type_name()),
            ))
        }
    }

    fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::String, Value::String(_))
                | (Self::Integer, Value::I64(_))
                | (Self::Float, Value::F64(_))
                | (Self::Boolean, Value::Bool(_))
                | (Self::DateTime, Value::DateTime(_))
                | (Self::Dictionary, Value::Map(_))
        )
    }

    /// True for the types a primary key may have.
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::Dictionary)
    }

    /// Casts a key given in another representation to this type: numbers
    /// and strings are parsed or formatted, references give up their key.
    /// Values already of this type pass through.
    pub fn coerce(self, value: Value) -> Result<Value> {
        let value = match value {
            Value::Ref(reference) => *reference.key,
            value => value,
        };

        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (Self::String, Value::I64(v)) => Ok(Value::String(v.to_string())),
            (Self::String, Value::F64(v)) => Ok(Value::String(v.to_string())),
            (Self::String, Value::Bool(v)) => Ok(Value::String(v.to_string())),
            (Self::Integer, Value::String(s)) => match s.trim().parse() {
                Ok(v) => Ok(Value::I64(v)),
                Err(_) => Err(Error::type_conversion(Value::String(s), "I64")),
            },
            (Self::Float, Value::I64(v)) => Ok(Value::F64(v as f64)),
            (Self::Float, Value::String(s)) => match s.trim().parse() {
                Ok(v) => Ok(Value::F64(v)),
                Err(_) => Err(Error::type_conversion(Value::String(s), "F64")),
            },
            (Self::Boolean, Value::String(s)) => match s.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(Error::type_conversion(Value::String(s), "Bool")),
            },
            (Self::DateTime, Value::String(s)) => match DateTime::parse_from_rfc3339(&s) {
                Ok(dt) => Ok(Value::DateTime(dt.with_timezone(&Utc))),
                Err(_) => Err(Error::type_conversion(Value::String(s), "DateTime")),
            },
            (ty, value) if ty.accepts(&value) => Ok(value),
            (ty, value) => Err(Error::type_conversion(value, ty.type_name())),
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "I64",
            Self::Float => "F64",
            Self::Boolean => "Bool",
            Self::DateTime => "DateTime",
            Self::Dictionary => "Map",
        }
    }
}

impl fmt::Display for PrimitiveTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Dictionary => "dictionary",
        })
    }
}
