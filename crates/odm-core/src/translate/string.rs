use super::Translator;
use crate::{stmt::Value, Error, Result};

use chrono::{DateTime, Utc};

/// Stores every scalar as a string. Null is stored as `"none"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringTranslator;

const NULL: &str = "none";

fn expect_string(value: Value, ty: &'static str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(Error::type_conversion(other, ty)),
    }
}

impl Translator for StringTranslator {
    fn null_value(&self) -> Value {
        Value::String(NULL.to_string())
    }

    fn to_integer(&self, value: Value) -> Result<Value> {
        match value {
            Value::I64(v) => Ok(Value::String(v.to_string())),
            other => Err(Error::type_conversion(other, "String")),
        }
    }

    fn from_integer(&self, value: Value) -> Result<Value> {
        Ok(Value::I64(expect_string(value, "I64")?.parse()?))
    }

    fn to_float(&self, value: Value) -> Result<Value> {
        match value {
            Value::F64(v) => Ok(Value::String(v.to_string())),
            other => Err(Error::type_conversion(other, "String")),
        }
    }

    fn from_float(&self, value: Value) -> Result<Value> {
        Ok(Value::F64(expect_string(value, "F64")?.parse()?))
    }

    fn to_boolean(&self, value: Value) -> Result<Value> {
        match value {
            Value::Bool(v) => Ok(Value::String(v.to_string())),
            other => Err(Error::type_conversion(other, "String")),
        }
    }

    fn from_boolean(&self, value: Value) -> Result<Value> {
        match expect_string(value, "Bool")?.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => Err(Error::type_conversion(Value::from(other), "Bool")),
        }
    }

    fn to_datetime(&self, value: Value) -> Result<Value> {
        match value {
            Value::DateTime(dt) => Ok(Value::String(dt.to_rfc3339())),
            other => Err(Error::type_conversion(other, "String")),
        }
    }

    fn from_datetime(&self, value: Value) -> Result<Value> {
        let s = expect_string(value, "DateTime")?;
        Ok(Value::DateTime(
            DateTime::parse_from_rfc3339(&s)?.with_timezone(&Utc),
        ))
    }
}
