use super::Translator;
use crate::{stmt::Value, Error, Result};

use chrono::{DateTime, Utc};

/// Stores datetimes as RFC 3339 strings, everything else natively. Suitable
/// for backends persisting JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTranslator;

impl Translator for JsonTranslator {
    fn to_datetime(&self, value: Value) -> Result<Value> {
        match value {
            Value::DateTime(dt) => Ok(Value::String(dt.to_rfc3339())),
            other => Err(Error::type_conversion(other, "DateTime")),
        }
    }

    fn from_datetime(&self, value: Value) -> Result<Value> {
        match value {
            Value::String(s) => Ok(Value::DateTime(
                DateTime::parse_from_rfc3339(&s)?.with_timezone(&Utc),
            )),
            Value::DateTime(dt) => Ok(Value::DateTime(dt)),
            other => Err(Error::type_conversion(other, "DateTime")),
        }
    }
}
