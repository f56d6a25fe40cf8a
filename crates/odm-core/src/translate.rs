mod json;
pub use json::JsonTranslator;

mod string;
pub use string::StringTranslator;

use crate::{schema::PrimitiveTy, stmt::Value, Result};

use std::fmt::Debug;

/// Converts primitive values between their in-memory form and the form a
/// backend stores.
///
/// Every per-type pair falls back to `to_default`/`from_default`, which pass
/// values through unchanged.
pub trait Translator: Debug + Send + Sync + 'static {
    /// The backend's representation of an absent value.
    fn null_value(&self) -> Value {
        Value::Null
    }

    fn to_default(&self, value: Value) -> Result<Value> {
        Ok(value)
    }

    fn from_default(&self, value: Value) -> Result<Value> {
        Ok(value)
    }

    fn to_string(&self, value: Value) -> Result<Value> {
        self.to_default(value)
    }

    fn from_string(&self, value: Value) -> Result<Value> {
        self.from_default(value)
    }

    fn to_integer(&self, value: Value) -> Result<Value> {
        self.to_default(value)
    }

    fn from_integer(&self, value: Value) -> Result<Value> {
        self.from_default(value)
    }

    fn to_float(&self, value: Value) -> Result<Value> {
        self.to_default(value)
    }

    fn from_float(&self, value: Value) -> Result<Value> {
        self.from_default(value)
    }

    fn to_boolean(&self, value: Value) -> Result<Value> {
        self.to_default(value)
    }

    fn from_boolean(&self, value: Value) -> Result<Value> {
        self.from_default(value)
    }

    fn to_datetime(&self, value: Value) -> Result<Value> {
        self.to_default(value)
    }

    fn from_datetime(&self, value: Value) -> Result<Value> {
        self.from_default(value)
    }

    fn to_dictionary(&self, value: Value) -> Result<Value> {
        self.to_default(value)
    }

    fn from_dictionary(&self, value: Value) -> Result<Value> {
        self.from_default(value)
    }

    fn to_storage(&self, ty: PrimitiveTy, value: Value) -> Result<Value> {
        match ty {
            PrimitiveTy::String => self.to_string(value),
            PrimitiveTy::Integer => self.to_integer(value),
            PrimitiveTy::Float => self.to_float(value),
            PrimitiveTy::Boolean => self.to_boolean(value),
            PrimitiveTy::DateTime => self.to_datetime(value),
            PrimitiveTy::Dictionary => self.to_dictionary(value),
        }
    }

    fn from_storage(&self, ty: PrimitiveTy, value: Value) -> Result<Value> {
        match ty {
            PrimitiveTy::String => self.from_string(value),
            PrimitiveTy::Integer => self.from_integer(value),
            PrimitiveTy::Float => self.from_float(value),
            PrimitiveTy::Boolean => self.from_boolean(value),
            PrimitiveTy::DateTime => self.from_datetime(value),
            PrimitiveTy::Dictionary => self.from_dictionary(value),
        }
    }
}

/// Stores values in their native form.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTranslator;

impl Translator for DefaultTranslator {}
