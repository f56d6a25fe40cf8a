mod primitive;
pub use primitive::PrimitiveTy;

use super::{Registry, Validator};
use crate::{
    stmt::{Value, ValueRef},
    Error, Result, Translator, ValidationKind,
};

use chrono::Utc;
use std::{fmt, sync::Arc};

/// One attribute of a schema.
#[derive(Debug, Clone)]
pub struct Field {
    /// The field name, unique within the schema.
    pub name: String,

    /// Scalar, list or reference.
    pub ty: FieldTy,

    /// True if this field holds the record's primary key.
    pub primary: bool,

    /// True if null is rejected at validation time.
    pub required: bool,

    /// False if application code may not assign the field.
    pub editable: bool,

    /// Hint to the backend that the field is queried often.
    pub index: bool,

    /// Applied lazily the first time a record reads the field.
    pub default: Option<FieldDefault>,

    /// Checks run, in order, after the type check.
    pub validators: Vec<Validator>,

    /// Set to the current time before every save.
    pub auto_now: bool,
}

#[derive(Debug, Clone)]
pub enum FieldTy {
    Primitive(PrimitiveTy),

    /// A list of values of the wrapped field's kind, with validators applied
    /// to the list as a whole.
    List(Box<Field>, Vec<Validator>),

    Foreign(ForeignField),
    AbstractForeign(AbstractForeignField),
}

/// Reference to the primary key of a record of a fixed schema.
#[derive(Debug, Clone)]
pub struct ForeignField {
    pub target: String,
    pub backref: Option<String>,
}

/// Reference to a record of any registered schema.
#[derive(Debug, Clone, Default)]
pub struct AbstractForeignField {
    pub backref: Option<String>,
}

#[derive(Clone)]
pub enum FieldDefault {
    Value(Value),
    Generate(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldTy) -> Self {
        Self {
            name: name.into(),
            ty,
            primary: false,
            required: false,
            editable: true,
            index: false,
            default: None,
            validators: vec![],
            auto_now: false,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldTy::Primitive(PrimitiveTy::String))
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldTy::Primitive(PrimitiveTy::Integer))
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldTy::Primitive(PrimitiveTy::Float))
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldTy::Primitive(PrimitiveTy::Boolean))
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldTy::Primitive(PrimitiveTy::DateTime))
    }

    /// A map field. Defaults to an empty map.
    pub fn dictionary(name: impl Into<String>) -> Self {
        Self::new(name, FieldTy::Primitive(PrimitiveTy::Dictionary))
            .default(Value::Map(Default::default()))
    }

    pub fn foreign(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldTy::Foreign(ForeignField {
                target: target.into(),
                backref: None,
            }),
        )
    }

    pub fn abstract_foreign(name: impl Into<String>) -> Self {
        Self::new(name, FieldTy::AbstractForeign(AbstractForeignField::default()))
    }

    /// Marks the field as the primary key. Primary fields are indexed.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.index = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    pub fn default_with(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(FieldDefault::Generate(Arc::new(f)));
        self
    }

    /// Adds a validator. On a list field the validator applies to the list as
    /// a whole; validators added before [`Field::list`] apply per element.
    pub fn validate(mut self, validator: Validator) -> Self {
        match &mut self.ty {
            FieldTy::List(_, validators) => validators.push(validator),
            _ => self.validators.push(validator),
        }
        self
    }

    /// Names the backreference mirrored on referenced records. Has no effect
    /// on fields that do not hold references.
    pub fn backref(mut self, name: impl Into<String>) -> Self {
        self.set_backref(name.into());
        self
    }

    fn set_backref(&mut self, name: String) {
        match &mut self.ty {
            FieldTy::Foreign(foreign) => foreign.backref = Some(name),
            FieldTy::AbstractForeign(foreign) => foreign.backref = Some(name),
            FieldTy::List(item, _) => item.set_backref(name),
            FieldTy::Primitive(_) => {}
        }
    }

    /// Sets the field to the current time before every save. The field
    /// becomes non-editable.
    pub fn auto_now(mut self) -> Self {
        self.auto_now = true;
        self.editable = false;
        self
    }

    /// Defaults the field to the time the record is first read. The field
    /// becomes non-editable.
    pub fn auto_now_add(mut self) -> Self {
        self.default = Some(FieldDefault::Generate(Arc::new(|| Value::DateTime(Utc::now()))));
        self.editable = false;
        self
    }

    /// Wraps this field into a list field of the same name.
    ///
    /// The list inherits the name and the `editable`/`index` flags. The
    /// element keeps its own validators, default and `required` flag; the
    /// list itself defaults to the empty list.
    pub fn list(self) -> Self {
        let (editable, index) = (self.editable, self.index);
        let mut list = Field::new(self.name.clone(), FieldTy::List(Box::new(self), vec![]));
        list.editable = editable;
        list.index = index;
        list
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_list(&self) -> bool {
        matches!(self.ty, FieldTy::List(..))
    }

    /// The element field of a list field.
    pub fn list_item(&self) -> Option<&Field> {
        match &self.ty {
            FieldTy::List(item, _) => Some(item),
            _ => None,
        }
    }

    /// True for reference fields and lists of reference fields.
    pub fn is_foreign(&self) -> bool {
        match &self.ty {
            FieldTy::Foreign(_) | FieldTy::AbstractForeign(_) => true,
            FieldTy::List(item, _) => item.is_foreign(),
            FieldTy::Primitive(_) => false,
        }
    }

    /// The fixed target schema of a reference field, or of the elements of a
    /// list of references.
    pub fn foreign_target(&self) -> Option<&str> {
        match &self.ty {
            FieldTy::Foreign(foreign) => Some(&foreign.target),
            FieldTy::List(item, _) => item.foreign_target(),
            _ => None,
        }
    }

    pub fn backref_name(&self) -> Option<&str> {
        match &self.ty {
            FieldTy::Foreign(foreign) => foreign.backref.as_deref(),
            FieldTy::AbstractForeign(foreign) => foreign.backref.as_deref(),
            FieldTy::List(item, _) => item.backref_name(),
            FieldTy::Primitive(_) => None,
        }
    }

    /// The value a record sees before anything is assigned.
    pub fn default_value(&self) -> Value {
        match &self.default {
            Some(FieldDefault::Value(value)) => value.clone(),
            Some(FieldDefault::Generate(f)) => f(),
            None if self.is_list() => Value::List(vec![]),
            None => Value::Null,
        }
    }

    /// The value written by the pipeline right before a save, if any.
    pub fn before_save_value(&self) -> Option<Value> {
        self.auto_now.then(|| Value::DateTime(Utc::now()))
    }

    /// Checks an in-memory value.
    ///
    /// Null passes unless the field is required. Lists check every element
    /// against the element field, then run the list validators.
    pub fn validate_value(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            if self.required {
                return Err(Error::validation(
                    ValidationKind::Required,
                    &self.name,
                    Value::Null,
                    "value is required",
                ));
            }
            return Ok(());
        }

        match &self.ty {
            FieldTy::Primitive(ty) => ty.check_type(&self.name, value)?,
            FieldTy::List(item, validators) => {
                let Value::List(items) = value else {
                    return Err(self.type_error(value, "list"));
                };
                for element in items {
                    item.validate_value(element)?;
                }
                for validator in validators {
                    validator.check(&self.name, value)?;
                }
            }
            FieldTy::Foreign(_) => {
                if matches!(value, Value::List(_) | Value::Map(_) | Value::Ref(_)) {
                    return Err(self.type_error(value, "primary key"));
                }
            }
            FieldTy::AbstractForeign(_) => {
                if !matches!(value, Value::Ref(_)) {
                    return Err(self.type_error(value, "reference"));
                }
            }
        }

        for validator in &self.validators {
            validator.check(&self.name, value)?;
        }

        Ok(())
    }

    fn type_error(&self, value: &Value, expected: &str) -> Error {
        Error::validation(
            ValidationKind::Type,
            &self.name,
            value.clone(),
            format!("expected {expected}, got {}", value.type_name()),
        )
    }

    /// Converts an in-memory value to its storage form.
    pub fn to_storage(
        &self,
        value: &Value,
        translator: &dyn Translator,
        registry: &Registry,
    ) -> Result<Value> {
        if value.is_null() {
            return Ok(translator.null_value());
        }

        match &self.ty {
            FieldTy::Primitive(ty) => translator.to_storage(*ty, value.clone()),
            FieldTy::List(item, _) => match value {
                Value::List(items) => Ok(Value::List(
                    items
                        .iter()
                        .map(|element| item.to_storage(element, translator, registry))
                        .collect::<Result<_>>()?,
                )),
                _ => Err(Error::type_conversion(value.clone(), "List")),
            },
            FieldTy::Foreign(foreign) => registry
                .get(&foreign.target)?
                .primary_field()
                .to_storage(value, translator, registry),
            FieldTy::AbstractForeign(_) => match value {
                Value::Ref(reference) => {
                    let key = registry
                        .get(&reference.schema)?
                        .primary_field()
                        .to_storage(&reference.key, translator, registry)?;
                    Ok(Value::List(vec![key, Value::String(reference.schema.clone())]))
                }
                _ => Err(Error::type_conversion(value.clone(), "Ref")),
            },
        }
    }

    /// Converts a storage-form value back to its in-memory form.
    pub fn from_storage(
        &self,
        value: &Value,
        translator: &dyn Translator,
        registry: &Registry,
    ) -> Result<Value> {
        if value.is_null() || *value == translator.null_value() {
            return Ok(Value::Null);
        }

        match &self.ty {
            FieldTy::Primitive(ty) => translator.from_storage(*ty, value.clone()),
            FieldTy::List(item, _) => match value {
                Value::List(items) => Ok(Value::List(
                    items
                        .iter()
                        .map(|element| item.from_storage(element, translator, registry))
                        .collect::<Result<_>>()?,
                )),
                _ => Err(Error::type_conversion(value.clone(), "List")),
            },
            FieldTy::Foreign(foreign) => registry
                .get(&foreign.target)?
                .primary_field()
                .from_storage(value, translator, registry),
            FieldTy::AbstractForeign(_) => match value.as_list() {
                Some([key, Value::String(schema)]) => {
                    let key = registry
                        .get(schema)?
                        .primary_field()
                        .from_storage(key, translator, registry)?;
                    Ok(Value::Ref(ValueRef::new(schema.clone(), key)))
                }
                _ => Err(Error::type_conversion(value.clone(), "Ref")),
            },
        }
    }

    /// Translates a query argument compared against this field.
    ///
    /// An argument compared against a list field is translated as a single
    /// element, since `eq` on a list means membership. A record reference
    /// compared against anything but an abstract reference field stands for
    /// its primary key.
    pub fn argument_to_storage(
        &self,
        value: &Value,
        translator: &dyn Translator,
        registry: &Registry,
    ) -> Result<Value> {
        match (&self.ty, value) {
            (FieldTy::List(item, _), Value::List(items)) => Ok(Value::List(
                items
                    .iter()
                    .map(|element| item.argument_to_storage(element, translator, registry))
                    .collect::<Result<_>>()?,
            )),
            (FieldTy::List(item, _), value) => item.argument_to_storage(value, translator, registry),
            (FieldTy::AbstractForeign(_), _) => self.to_storage(value, translator, registry),
            (_, Value::Ref(reference)) => self.to_storage(&reference.key, translator, registry),
            _ => self.to_storage(value, translator, registry),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Generate(_) => f.write_str("Generate(..)"),
        }
    }
}
