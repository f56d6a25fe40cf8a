use crate::{stmt::Value, Error, Result, ValidationKind};

use std::{fmt, sync::Arc};

/// Signature of a caller-supplied validator. The returned message is used as
/// the validation error message.
pub type CustomFn = dyn Fn(&Value) -> std::result::Result<(), String> + Send + Sync;

/// A check applied to a non-null field value after its type check.
///
/// Validators on a field run in declaration order; the first failure wins.
#[derive(Clone)]
pub enum Validator {
    /// Minimum number of characters (strings) or elements (lists)
    MinLength(usize),

    /// Maximum number of characters (strings) or elements (lists)
    MaxLength(usize),

    /// Inclusive lower bound
    MinValue(Value),

    /// Inclusive upper bound
    MaxValue(Value),

    /// The string must contain a match
    Regex(regex::Regex),

    /// The string must be a URL with one of the given schemes. A value with
    /// no scheme is checked as if it started with `http://`.
    Url(Vec<String>),

    Custom(Arc<CustomFn>),
}

const DEFAULT_URL_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps"];

impl Validator {
    pub fn min_length(min: usize) -> Self {
        Self::MinLength(min)
    }

    pub fn max_length(max: usize) -> Self {
        Self::MaxLength(max)
    }

    pub fn min_value(min: impl Into<Value>) -> Self {
        Self::MinValue(min.into())
    }

    pub fn max_value(max: impl Into<Value>) -> Self {
        Self::MaxValue(max.into())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        let re = regex::Regex::new(pattern)
            .map_err(|err| crate::err!("invalid validator pattern `{pattern}`: {err}"))?;
        Ok(Self::Regex(re))
    }

    pub fn url() -> Self {
        Self::Url(DEFAULT_URL_SCHEMES.iter().map(|s| s.to_string()).collect())
    }

    pub fn url_with_schemes<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Url(schemes.into_iter().map(Into::into).collect())
    }

    pub fn custom(
        f: impl Fn(&Value) -> std::result::Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self::Custom(Arc::new(f))
    }

    pub fn check(&self, field: &str, value: &Value) -> Result<()> {
        let fail = |kind, message: String| Err(Error::validation(kind, field, value.clone(), message));

        match self {
            Self::MinLength(min) => match length(value) {
                Some(len) if len < *min => fail(
                    ValidationKind::Length,
                    format!("length {len} is shorter than minimum {min}"),
                ),
                _ => Ok(()),
            },
            Self::MaxLength(max) => match length(value) {
                Some(len) if len > *max => fail(
                    ValidationKind::Length,
                    format!("length {len} is longer than maximum {max}"),
                ),
                _ => Ok(()),
            },
            Self::MinValue(min) => match value.partial_compare(min) {
                Some(ord) if ord.is_lt() => {
                    fail(ValidationKind::Value, format!("{value} is less than {min}"))
                }
                _ => Ok(()),
            },
            Self::MaxValue(max) => match value.partial_compare(max) {
                Some(ord) if ord.is_gt() => {
                    fail(ValidationKind::Value, format!("{value} is greater than {max}"))
                }
                _ => Ok(()),
            },
            Self::Regex(re) => match value.as_str() {
                Some(s) if !re.is_match(s) => fail(
                    ValidationKind::Regex,
                    format!("{value} does not match `{}`", re.as_str()),
                ),
                _ => Ok(()),
            },
            Self::Url(schemes) => match value.as_str() {
                Some(s) if !is_url(s, schemes) => {
                    fail(ValidationKind::Url, format!("{value} is not a valid URL"))
                }
                _ => Ok(()),
            },
            Self::Custom(f) => match f(value) {
                Ok(()) => Ok(()),
                Err(message) => fail(ValidationKind::Custom, message),
            },
        }
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::List(items) => Some(items.len()),
        _ => None,
    }
}

fn is_url(s: &str, schemes: &[String]) -> bool {
    let candidate = if s.contains("://") {
        s.to_string()
    } else {
        format!("http://{s}")
    };

    match url::Url::parse(&candidate) {
        Ok(url) => {
            schemes.iter().any(|scheme| scheme == url.scheme())
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength(n) => f.debug_tuple("MinLength").field(n).finish(),
            Self::MaxLength(n) => f.debug_tuple("MaxLength").field(n).finish(),
            Self::MinValue(v) => f.debug_tuple("MinValue").field(v).finish(),
            Self::MaxValue(v) => f.debug_tuple("MaxValue").field(v).finish(),
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::Url(schemes) => f.debug_tuple("Url").field(schemes).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
