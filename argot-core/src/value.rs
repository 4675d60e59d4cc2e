//! Typed argument values and the coercions that produce them.

use std::{collections::BTreeMap, fmt, sync::Arc};

use thiserror::Error;

/// A typed value flowing between the token parser and a callable.
///
/// Every value has a text form through [`fmt::Display`]; dispatch results
/// are reported as those text forms.
///
/// # Examples
/// ```
/// use argot_core::Value;
///
/// assert_eq!(Value::from(42).to_string(), "42");
/// assert_eq!(Value::from("ok").to_string(), "ok");
/// assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unconverted token text.
    Text(String),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean, produced by flags.
    Bool(bool),
    /// Ordered sequence, produced by variadic positionals.
    List(Vec<Value>),
    /// Keyed mapping.
    Map(BTreeMap<String, Value>),
    /// Absent optional value.
    Null,
}

impl Value {
    /// Returns the text when this is a [`Value::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the integer when this is a [`Value::Int`].
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the number when this is a [`Value::Float`] or [`Value::Int`].
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "integers are widened for arithmetic convenience only"
    )]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Returns the boolean when this is a [`Value::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the elements when this is a [`Value::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<BTreeMap<String, T>> for Value {
    fn from(entries: BTreeMap<String, T>) -> Self {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key, value.into()))
                .collect(),
        )
    }
}

/// Raised when a token cannot be converted by a [`Coercion`].
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid {expected} value `{raw}`")]
pub struct CoercionError {
    expected: String,
    raw: String,
}

impl CoercionError {
    /// Builds an error for `raw`, which was expected to be an `expected`.
    #[must_use]
    pub fn new(expected: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            raw: raw.into(),
        }
    }

    /// Description of the expected kind of value.
    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// The rejected token.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

type CoerceFn = dyn Fn(&str) -> Result<Value, CoercionError> + Send + Sync;

/// A named conversion from token text to a typed [`Value`].
///
/// # Examples
/// ```
/// use argot_core::{Coercion, Value};
///
/// let int = Coercion::integer();
/// assert_eq!(int.apply("7")?, Value::Int(7));
/// assert!(int.apply("seven").is_err());
///
/// let upper = Coercion::new("upper", |raw| Ok(Value::from(raw.to_uppercase())));
/// assert_eq!(upper.apply("hi")?, Value::from("HI"));
/// # Ok::<(), argot_core::CoercionError>(())
/// ```
#[derive(Clone)]
pub struct Coercion {
    name: Arc<str>,
    apply: Arc<CoerceFn>,
}

impl Coercion {
    /// Wraps `apply` under a display `name`.
    pub fn new<F>(name: impl Into<Arc<str>>, apply: F) -> Self
    where
        F: Fn(&str) -> Result<Value, CoercionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    /// Passes the token through unchanged as [`Value::Text`].
    #[must_use]
    pub fn text() -> Self {
        Self::new("text", |raw| Ok(Value::from(raw)))
    }

    /// Parses a signed 64-bit integer.
    #[must_use]
    pub fn integer() -> Self {
        Self::new("integer", |raw| {
            raw.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| CoercionError::new("integer", raw))
        })
    }

    /// Parses a 64-bit float.
    #[must_use]
    pub fn float() -> Self {
        Self::new("float", |raw| {
            raw.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| CoercionError::new("float", raw))
        })
    }

    /// Accepts `true/false`, `yes/no`, `on/off` and `1/0`, ignoring case.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new("boolean", |raw| {
            match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
                _ => Err(CoercionError::new("boolean", raw)),
            }
        })
    }

    /// Display name of the coercion.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Converts `raw`.
    ///
    /// # Errors
    /// Returns [`CoercionError`] when the token is not acceptable.
    pub fn apply(&self, raw: &str) -> Result<Value, CoercionError> {
        (self.apply)(raw)
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Coercion").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(Value::from(42), "42")]
    #[case(Value::from("ok"), "ok")]
    #[case(Value::from(true), "true")]
    #[case(Value::from(1.5), "1.5")]
    #[case(Value::Null, "null")]
    #[case(Value::from(vec!["a", "b"]), "[a, b]")]
    fn values_render_text_forms(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn maps_render_sorted_entries() {
        let mut entries = BTreeMap::new();
        entries.insert("b".to_owned(), 2);
        entries.insert("a".to_owned(), 1);
        assert_eq!(Value::from(entries).to_string(), "{a: 1, b: 2}");
    }

    #[rstest]
    #[case("yes", true)]
    #[case("OFF", false)]
    #[case(" 1 ", true)]
    fn boolean_accepts_common_spellings(#[case] raw: &str, #[case] expected: bool) {
        let value = Coercion::boolean().apply(raw).expect("spelling must parse");
        assert_eq!(value, Value::Bool(expected));
    }

    #[test]
    fn integer_reports_rejected_token() {
        let err = Coercion::integer()
            .apply("4x")
            .expect_err("non-numeric input must fail");
        assert_eq!(err.expected(), "integer");
        assert_eq!(err.raw(), "4x");
        assert_eq!(err.to_string(), "invalid integer value `4x`");
    }

    #[test]
    fn float_widens_integers_on_read() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::from("3").as_float(), None);
    }
}
