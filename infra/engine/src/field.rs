//! # Fields
//!
//! A [`Field`] validates one input value on load and formats one attribute on dump.

use crate::error::{INVALID_INPUT, NULL, ValidationError};
use serde_json::{Number, Value};
use std::borrow::Cow;

pub(crate) const INVALID_INTEGER: &str = "Not a valid integer.";
pub(crate) const INVALID_NUMBER: &str = "Not a valid number.";
pub(crate) const INVALID_STRING: &str = "Not a valid string.";
pub(crate) const INVALID_BOOLEAN: &str = "Not a valid boolean.";
pub(crate) const INVALID_LIST: &str = "Not a valid list.";

const TRUTHY: &[&str] = &["t", "true", "on", "y", "yes", "1"];
const FALSY: &[&str] = &["f", "false", "off", "n", "no", "0"];

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Whole numbers. Unless `strict`, integral floats and numeric strings are coerced.
    Integer { strict: bool },
    /// Finite numbers; numeric strings are coerced.
    Float,
    String,
    /// Booleans, plus common truthy and falsy spellings.
    Boolean,
    /// A homogeneous list validated item by item.
    List(Box<Field>),
    /// Any JSON value, passed through untouched.
    Raw,
}

/// A declared schema attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    kind: FieldKind,
    required: bool,
    allow_none: Option<bool>,
    load_default: Option<Value>,
    data_key: Option<String>,
    load_only: bool,
    dump_only: bool,
}

impl Field {
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            allow_none: None,
            load_default: None,
            data_key: None,
            load_only: false,
            dump_only: false,
        }
    }

    #[must_use]
    pub const fn integer() -> Self {
        Self::new(FieldKind::Integer { strict: false })
    }

    #[must_use]
    pub const fn float() -> Self {
        Self::new(FieldKind::Float)
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::new(FieldKind::String)
    }

    #[must_use]
    pub const fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    #[must_use]
    pub fn list(inner: Self) -> Self {
        Self::new(FieldKind::List(Box::new(inner)))
    }

    #[must_use]
    pub const fn raw() -> Self {
        Self::new(FieldKind::Raw)
    }

    /// Rejects integral floats and numeric strings on an integer field.
    #[must_use]
    pub fn strict(mut self) -> Self {
        if let FieldKind::Integer { strict } = &mut self.kind {
            *strict = true;
        }
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn allow_none(mut self, allow: bool) -> Self {
        self.allow_none = Some(allow);
        self
    }

    /// Value substituted when the key is missing from the input.
    #[must_use]
    pub fn load_default(mut self, value: impl Into<Value>) -> Self {
        self.load_default = Some(value.into());
        self
    }

    /// Key used in serialized data instead of the attribute name.
    #[must_use]
    pub fn data_key(mut self, key: impl Into<String>) -> Self {
        self.data_key = Some(key.into());
        self
    }

    #[must_use]
    pub const fn load_only(mut self) -> Self {
        self.load_only = true;
        self
    }

    #[must_use]
    pub const fn dump_only(mut self) -> Self {
        self.dump_only = true;
        self
    }

    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub const fn is_load_only(&self) -> bool {
        self.load_only
    }

    #[must_use]
    pub const fn is_dump_only(&self) -> bool {
        self.dump_only
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.load_default.as_ref()
    }

    /// Returns the serialized key for an attribute named `name`.
    #[must_use]
    pub fn key<'a>(&'a self, name: &'a str) -> &'a str {
        self.data_key.as_deref().unwrap_or(name)
    }

    /// `null` is accepted when explicitly allowed, or when the default itself is `null`.
    #[must_use]
    pub fn allows_none(&self) -> bool {
        self.allow_none.unwrap_or(matches!(self.load_default, Some(Value::Null)))
    }

    /// Validates `value`, recording failures under `path`.
    ///
    /// Returns `None` when a message was recorded.
    pub fn deserialize(&self, value: &Value, path: &str, errors: &mut ValidationError) -> Option<Value> {
        if value.is_null() {
            if self.allows_none() {
                return Some(Value::Null);
            }
            errors.push(path, NULL);
            return None;
        }

        let result = match &self.kind {
            FieldKind::Integer { strict } => coerce_integer(value, *strict),
            FieldKind::Float => coerce_float(value),
            FieldKind::String => match value {
                Value::String(_) => Ok(value.clone()),
                _ => Err(INVALID_STRING),
            },
            FieldKind::Boolean => coerce_boolean(value),
            FieldKind::Raw => Ok(value.clone()),
            FieldKind::List(inner) => {
                let Value::Array(items) = value else {
                    errors.push(path, INVALID_LIST);
                    return None;
                };
                let before = errors.len();
                let out: Vec<Value> = items
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, item)| inner.deserialize(item, &format!("{path}.{idx}"), errors))
                    .collect();
                return (errors.len() == before).then_some(Value::Array(out));
            },
        };

        result.map_err(|message| errors.push(path, message)).ok()
    }

    /// Formats an attribute value for output.
    ///
    /// # Errors
    /// Returns a message when the value cannot be represented by this field.
    pub fn serialize(&self, value: &Value) -> Result<Value, Cow<'static, str>> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match &self.kind {
            FieldKind::Integer { .. } => coerce_integer(value, false).map_err(Cow::Borrowed),
            FieldKind::Float => coerce_float(value).map_err(Cow::Borrowed),
            FieldKind::String => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                Value::Bool(b) => Ok(Value::String(b.to_string())),
                _ => Err(Cow::Borrowed(INVALID_STRING)),
            },
            FieldKind::Boolean => coerce_boolean(value).map_err(Cow::Borrowed),
            FieldKind::Raw => Ok(value.clone()),
            FieldKind::List(inner) => {
                let Value::Array(items) = value else {
                    return Err(Cow::Borrowed(INVALID_LIST));
                };
                items.iter().map(|item| inner.serialize(item)).collect::<Result<_, _>>().map(Value::Array)
            },
        }
    }
}

#[allow(clippy::float_cmp)]
fn coerce_integer(value: &Value, strict: bool) -> Result<Value, &'static str> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::Number(n) if !strict => n
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .and_then(integral_f64)
            .map(Value::Number)
            .ok_or(INVALID_INTEGER),
        Value::String(s) if !strict => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::from)
                .or_else(|_| s.parse::<u64>().map(Number::from))
                .map(Value::Number)
                .map_err(|_| INVALID_INTEGER)
        },
        Value::Number(_) | Value::String(_) | Value::Bool(_) => Err(INVALID_INTEGER),
        _ => Err(INVALID_INPUT),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral_f64(f: f64) -> Option<Number> {
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Number::from(f as i64))
    } else {
        None
    }
}

fn coerce_float(value: &Value) -> Result<Value, &'static str> {
    let f = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(_) => None,
        _ => return Err(INVALID_INPUT),
    };
    f.filter(|f| f.is_finite()).and_then(Number::from_f64).map(Value::Number).ok_or(INVALID_NUMBER)
}

fn coerce_boolean(value: &Value) -> Result<Value, &'static str> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(Value::Bool(true)),
            Some(0) => Ok(Value::Bool(false)),
            _ => Err(INVALID_BOOLEAN),
        },
        Value::String(s) => {
            let lowered = s.to_ascii_lowercase();
            if TRUTHY.contains(&lowered.as_str()) {
                Ok(Value::Bool(true))
            } else if FALSY.contains(&lowered.as_str()) {
                Ok(Value::Bool(false))
            } else {
                Err(INVALID_BOOLEAN)
            }
        },
        _ => Err(INVALID_BOOLEAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load(field: &Field, value: Value) -> Result<Value, ValidationError> {
        let mut errors = ValidationError::default();
        field.deserialize(&value, "f", &mut errors).ok_or(errors)
    }

    #[test]
    fn integer_coerces_unless_strict() {
        assert_eq!(load(&Field::integer(), json!("42")).expect("string"), json!(42));
        assert_eq!(load(&Field::integer(), json!(3.0)).expect("integral float"), json!(3));
        assert!(load(&Field::integer(), json!(3.5)).is_err());
        assert!(load(&Field::integer(), json!(true)).is_err());
        assert!(load(&Field::integer().strict(), json!("42")).is_err());
    }

    #[test]
    fn null_needs_permission() {
        let err = load(&Field::string(), Value::Null).expect_err("null rejected");
        assert_eq!(err.messages_for("f"), vec![NULL]);
        assert_eq!(load(&Field::string().allow_none(true), Value::Null).expect("allowed"), Value::Null);
        assert_eq!(load(&Field::string().load_default(Value::Null), Value::Null).expect("implied"), Value::Null);
    }

    #[test]
    fn list_reports_item_paths() {
        let field = Field::list(Field::integer());
        let err = load(&field, json!([1, "x", 3, "y"])).expect_err("bad items");
        assert_eq!(err.messages_for("f.1"), vec![INVALID_INTEGER]);
        assert_eq!(err.messages_for("f.3"), vec![INVALID_INTEGER]);
        assert_eq!(load(&field, json!(["1", 2])).expect("coerced"), json!([1, 2]));
    }

    #[test]
    fn boolean_spellings() {
        assert_eq!(load(&Field::boolean(), json!("Yes")).expect("truthy"), json!(true));
        assert_eq!(load(&Field::boolean(), json!(0)).expect("falsy"), json!(false));
        assert!(load(&Field::boolean(), json!("maybe")).is_err());
    }

    #[test]
    fn float_rejects_non_numbers() {
        assert_eq!(load(&Field::float(), json!("1.5")).expect("string"), json!(1.5));
        assert!(load(&Field::float(), json!("nan")).is_err());
        assert!(load(&Field::float(), json!({})).is_err());
    }

    #[test]
    fn serialize_formats_strings() {
        assert_eq!(Field::string().serialize(&json!(7)).expect("number"), json!("7"));
        assert!(Field::integer().serialize(&json!("seven")).is_err());
    }
}
