//! Conversion between host-native values and runtime values.
//!
//! [`HostValue`] is the plain-data shape the embedding application sees.
//! Going to the host, callables and instances degrade to their inspect
//! string. Coming from the host, a float with an exact integral value is
//! narrowed to an int, since many host encodings (JSON among them) do not
//! keep the distinction.

use std::collections::HashMap;

use crate::value::{DictMap, Value};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum HostValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<HostValue>),
    Map(HashMap<String, HostValue>),
}

/// Runtime value to host value.
pub fn to_host(value: &Value) -> HostValue {
    match value {
        Value::Null => HostValue::Null,
        Value::Bool(b) => HostValue::Bool(*b),
        Value::Int(n) => HostValue::Int(*n),
        Value::Float(f) => HostValue::Float(*f),
        Value::Str(s) => HostValue::String(s.to_string()),
        Value::List(items) => HostValue::List(items.read().iter().map(to_host).collect()),
        Value::Tuple(items) => HostValue::List(items.iter().map(to_host).collect()),
        Value::Dict(map) => HostValue::Map(
            map.read()
                .iter()
                .map(|(k, v)| (k.clone(), to_host(v)))
                .collect(),
        ),
        Value::Error(err) => HostValue::String(err.message.clone()),
        Value::Instance(_)
        | Value::Class(_)
        | Value::Function(_)
        | Value::Builtin(_)
        | Value::BoundMethod(_) => HostValue::String(value.inspect()),
    }
}

/// Host value to runtime value.
pub fn to_runtime(value: HostValue) -> Value {
    match value {
        HostValue::Null => Value::Null,
        HostValue::Bool(b) => Value::Bool(b),
        HostValue::Int(n) => Value::Int(n),
        HostValue::Float(f) => narrow_float(f),
        HostValue::String(s) => Value::string(s),
        HostValue::List(items) => Value::list(items.into_iter().map(to_runtime).collect()),
        HostValue::Map(map) => {
            let mut entries: Vec<(String, HostValue)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::dict(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, to_runtime(v)))
                    .collect::<DictMap>(),
            )
        }
    }
}

/// Finite floats with no fractional part that fit in `i64` become ints.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "range is checked before the cast"
)]
fn narrow_float(f: f64) -> Value {
    const LOWER: f64 = i64::MIN as f64;
    const UPPER: f64 = i64::MAX as f64;
    if f.is_finite() && f.fract() == 0.0 && (LOWER..UPPER).contains(&f) {
        Value::Int(f as i64)
    } else {
        Value::Float(f)
    }
}

impl From<&Value> for HostValue {
    fn from(value: &Value) -> Self {
        to_host(value)
    }
}

impl From<HostValue> for Value {
    fn from(value: HostValue) -> Self {
        to_runtime(value)
    }
}

impl From<()> for HostValue {
    fn from((): ()) -> Self {
        HostValue::Null
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        HostValue::Int(i64::from(n))
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        HostValue::Int(n)
    }
}

impl From<u32> for HostValue {
    fn from(n: u32) -> Self {
        HostValue::Int(i64::from(n))
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(items: Vec<T>) -> Self {
        HostValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<HostValue>> From<HashMap<String, T>> for HostValue {
    fn from(map: HashMap<String, T>) -> Self {
        HostValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::Null, Into::into)
    }
}

impl HostValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HostValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[expect(clippy::cast_precision_loss, reason = "int widens to float")]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Float(f) => Some(*f),
            HostValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}
