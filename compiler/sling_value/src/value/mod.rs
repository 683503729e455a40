//! Runtime values for the Sling interpreter.
//!
//! All heap values are built through factory methods on `Value`; the
//! `Heap<T>` constructor is private to this module. Lists and dicts are
//! shared and mutable behind `parking_lot::RwLock`; every other heap value
//! is immutable once built (instance fields have their own lock).
//!
//! # Coercions
//!
//! `as_string`, `as_int`, `as_float`, `as_bool`, `as_list` and `as_dict`
//! never panic. A value that does not coerce yields a `TypeError` whose
//! message names the expected shape ("must be a string", ...).

mod class;
mod format;
mod function;
mod heap;

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use sling_ir::FunctionDef;

pub use class::{ClassValue, Dunders, InstanceValue, ENTER, EXIT, GETITEM, INIT, SETITEM};
pub use format::format_float;
pub use function::{BoundMethodValue, BuiltinValue, FunctionValue, NativeFn};
pub use heap::Heap;

use crate::context::ExecContext;
use crate::env::EnvRef;
use crate::errors::{not_iterable, type_error, EvalError, EvalResult};
use crate::kwargs::Kwargs;

/// Insertion-ordered string-keyed map used by dicts and instance fields.
pub type DictMap = IndexMap<String, Value>;

/// An exception value: type tag plus message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorValue {
    pub exc_type: String,
    pub message: String,
}

/// Runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Heap<str>),
    /// Ordered, mutable, shared.
    List(Heap<RwLock<Vec<Value>>>),
    /// Ordered, immutable.
    Tuple(Heap<[Value]>),
    /// Insertion-ordered, string-keyed, mutable, shared.
    Dict(Heap<RwLock<DictMap>>),
    Instance(Heap<InstanceValue>),
    Class(Heap<ClassValue>),
    /// Script closure.
    Function(Heap<FunctionValue>),
    /// Host-native function.
    Builtin(Heap<BuiltinValue>),
    Error(Heap<ErrorValue>),
    BoundMethod(Heap<BoundMethodValue>),
}

// Factory methods

impl Value {
    #[inline]
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Heap::from_arc(Arc::from(s.as_ref())))
    }

    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Heap::new(RwLock::new(items)))
    }

    #[inline]
    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Heap::from_arc(Arc::from(items)))
    }

    #[inline]
    pub fn dict(entries: DictMap) -> Self {
        Value::Dict(Heap::new(RwLock::new(entries)))
    }

    pub fn empty_dict() -> Self {
        Value::dict(DictMap::new())
    }

    pub fn instance(class: Arc<ClassValue>) -> Self {
        Value::Instance(Heap::new(InstanceValue::new(class)))
    }

    pub fn class(class: Arc<ClassValue>) -> Self {
        Value::Class(Heap::from_arc(class))
    }

    pub fn function(def: Arc<FunctionDef>, env: EnvRef) -> Self {
        Value::Function(Heap::new(FunctionValue::new(def, env)))
    }

    /// Wrap a host closure as a callable value.
    pub fn builtin<F>(name: impl Into<String>, help: Option<String>, func: F) -> Self
    where
        F: Fn(&ExecContext, Kwargs, Vec<Value>) -> EvalResult + Send + Sync + 'static,
    {
        Value::Builtin(Heap::new(BuiltinValue::new(name, help, Arc::new(func))))
    }

    pub fn error(exc_type: impl Into<String>, message: impl Into<String>) -> Self {
        Value::Error(Heap::new(ErrorValue {
            exc_type: exc_type.into(),
            message: message.into(),
        }))
    }

    pub fn bound_method(
        receiver: Value,
        method: Value,
        owner: Option<Arc<ClassValue>>,
    ) -> Self {
        Value::BoundMethod(Heap::new(BoundMethodValue {
            receiver,
            method,
            owner,
        }))
    }
}

// Inspection

impl Value {
    /// Script-visible type name, as used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Instance(inst) => inst.class().name(),
            Value::Class(_) => "type",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::Error(err) => &err.exc_type,
            Value::BoundMethod(_) => "method",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Builtin(_) | Value::Class(_) | Value::BoundMethod(_)
        )
    }

    /// Truthiness: null, false, zero and empty containers are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.read().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(map) => !map.read().is_empty(),
            _ => true,
        }
    }

    /// Canonical inspection form; strings print raw at top level.
    pub fn inspect(&self) -> String {
        format::inspect(self)
    }

    /// Quoted form, as `repr()` and container elements use.
    pub fn repr(&self) -> String {
        format::repr(self)
    }

    /// Key under which this value is stored in a dict.
    pub fn dict_key(&self) -> Result<String, EvalError> {
        match self {
            Value::Str(s) => Ok(s.to_string()),
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => Ok(self.inspect()),
            other => Err(type_error(format!(
                "unhashable type: '{}'",
                other.type_name()
            ))),
        }
    }
}

// Coercions

impl Value {
    pub fn as_string(&self) -> Result<String, EvalError> {
        match self {
            Value::Str(s) => Ok(s.to_string()),
            Value::Class(class) => Ok(class.name().to_string()),
            Value::Error(err) => Ok(err.message.clone()),
            _ => Err(type_error("must be a string")),
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "float to int coercion truncates toward zero"
    )]
    pub fn as_int(&self) -> Result<i64, EvalError> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            _ => Err(type_error("must be an integer")),
        }
    }

    #[expect(clippy::cast_precision_loss, reason = "int to float widening")]
    pub fn as_float(&self) -> Result<f64, EvalError> {
        match self {
            Value::Int(n) => Ok(*n as f64),
            Value::Float(f) => Ok(*f),
            _ => Err(type_error("must be a number")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Int(n) => Ok(*n != 0),
            Value::Float(f) => Ok(*f != 0.0),
            Value::Str(s) => Ok(!s.is_empty()),
            Value::Null => Ok(false),
            Value::List(_) | Value::Tuple(_) | Value::Dict(_) => Ok(self.is_truthy()),
            _ => Err(type_error("must be a boolean")),
        }
    }

    /// Copy of the elements of a list or tuple.
    pub fn as_list(&self) -> Result<Vec<Value>, EvalError> {
        match self {
            Value::List(items) => Ok(items.read().clone()),
            Value::Tuple(items) => Ok(items.to_vec()),
            _ => Err(type_error("must be a list")),
        }
    }

    /// Copy of the entries of a dict.
    pub fn as_dict(&self) -> Result<DictMap, EvalError> {
        match self {
            Value::Dict(map) => Ok(map.read().clone()),
            _ => Err(type_error("must be a dict")),
        }
    }
}

// Iteration

impl Value {
    /// Snapshot of the elements a `for` loop visits.
    ///
    /// Lists and tuples yield their items, strings their characters and
    /// dicts their keys.
    pub fn to_items(&self) -> Result<Vec<Value>, EvalError> {
        match self {
            Value::List(items) => Ok(items.read().clone()),
            Value::Tuple(items) => Ok(items.to_vec()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
            Value::Dict(map) => Ok(map.read().keys().map(Value::string).collect()),
            other => Err(not_iterable(other.type_name())),
        }
    }
}

// Equality

impl Value {
    /// Script `==`.
    ///
    /// Numbers compare across int and float. Containers compare
    /// element-wise; callables, classes and instances by identity.
    #[expect(clippy::cast_precision_loss, reason = "mixed numeric comparison")]
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => **a == **b,
            (Value::List(a), Value::List(b)) => {
                a.ptr_eq(b) || slices_equal(&a.read(), &b.read())
            }
            (Value::Tuple(a), Value::Tuple(b)) => slices_equal(a, b),
            (Value::Dict(a), Value::Dict(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len()
                    && a
                        .iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.equals(other)))
            }
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            (Value::Class(a), Value::Class(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Builtin(a), Value::Builtin(b)) => a.ptr_eq(b),
            (Value::Error(a), Value::Error(b)) => **a == **b,
            (Value::BoundMethod(a), Value::BoundMethod(b)) => {
                a.receiver.equals(&b.receiver) && a.method.equals(&b.method)
            }
            _ => false,
        }
    }

    /// Script `is`: identity for heap values, equality for scalars.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Dict(a), Value::Dict(b)) => a.ptr_eq(b),
            (Value::Tuple(a), Value::Tuple(b)) => a.ptr_eq(b),
            (Value::Int(_) | Value::Float(_), Value::Bool(_))
            | (Value::Bool(_), Value::Int(_) | Value::Float(_)) => false,
            _ => self.equals(other),
        }
    }
}

fn slices_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

#[cfg(test)]
mod tests;
