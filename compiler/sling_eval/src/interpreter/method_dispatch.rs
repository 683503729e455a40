//! Attribute access.
//!
//! Instance attributes resolve fields first, then the class chain; a
//! function found on the chain comes back bound to the instance together
//! with the class it was found on. Lists, dicts and strings expose their
//! builtin methods the same way. Dict keys double as attributes so that
//! imported libraries read as `lib.name`.

use std::sync::Arc;

use sling_value::errors::{no_attribute, type_error};
use sling_value::{EvalError, EvalResult, Value};

use super::Interpreter;
use crate::builtins::{dict_method, list_method, str_method};

const NAME: &str = "__name__";
const DOC: &str = "__doc__";

fn doc_value(doc: Option<&str>) -> Value {
    doc.map_or(Value::Null, Value::string)
}

fn bind_builtin(
    target: &Value,
    name: &str,
    lookup: fn(&str) -> Option<Value>,
) -> EvalResult {
    lookup(name)
        .map(|method| Value::bound_method(target.clone(), method, None))
        .ok_or_else(|| no_attribute(target.type_name(), name))
}

impl Interpreter {
    pub(super) fn load_attribute(&self, target: &Value, name: &str) -> EvalResult {
        match target {
            Value::Instance(inst) => {
                if let Some(value) = inst.get_field(name) {
                    return Ok(value);
                }
                if name == "__class__" {
                    return Ok(Value::class(Arc::clone(inst.class())));
                }
                match inst.class().lookup_with_owner(name) {
                    Some((member @ (Value::Function(_) | Value::Builtin(_)), owner)) => {
                        Ok(Value::bound_method(target.clone(), member, Some(owner)))
                    }
                    Some((member, _)) => Ok(member),
                    None => Err(no_attribute(inst.class().name(), name)),
                }
            }
            Value::Class(class) => {
                if let Some(member) = class.lookup(name) {
                    return Ok(member);
                }
                match name {
                    NAME => Ok(Value::string(class.name())),
                    DOC => Ok(doc_value(class.doc())),
                    _ => Err(EvalError::exception(
                        "AttributeError",
                        format!("type object '{}' has no attribute '{name}'", class.name()),
                    )),
                }
            }
            Value::Dict(map) => {
                let found = map.read().get(name).cloned();
                match found {
                    Some(value) => Ok(value),
                    None => bind_builtin(target, name, dict_method),
                }
            }
            Value::List(_) => bind_builtin(target, name, list_method),
            Value::Str(_) => bind_builtin(target, name, str_method),
            Value::Error(err) => match name {
                "message" => Ok(Value::string(&err.message)),
                "args" => Ok(Value::tuple(vec![Value::string(&err.message)])),
                _ => Err(no_attribute(target.type_name(), name)),
            },
            Value::Function(func) => match name {
                NAME => Ok(Value::string(func.name())),
                DOC => Ok(doc_value(func.def().docstring.as_deref())),
                _ => Err(no_attribute(target.type_name(), name)),
            },
            Value::Builtin(builtin) => match name {
                NAME => Ok(Value::string(builtin.name())),
                DOC => Ok(doc_value(builtin.help())),
                _ => Err(no_attribute(target.type_name(), name)),
            },
            Value::BoundMethod(bound) => match name {
                NAME => Ok(Value::string(bound.method_name())),
                "__self__" => Ok(bound.receiver.clone()),
                "__func__" => Ok(bound.method.clone()),
                _ => Err(no_attribute(target.type_name(), name)),
            },
            _ => Err(no_attribute(target.type_name(), name)),
        }
    }

    pub(super) fn store_attribute(
        &self,
        target: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), EvalError> {
        match target {
            Value::Instance(inst) => {
                inst.set_field(name, value);
                Ok(())
            }
            Value::Class(class) => Err(type_error(format!(
                "cannot set '{name}' attribute of immutable type '{}'",
                class.name()
            ))),
            _ => Err(no_attribute(target.type_name(), name)),
        }
    }
}
