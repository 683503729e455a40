//! Subscripts, slices and item assignment.
//!
//! Instances take part through their class's `__getitem__` and
//! `__setitem__`, resolved once into the class's dunder table.

use sling_value::errors::{
    index_out_of_range, key_not_found, no_item_assignment, not_subscriptable, type_error,
    value_error,
};
use sling_value::{EvalError, EvalResult, ExecContext, Kwargs, Value};

use super::Interpreter;

fn int_index(key: &Value, container: &str) -> Result<i64, EvalError> {
    match key {
        Value::Int(n) => Ok(*n),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(type_error(format!(
            "{container} indices must be integers, not {}",
            other.type_name()
        ))),
    }
}

/// Position for `index` in a sequence of `len`, counting negatives from
/// the end.
fn resolve(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index.checked_add(len)? } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

fn element_index(key: &Value, len: usize, container: &str) -> Result<usize, EvalError> {
    resolve(int_index(key, container)?, len).ok_or_else(|| index_out_of_range(container))
}

fn slice_bound(value: &Value) -> Result<Option<i64>, EvalError> {
    match value {
        Value::Null => Ok(None),
        Value::Int(n) => Ok(Some(*n)),
        Value::Bool(b) => Ok(Some(i64::from(*b))),
        _ => Err(type_error("slice indices must be integers or None")),
    }
}

/// Positions selected by `[lower:upper:step]`, with out-of-range bounds
/// clamped the way Python does.
fn slice_indices(len: usize, lower: &Value, upper: &Value, step: &Value) -> Result<Vec<usize>, EvalError> {
    let step = slice_bound(step)?.unwrap_or(1);
    if step == 0 {
        return Err(value_error("slice step cannot be zero"));
    }
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |bound: i64| -> i64 {
        let bound = if bound < 0 { bound.saturating_add(len) } else { bound };
        if step > 0 {
            bound.clamp(0, len)
        } else {
            bound.clamp(-1, len - 1)
        }
    };
    let (default_lo, default_hi) = if step > 0 { (0, len) } else { (len - 1, -1) };
    let lo = slice_bound(lower)?.map_or(default_lo, clamp);
    let hi = slice_bound(upper)?.map_or(default_hi, clamp);

    let mut indices = Vec::new();
    let mut i = lo;
    while (step > 0 && i < hi) || (step < 0 && i > hi) {
        if let Ok(index) = usize::try_from(i) {
            indices.push(index);
        }
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    Ok(indices)
}

impl Interpreter {
    /// `target[key]`.
    pub(super) fn subscript(&self, ctx: &ExecContext, target: &Value, key: &Value) -> EvalResult {
        match target {
            Value::List(items) => {
                let items = items.read();
                let index = element_index(key, items.len(), "list")?;
                Ok(items[index].clone())
            }
            Value::Tuple(items) => {
                let index = element_index(key, items.len(), "tuple")?;
                Ok(items[index].clone())
            }
            Value::Str(s) => {
                let len = s.chars().count();
                let index = element_index(key, len, "string")?;
                Ok(s.chars()
                    .nth(index)
                    .map_or(Value::Null, |c| Value::string(c.to_string())))
            }
            Value::Dict(map) => {
                let name = key.dict_key()?;
                let found = map.read().get(&name).cloned();
                found.ok_or_else(|| key_not_found(&key.repr()))
            }
            Value::Instance(inst) => match &inst.class().dunders().getitem {
                Some(getitem) => self.call_method(
                    ctx,
                    getitem,
                    target,
                    None,
                    vec![key.clone()],
                    Kwargs::new(),
                ),
                None => Err(not_subscriptable(inst.class().name())),
            },
            other => Err(not_subscriptable(other.type_name())),
        }
    }

    /// `target[key] = value`.
    pub(super) fn set_item(
        &self,
        ctx: &ExecContext,
        target: &Value,
        key: Value,
        value: Value,
    ) -> Result<(), EvalError> {
        match target {
            Value::List(items) => {
                let mut items = items.write();
                let index = resolve(int_index(&key, "list")?, items.len())
                    .ok_or_else(|| index_out_of_range("list assignment"))?;
                let old = std::mem::replace(&mut items[index], value);
                drop(items);
                drop(old);
                Ok(())
            }
            Value::Dict(map) => {
                let name = key.dict_key()?;
                let old = map.write().insert(name, value);
                drop(old);
                Ok(())
            }
            Value::Instance(inst) => match &inst.class().dunders().setitem {
                Some(setitem) => {
                    self.call_method(ctx, setitem, target, None, vec![key, value], Kwargs::new())?;
                    Ok(())
                }
                None => Err(no_item_assignment(inst.class().name())),
            },
            other => Err(no_item_assignment(other.type_name())),
        }
    }

    /// `del target[key]`.
    pub(super) fn delete_item(&self, target: &Value, key: &Value) -> Result<(), EvalError> {
        match target {
            Value::List(items) => {
                let mut items = items.write();
                let index = resolve(int_index(key, "list")?, items.len())
                    .ok_or_else(|| index_out_of_range("list assignment"))?;
                let old = items.remove(index);
                drop(items);
                drop(old);
                Ok(())
            }
            Value::Dict(map) => {
                let name = key.dict_key()?;
                let old = map.write().shift_remove(&name);
                match old {
                    Some(_) => Ok(()),
                    None => Err(key_not_found(&key.repr())),
                }
            }
            other => Err(type_error(format!(
                "'{}' object doesn't support item deletion",
                other.type_name()
            ))),
        }
    }

    /// `target[lower:upper:step]` on lists, tuples and strings.
    pub(super) fn slice(&self, target: &Value, lower: &Value, upper: &Value, step: &Value) -> EvalResult {
        match target {
            Value::List(items) => {
                let items = items.read().clone();
                let picked = slice_indices(items.len(), lower, upper, step)?;
                Ok(Value::list(picked.into_iter().map(|i| items[i].clone()).collect()))
            }
            Value::Tuple(items) => {
                let picked = slice_indices(items.len(), lower, upper, step)?;
                Ok(Value::tuple(picked.into_iter().map(|i| items[i].clone()).collect()))
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let picked = slice_indices(chars.len(), lower, upper, step)?;
                Ok(Value::string(picked.into_iter().map(|i| chars[i]).collect::<String>()))
            }
            other => Err(not_subscriptable(other.type_name())),
        }
    }
}
