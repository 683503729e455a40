//! `collections`: `Counter` and `defaultdict`.
//!
//! Counter groups elements by their inspect form: equal lists count
//! together, and `1` and `'1'` share a count. The first element seen for a
//! key is what `most_common` reports.

use std::cmp::Reverse;
use std::sync::{Arc, OnceLock};

use sling_value::args::{exact_args, range_args};
use sling_value::errors::{integer_overflow, key_not_found};
use sling_value::value::{GETITEM, INIT, SETITEM};
use sling_value::{DictMap, EvalError, EvalResult, ExecContext, InstanceValue, Kwargs, Library, Value};

use crate::{native_class, receiver};

const COUNTER: &str = "Counter";
const DEFAULTDICT: &str = "defaultdict";

/// Counter fields: inspect key to count, and inspect key to element.
const COUNTS: &str = "_counts";
const ELEMENTS: &str = "_elements";

const FACTORY: &str = "default_factory";
const DATA: &str = "_data";

pub fn collections() -> Arc<Library> {
    static LIBRARY: OnceLock<Arc<Library>> = OnceLock::new();
    Arc::clone(LIBRARY.get_or_init(|| {
        let counter = native_class(
            COUNTER,
            "Counter([iterable]) - count hashable items",
            &[
                (INIT, counter_init),
                (GETITEM, counter_getitem),
                (SETITEM, counter_setitem),
                ("most_common", counter_most_common),
            ],
        );
        let defaultdict = native_class(
            DEFAULTDICT,
            "defaultdict(default_factory) - dict that fills missing keys",
            &[
                (INIT, defaultdict_init),
                (GETITEM, defaultdict_getitem),
                (SETITEM, defaultdict_setitem),
                ("get", defaultdict_get),
                ("keys", defaultdict_keys),
                ("values", defaultdict_values),
                ("items", defaultdict_items),
            ],
        );
        Library::builder("collections")
            .description("Container datatypes")
            .callable(COUNTER, counter)
            .callable(DEFAULTDICT, defaultdict)
            .build()
    }))
}

/// Dict stored in an instance field. The lock is never held by the caller
/// while it calls back into the evaluator.
fn dict_field(inst: &InstanceValue, field: &str) -> Value {
    match inst.get_field(field) {
        Some(dict @ Value::Dict(_)) => dict,
        _ => {
            let dict = Value::empty_dict();
            inst.set_field(field, dict.clone());
            dict
        }
    }
}

fn with_map<R>(dict: &Value, f: impl FnOnce(&mut DictMap) -> R) -> Option<R> {
    match dict {
        Value::Dict(map) => Some(f(&mut map.write())),
        _ => None,
    }
}

// Counter

fn counter_init(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 1, 2)?;
    let inst = receiver(&args, COUNTER)?;
    let mut counts = DictMap::new();
    let mut elements = DictMap::new();
    if let Some(iterable) = args.get(1) {
        for item in iterable.to_items()? {
            let key = item.inspect();
            let current = counts.get(&key).map_or(Ok(0), Value::as_int)?;
            let next = current
                .checked_add(1)
                .ok_or_else(|| integer_overflow("Counter"))?;
            counts.insert(key.clone(), Value::Int(next));
            elements.entry(key).or_insert(item);
        }
    }
    inst.set_field(COUNTS, Value::dict(counts));
    inst.set_field(ELEMENTS, Value::dict(elements));
    Ok(Value::Null)
}

fn counter_getitem(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 2)?;
    let inst = receiver(&args, COUNTER)?;
    let key = args[1].inspect();
    let counts = dict_field(inst, COUNTS);
    Ok(with_map(&counts, |map| map.get(&key).cloned())
        .flatten()
        .unwrap_or(Value::Int(0)))
}

fn counter_setitem(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 3)?;
    let inst = receiver(&args, COUNTER)?;
    let key = args[1].inspect();
    let counts = dict_field(inst, COUNTS);
    let elements = dict_field(inst, ELEMENTS);
    with_map(&counts, |map| map.insert(key.clone(), args[2].clone()));
    with_map(&elements, |map| {
        map.entry(key).or_insert_with(|| args[1].clone());
    });
    Ok(Value::Null)
}

/// `most_common([n])`: `(element, count)` pairs, highest count first; ties
/// keep first-seen order.
fn counter_most_common(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 1, 2)?;
    let inst = receiver(&args, COUNTER)?;
    let limit = match args.get(1) {
        None | Some(Value::Null) => None,
        Some(n) => Some(usize::try_from(n.as_int()?).unwrap_or(0)),
    };
    let counts = dict_field(inst, COUNTS).as_dict()?;
    let elements = dict_field(inst, ELEMENTS).as_dict()?;
    let mut pairs = counts
        .into_iter()
        .map(|(key, count)| {
            let element = elements.get(&key).cloned().unwrap_or_else(|| Value::string(&key));
            Ok((element, count.as_int()?))
        })
        .collect::<Result<Vec<_>, EvalError>>()?;
    pairs.sort_by_key(|(_, count)| Reverse(*count));
    if let Some(limit) = limit {
        pairs.truncate(limit);
    }
    Ok(Value::list(
        pairs
            .into_iter()
            .map(|(element, count)| Value::tuple(vec![element, Value::Int(count)]))
            .collect(),
    ))
}

// defaultdict

fn defaultdict_init(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 1, 2)?;
    let inst = receiver(&args, DEFAULTDICT)?;
    inst.set_field(FACTORY, args.get(1).cloned().unwrap_or(Value::Null));
    inst.set_field(DATA, Value::empty_dict());
    Ok(Value::Null)
}

/// A missing key is filled with `default_factory()`; without a factory it
/// is a `KeyError`.
fn defaultdict_getitem(ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 2)?;
    let inst = receiver(&args, DEFAULTDICT)?;
    let key = args[1].dict_key()?;
    let data = dict_field(inst, DATA);
    if let Some(found) = with_map(&data, |map| map.get(&key).cloned()).flatten() {
        return Ok(found);
    }
    let factory = inst.get_field(FACTORY).unwrap_or(Value::Null);
    if factory.is_null() {
        return Err(key_not_found(&args[1].repr()));
    }
    let value = ctx.call(&factory, Vec::new(), Kwargs::new())?;
    with_map(&data, |map| map.insert(key, value.clone()));
    Ok(value)
}

fn defaultdict_setitem(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 3)?;
    let inst = receiver(&args, DEFAULTDICT)?;
    let key = args[1].dict_key()?;
    let data = dict_field(inst, DATA);
    with_map(&data, |map| map.insert(key, args[2].clone()));
    Ok(Value::Null)
}

fn defaultdict_get(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 2, 3)?;
    let inst = receiver(&args, DEFAULTDICT)?;
    let key = args[1].dict_key()?;
    let data = dict_field(inst, DATA);
    let found = with_map(&data, |map| map.get(&key).cloned()).flatten();
    Ok(found.unwrap_or_else(|| args.get(2).cloned().unwrap_or(Value::Null)))
}

fn defaultdict_entries(args: &[Value]) -> Result<DictMap, EvalError> {
    exact_args(args, 1)?;
    let inst = receiver(args, DEFAULTDICT)?;
    dict_field(inst, DATA).as_dict()
}

fn defaultdict_keys(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let entries = defaultdict_entries(&args)?;
    Ok(Value::list(entries.keys().map(Value::string).collect()))
}

fn defaultdict_values(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let entries = defaultdict_entries(&args)?;
    Ok(Value::list(entries.into_values().collect()))
}

fn defaultdict_items(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let entries = defaultdict_entries(&args)?;
    Ok(Value::list(
        entries
            .into_iter()
            .map(|(key, value)| Value::tuple(vec![Value::string(key), value]))
            .collect(),
    ))
}

#[cfg(test)]
mod tests;
