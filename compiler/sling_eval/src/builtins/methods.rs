//! Methods of the built-in `list`, `dict` and `str` types.
//!
//! Each method is a builtin taking the receiver as its first positional
//! argument; attribute access binds it into a bound method.

use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use sling_value::args::{exact_args, max_args, range_args};
use sling_value::errors::{index_out_of_range, key_not_found, type_error, type_mismatch, value_error};
use sling_value::{DictMap, EvalError, EvalResult, ExecContext, Kwargs, Value};

use super::{display, to_int};

type Method = fn(&ExecContext, Kwargs, Vec<Value>) -> EvalResult;
type MethodTable = FxHashMap<&'static str, Value>;

const LIST_METHODS: &[(&str, &str, Method)] = &[
    ("append", "append(item) - add item at the end", list_append),
    ("extend", "extend(iterable) - append every item", list_extend),
    ("pop", "pop(index=-1) - remove and return an item", list_pop),
    ("insert", "insert(index, item) - insert before index", list_insert),
    ("index", "index(item) - position of the first match", list_index),
    ("count", "count(item) - number of matches", list_count),
];

const DICT_METHODS: &[(&str, &str, Method)] = &[
    ("get", "get(key, default=None)", dict_get),
    ("keys", "keys() - list of keys", dict_keys),
    ("values", "values() - list of values", dict_values),
    ("items", "items() - list of (key, value)", dict_items),
    ("pop", "pop(key[, default]) - remove and return a value", dict_pop),
    ("update", "update(other=None, **kw) - merge entries", dict_update),
];

const STR_METHODS: &[(&str, &str, Method)] = &[
    ("upper", "upper() - uppercase copy", str_upper),
    ("lower", "lower() - lowercase copy", str_lower),
    ("strip", "strip(chars=None) - trim both ends", str_strip),
    ("split", "split(sep=None, maxsplit=-1) - list of pieces", str_split),
    ("join", "join(iterable) - concatenate with this separator", str_join),
    ("startswith", "startswith(prefix) - prefix test", str_startswith),
    ("endswith", "endswith(suffix) - suffix test", str_endswith),
    ("replace", "replace(old, new[, count]) - substitute", str_replace),
    ("format", "format(*args, **kwargs) - fill {} fields", str_format),
];

fn table(entries: &[(&'static str, &'static str, Method)]) -> MethodTable {
    entries
        .iter()
        .map(|&(name, help, func)| (name, Value::builtin(name, Some(help.to_string()), func)))
        .collect()
}

pub(crate) fn list_method(name: &str) -> Option<Value> {
    static METHODS: OnceLock<MethodTable> = OnceLock::new();
    METHODS.get_or_init(|| table(LIST_METHODS)).get(name).cloned()
}

pub(crate) fn dict_method(name: &str) -> Option<Value> {
    static METHODS: OnceLock<MethodTable> = OnceLock::new();
    METHODS.get_or_init(|| table(DICT_METHODS)).get(name).cloned()
}

pub(crate) fn str_method(name: &str) -> Option<Value> {
    static METHODS: OnceLock<MethodTable> = OnceLock::new();
    METHODS.get_or_init(|| table(STR_METHODS)).get(name).cloned()
}

/// Split the receiver off the front of the arguments.
fn receiver(args: Vec<Value>) -> (Value, Vec<Value>) {
    let mut iter = args.into_iter();
    let recv = iter.next().unwrap_or(Value::Null);
    (recv, iter.collect())
}

fn list_of(value: &Value) -> Result<&RwLock<Vec<Value>>, EvalError> {
    match value {
        Value::List(items) => Ok(&**items),
        other => Err(type_mismatch("list", other.type_name())),
    }
}

fn dict_of(value: &Value) -> Result<&RwLock<DictMap>, EvalError> {
    match value {
        Value::Dict(map) => Ok(&**map),
        other => Err(type_mismatch("dict", other.type_name())),
    }
}

fn str_of(value: &Value) -> Result<&str, EvalError> {
    match value {
        Value::Str(s) => Ok(&**s),
        other => Err(type_mismatch("str", other.type_name())),
    }
}

/// Resolve a possibly negative index against `len`.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = to_int(len);
    let resolved = if index < 0 { index + len } else { index };
    if (0..len).contains(&resolved) {
        usize::try_from(resolved).ok()
    } else {
        None
    }
}

// list

fn list_append(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 1)?;
    list_of(&recv)?.write().extend(rest);
    Ok(Value::Null)
}

fn list_extend(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 1)?;
    let items = rest[0].to_items()?;
    list_of(&recv)?.write().extend(items);
    Ok(Value::Null)
}

fn list_pop(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    max_args(&rest, 1)?;
    let index = rest.first().map(Value::as_int).transpose()?.unwrap_or(-1);
    let mut items = list_of(&recv)?.write();
    if items.is_empty() {
        return Err(EvalError::exception("IndexError", "pop from empty list"));
    }
    let position =
        normalize_index(index, items.len()).ok_or_else(|| index_out_of_range("pop"))?;
    Ok(items.remove(position))
}

fn list_insert(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 2)?;
    let index = rest[0].as_int()?;
    let mut items = list_of(&recv)?.write();
    let len = to_int(items.len());
    let clamped = if index < 0 { (index + len).max(0) } else { index.min(len) };
    items.insert(usize::try_from(clamped).unwrap_or(0), rest[1].clone());
    Ok(Value::Null)
}

fn list_index(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 1)?;
    let items = list_of(&recv)?.read().clone();
    items
        .iter()
        .position(|item| item.equals(&rest[0]))
        .map(|i| Value::Int(to_int(i)))
        .ok_or_else(|| value_error(format!("{} is not in list", rest[0].repr())))
}

fn list_count(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 1)?;
    let items = list_of(&recv)?.read().clone();
    let n = items.iter().filter(|item| item.equals(&rest[0])).count();
    Ok(Value::Int(to_int(n)))
}

// dict

fn dict_get(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    range_args(&rest, 1, 2)?;
    let key = rest[0].dict_key()?;
    let found = dict_of(&recv)?.read().get(&key).cloned();
    Ok(found.or_else(|| rest.get(1).cloned()).unwrap_or(Value::Null))
}

fn dict_keys(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 0)?;
    let keys = dict_of(&recv)?.read().keys().map(Value::string).collect();
    Ok(Value::list(keys))
}

fn dict_values(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 0)?;
    let values = dict_of(&recv)?.read().values().cloned().collect();
    Ok(Value::list(values))
}

fn dict_items(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 0)?;
    let items = dict_of(&recv)?
        .read()
        .iter()
        .map(|(k, v)| Value::tuple(vec![Value::string(k), v.clone()]))
        .collect();
    Ok(Value::list(items))
}

fn dict_pop(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    range_args(&rest, 1, 2)?;
    let key = rest[0].dict_key()?;
    let removed = dict_of(&recv)?.write().shift_remove(&key);
    match (removed, rest.get(1)) {
        (Some(value), _) => Ok(value),
        (None, Some(default)) => Ok(default.clone()),
        (None, None) => Err(key_not_found(&rest[0].repr())),
    }
}

fn dict_update(_ctx: &ExecContext, kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    max_args(&rest, 1)?;
    let target = dict_of(&recv)?;
    let mut incoming = match rest.first() {
        Some(Value::Null) | None => DictMap::new(),
        Some(other) => dict_of(other)?.read().clone(),
    };
    for name in kwargs.keys() {
        if let Some(value) = kwargs.get(&name) {
            incoming.insert(name, value.clone());
        }
    }
    target.write().extend(incoming);
    Ok(Value::Null)
}

// str

fn str_upper(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 0)?;
    Ok(Value::string(str_of(&recv)?.to_uppercase()))
}

fn str_lower(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 0)?;
    Ok(Value::string(str_of(&recv)?.to_lowercase()))
}

fn str_strip(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    max_args(&rest, 1)?;
    let text = str_of(&recv)?;
    Ok(match rest.first() {
        None | Some(Value::Null) => Value::string(text.trim()),
        Some(chars) => {
            let chars = str_of(chars)?;
            Value::string(text.trim_matches(|c| chars.contains(c)))
        }
    })
}

fn str_split(_ctx: &ExecContext, kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    max_args(&rest, 2)?;
    let text = str_of(&recv)?;
    let sep = rest.first().or_else(|| kwargs.get("sep")).cloned().unwrap_or(Value::Null);
    let maxsplit = match rest.get(1) {
        Some(value) => value.as_int()?,
        None => kwargs.get_int("maxsplit", -1)?,
    };
    let limit = usize::try_from(maxsplit).ok();
    let pieces: Vec<Value> = match &sep {
        Value::Null => split_whitespace(text, limit),
        other => {
            let sep = str_of(other)?;
            if sep.is_empty() {
                return Err(value_error("empty separator"));
            }
            match limit {
                Some(n) => text.splitn(n + 1, sep).map(Value::string).collect(),
                None => text.split(sep).map(Value::string).collect(),
            }
        }
    };
    Ok(Value::list(pieces))
}

/// Whitespace split: runs of whitespace separate, ends are ignored, and
/// after `limit` splits the remainder is kept with its leading space
/// trimmed.
fn split_whitespace(text: &str, limit: Option<usize>) -> Vec<Value> {
    let mut pieces = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        if limit.is_some_and(|n| pieces.len() == n) {
            pieces.push(Value::string(rest.trim_end()));
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                pieces.push(Value::string(&rest[..end]));
                rest = rest[end..].trim_start();
            }
            None => {
                pieces.push(Value::string(rest));
                break;
            }
        }
    }
    pieces
}

fn str_join(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 1)?;
    let sep = str_of(&recv)?;
    let mut parts = Vec::new();
    for (i, item) in rest[0].to_items()?.iter().enumerate() {
        match item {
            Value::Str(s) => parts.push(s.to_string()),
            other => {
                return Err(type_error(format!(
                    "sequence item {i}: expected str instance, {} found",
                    other.type_name()
                )))
            }
        }
    }
    Ok(Value::string(parts.join(sep)))
}

/// `prefix` may be a string or a tuple of strings.
fn affix_test(recv: &Value, affix: &Value, test: fn(&str, &str) -> bool) -> EvalResult {
    let text = str_of(recv)?;
    let hit = match affix {
        Value::Tuple(options) => {
            let mut hit = false;
            for option in options.iter() {
                hit |= test(text, str_of(option)?);
            }
            hit
        }
        other => test(text, str_of(other)?),
    };
    Ok(Value::Bool(hit))
}

fn str_startswith(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 1)?;
    affix_test(&recv, &rest[0], |text, prefix| text.starts_with(prefix))
}

fn str_endswith(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    exact_args(&rest, 1)?;
    affix_test(&recv, &rest[0], |text, suffix| text.ends_with(suffix))
}

fn str_replace(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    range_args(&rest, 2, 3)?;
    let text = str_of(&recv)?;
    let (old, new) = (str_of(&rest[0])?, str_of(&rest[1])?);
    let count = rest.get(2).map(Value::as_int).transpose()?.unwrap_or(-1);
    Ok(Value::string(match usize::try_from(count) {
        Ok(n) => text.replacen(old, new, n),
        Err(_) => text.replace(old, new),
    }))
}

fn str_format(_ctx: &ExecContext, kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let (recv, rest) = receiver(args);
    format_fields(str_of(&recv)?, &rest, &kwargs).map(Value::string)
}

/// Fill `{}`, `{0}` and `{name}` fields. `{{` and `}}` are literal braces;
/// format specs are not supported.
pub(crate) fn format_fields(
    template: &str,
    args: &[Value],
    kwargs: &Kwargs,
) -> Result<String, EvalError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_auto = 0;
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => field.push(ch),
                        None => return Err(value_error("Single '{' encountered in format string")),
                    }
                }
                if field.contains([':', '!']) {
                    return Err(value_error(format!(
                        "unsupported format field '{{{field}}}'"
                    )));
                }
                let positional = |index: usize| {
                    args.get(index).cloned().ok_or_else(|| {
                        EvalError::exception(
                            "IndexError",
                            format!("Replacement index {index} out of range for positional args tuple"),
                        )
                    })
                };
                let value = if field.is_empty() {
                    next_auto += 1;
                    positional(next_auto - 1)?
                } else if let Ok(index) = field.parse::<usize>() {
                    positional(index)?
                } else {
                    kwargs
                        .get(&field)
                        .cloned()
                        .ok_or_else(|| key_not_found(&format!("'{field}'")))?
                };
                out.push_str(&display(&value));
            }
            '}' => return Err(value_error("Single '}' encountered in format string")),
            other => out.push(other),
        }
    }
    Ok(out)
}
