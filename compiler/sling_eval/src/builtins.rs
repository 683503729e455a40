//! Core builtins bound in every runtime.
//!
//! Builtins are ordinary `Value::Builtin` closures with the host calling
//! convention `(ctx, kwargs, positional)`. Anything that has to call back
//! into script code (`sorted(key=...)`, `getattr`) goes through the
//! context's evaluator bridge, so this module never sees the interpreter.

mod methods;

use std::cmp::Ordering;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use sling_ir::BinaryOp;
use sling_value::args::{exact_args, max_args, min_args, range_args};
use sling_value::errors::{exception_matches, integer_overflow, type_error, value_error};
use sling_value::{ClassValue, DictMap, EvalError, EvalResult, ExecContext, Kwargs, Value};

pub(crate) use methods::{dict_method, list_method, str_method};

use crate::operators::{evaluate_binary, partial_order};
use crate::print_handler::{PrintHandler, SharedPrintHandler};

/// Exception constructors bound as builtins. `except` clauses name these.
pub const EXCEPTION_TYPES: &[&str] = &[
    "Exception",
    "ValueError",
    "TypeError",
    "KeyError",
    "IndexError",
    "NameError",
    "AttributeError",
    "RuntimeError",
    "ZeroDivisionError",
    "StopIteration",
    "SystemExit",
    "TimeoutError",
    "CancelledError",
    "AssertionError",
    "ImportError",
    "ModuleNotFoundError",
    "OverflowError",
    "RecursionError",
    "NotImplementedError",
    "SyntaxError",
];

/// Longest list `range` will build.
const MAX_RANGE_LEN: i64 = 10_000_000;

pub fn is_exception_type(name: &str) -> bool {
    EXCEPTION_TYPES.contains(&name)
}

/// `str()` form: errors show their message, other values their inspect
/// form.
pub fn display(value: &Value) -> String {
    match value {
        Value::Error(err) => err.message.clone(),
        other => other.inspect(),
    }
}

/// Message of an exception built from constructor arguments.
pub(crate) fn exception_message(args: &[Value]) -> String {
    match args {
        [] => String::new(),
        [single] => display(single),
        many => Value::tuple(many.to_vec()).repr(),
    }
}

type Table = FxHashMap<String, Value>;

fn insert<F>(table: &mut Table, name: &str, help: &str, func: F)
where
    F: Fn(&ExecContext, Kwargs, Vec<Value>) -> EvalResult + Send + Sync + 'static,
{
    table.insert(
        name.to_string(),
        Value::builtin(name, Some(help.to_string()), func),
    );
}

/// Build the builtin table; `print` writes to `out`.
pub fn core_builtins(out: &SharedPrintHandler) -> FxHashMap<String, Value> {
    let mut table = Table::default();
    let handler = Arc::clone(out);
    insert(
        &mut table,
        "print",
        "print(*values, sep=' ', end='\\n') - write values to the output",
        move |_, kwargs, args| builtin_print(&handler, &kwargs, &args),
    );
    insert(&mut table, "len", "len(obj) - number of items", builtin_len);
    insert(&mut table, "str", "str(obj='') - string form", builtin_str);
    insert(&mut table, "repr", "repr(obj) - quoted form", builtin_repr);
    insert(&mut table, "int", "int(x=0) - convert to int", builtin_int);
    insert(&mut table, "float", "float(x=0.0) - convert to float", builtin_float);
    insert(&mut table, "bool", "bool(x=False) - truth value", builtin_bool);
    insert(&mut table, "list", "list(iterable=()) - new list", builtin_list);
    insert(&mut table, "tuple", "tuple(iterable=()) - new tuple", builtin_tuple);
    insert(&mut table, "dict", "dict(mapping=None, **kw) - new dict", builtin_dict);
    insert(&mut table, "type", "type(obj) - class or type name", builtin_type);
    insert(&mut table, "range", "range([start,] stop[, step]) - list of ints", builtin_range);
    insert(
        &mut table,
        "isinstance",
        "isinstance(obj, classinfo) - type test",
        builtin_isinstance,
    );
    insert(&mut table, "min", "min(iterable | *values, key=None)", |ctx, kwargs, args| {
        extreme(ctx, &kwargs, args, "min", Ordering::Less)
    });
    insert(&mut table, "max", "max(iterable | *values, key=None)", |ctx, kwargs, args| {
        extreme(ctx, &kwargs, args, "max", Ordering::Greater)
    });
    insert(&mut table, "sum", "sum(iterable, start=0)", builtin_sum);
    insert(&mut table, "abs", "abs(x) - absolute value", builtin_abs);
    insert(
        &mut table,
        "sorted",
        "sorted(iterable, key=None, reverse=False) - new sorted list",
        builtin_sorted,
    );
    insert(
        &mut table,
        "enumerate",
        "enumerate(iterable, start=0) - list of (index, item)",
        builtin_enumerate,
    );
    insert(&mut table, "zip", "zip(*iterables) - list of tuples", builtin_zip);
    insert(&mut table, "hasattr", "hasattr(obj, name)", builtin_hasattr);
    insert(&mut table, "getattr", "getattr(obj, name[, default])", builtin_getattr);
    insert(&mut table, "setattr", "setattr(obj, name, value)", builtin_setattr);
    for &name in EXCEPTION_TYPES {
        table.insert(name.to_string(), exception_constructor(name));
    }
    table
}

fn exception_constructor(name: &'static str) -> Value {
    Value::builtin(
        name,
        Some(format!("{name}(*args) - build a {name} value")),
        move |_, _, args| Ok(Value::error(name, exception_message(&args))),
    )
}

fn to_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn builtin_print(out: &PrintHandler, kwargs: &Kwargs, args: &[Value]) -> EvalResult {
    let sep = kwargs.get_string("sep", " ")?;
    let end = kwargs.get_string("end", "\n")?;
    let mut text = args.iter().map(display).collect::<Vec<_>>().join(&sep);
    text.push_str(&end);
    out.print(&text);
    Ok(Value::Null)
}

fn builtin_len(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 1)?;
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.read().len(),
        Value::Tuple(items) => items.len(),
        Value::Dict(map) => map.read().len(),
        other => {
            return Err(type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(to_int(n)))
}

fn builtin_str(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 0, 1)?;
    Ok(Value::string(args.first().map(display).unwrap_or_default()))
}

fn builtin_repr(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 1)?;
    Ok(Value::string(args[0].repr()))
}

fn builtin_int(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 0, 1)?;
    let Some(value) = args.first() else {
        return Ok(Value::Int(0));
    };
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => float_to_int(*f),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            value_error(format!(
                "invalid literal for int() with base 10: {}",
                value.repr()
            ))
        }),
        other => Err(type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

#[expect(clippy::cast_possible_truncation, reason = "range is checked first")]
fn float_to_int(f: f64) -> EvalResult {
    // 2^63, exactly representable.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return Err(value_error("cannot convert float NaN to integer"));
    }
    let truncated = f.trunc();
    if !(-LIMIT..LIMIT).contains(&truncated) {
        return Err(integer_overflow("float conversion"));
    }
    Ok(Value::Int(truncated as i64))
}

fn builtin_float(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 0, 1)?;
    let Some(value) = args.first() else {
        return Ok(Value::Float(0.0));
    };
    match value {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(_) => value.as_float().map(Value::Float),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            value_error(format!(
                "could not convert string to float: {}",
                value.repr()
            ))
        }),
        other => Err(type_error(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_bool(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 0, 1)?;
    Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
}

fn builtin_list(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 0, 1)?;
    let items = args.first().map(Value::to_items).transpose()?;
    Ok(Value::list(items.unwrap_or_default()))
}

fn builtin_tuple(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 0, 1)?;
    let items = args.first().map(Value::to_items).transpose()?;
    Ok(Value::tuple(items.unwrap_or_default()))
}

fn builtin_dict(_ctx: &ExecContext, kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    max_args(&args, 1)?;
    let mut map = DictMap::new();
    match args.first() {
        Some(Value::Dict(entries)) => map = entries.read().clone(),
        Some(pairs) => {
            for pair in pairs.to_items()? {
                let items = pair.to_items()?;
                let [key, value] = items.as_slice() else {
                    return Err(value_error(format!(
                        "dictionary update sequence element has length {}; 2 is required",
                        items.len()
                    )));
                };
                map.insert(key.dict_key()?, value.clone());
            }
        }
        None => {}
    }
    for name in kwargs.keys() {
        if let Some(value) = kwargs.get(&name) {
            map.insert(name, value.clone());
        }
    }
    Ok(Value::dict(map))
}

/// The class of an instance; the type name of anything else.
fn builtin_type(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 1)?;
    Ok(match &args[0] {
        Value::Instance(inst) => Value::class(Arc::clone(inst.class())),
        other => Value::string(other.type_name()),
    })
}

fn range_int(value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            other.type_name()
        ))),
    }
}

fn builtin_range(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 1, 3)?;
    let bounds = args.iter().map(range_int).collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step, ..] => (*start, *stop, *step),
        [] => (0, 0, 1),
    };
    if step == 0 {
        return Err(value_error("range() arg 3 must not be zero"));
    }
    let len = range_len(start, stop, step);
    if len > MAX_RANGE_LEN {
        return Err(value_error(format!("range() of {len} items is too large")));
    }
    let mut items = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
    let mut current = start;
    for _ in 0..len {
        items.push(Value::Int(current));
        current = current.saturating_add(step);
    }
    Ok(Value::list(items))
}

fn range_len(start: i64, stop: i64, step: i64) -> i64 {
    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let len = if step > 0 && start < stop {
        (stop - start + step - 1) / step
    } else if step < 0 && start > stop {
        (start - stop - step - 1) / -step
    } else {
        0
    };
    i64::try_from(len).unwrap_or(i64::MAX)
}

fn builtin_isinstance(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 2)?;
    is_instance(&args[0], &args[1]).map(Value::Bool)
}

fn inherits(class: &Arc<ClassValue>, target: &Arc<ClassValue>) -> bool {
    let mut cursor = Some(class);
    while let Some(current) = cursor {
        if Arc::ptr_eq(current, target) {
            return true;
        }
        cursor = current.parent();
    }
    false
}

fn is_instance(value: &Value, classinfo: &Value) -> Result<bool, EvalError> {
    let bad_classinfo = || type_error("isinstance() arg 2 must be a type or tuple of types");
    match classinfo {
        Value::Tuple(options) => {
            for option in options.iter() {
                if is_instance(value, option)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::Class(class) => Ok(matches!(
            value,
            Value::Instance(inst) if inherits(inst.class(), class.inner())
        )),
        Value::Builtin(ctor) => Ok(match ctor.name() {
            "int" => matches!(value, Value::Int(_) | Value::Bool(_)),
            "float" => matches!(value, Value::Float(_)),
            "str" => matches!(value, Value::Str(_)),
            "bool" => matches!(value, Value::Bool(_)),
            "list" => matches!(value, Value::List(_)),
            "tuple" => matches!(value, Value::Tuple(_)),
            "dict" => matches!(value, Value::Dict(_)),
            name if is_exception_type(name) => {
                matches!(value, Value::Error(err) if exception_matches(&err.exc_type, name))
            }
            _ => return Err(bad_classinfo()),
        }),
        _ => Err(bad_classinfo()),
    }
}

/// Shared body of `min` and `max`: keep the first item whose key orders
/// `want` against the best so far.
fn extreme(
    ctx: &ExecContext,
    kwargs: &Kwargs,
    args: Vec<Value>,
    name: &str,
    want: Ordering,
) -> EvalResult {
    min_args(&args, 1)?;
    let items = if args.len() == 1 {
        args[0].to_items()?
    } else {
        args
    };
    let key = kwargs.get("key").filter(|k| !k.is_null()).cloned();
    let mut best: Option<(Value, Value)> = None;
    for item in items {
        let item_key = match &key {
            Some(func) => ctx.call(func, vec![item.clone()], Kwargs::new())?,
            None => item.clone(),
        };
        let replace = match &best {
            None => true,
            Some((_, best_key)) => partial_order(&item_key, best_key, "<")? == Some(want),
        };
        if replace {
            best = Some((item, item_key));
        }
    }
    match best {
        Some((item, _)) => Ok(item),
        None => kwargs
            .get("default")
            .cloned()
            .ok_or_else(|| value_error(format!("{name}() arg is an empty sequence"))),
    }
}

fn builtin_sum(_ctx: &ExecContext, kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 1, 2)?;
    let mut total = args
        .get(1)
        .or_else(|| kwargs.get("start"))
        .cloned()
        .unwrap_or(Value::Int(0));
    for item in args[0].to_items()? {
        total = evaluate_binary(&total, &item, BinaryOp::Add)?;
    }
    Ok(total)
}

fn builtin_abs(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 1)?;
    match &args[0] {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("abs")),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(type_error(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_sorted(ctx: &ExecContext, kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 1)?;
    let items = args[0].to_items()?;
    let reverse = kwargs.get_bool("reverse", false)?;
    let keys = match kwargs.get("key").filter(|k| !k.is_null()) {
        Some(func) => items
            .iter()
            .map(|item| ctx.call(func, vec![item.clone()], Kwargs::new()))
            .collect::<Result<Vec<_>, _>>()?,
        None => items.clone(),
    };
    let order = sort_indices(&keys, reverse)?;
    Ok(Value::list(
        order.into_iter().map(|i| items[i].clone()).collect(),
    ))
}

/// Comparison family; only members of one family order against each other.
fn sort_family(value: &Value) -> Option<u8> {
    match value {
        Value::Int(_) | Value::Bool(_) | Value::Float(_) => Some(0),
        Value::Str(_) => Some(1),
        Value::List(_) => Some(2),
        Value::Tuple(_) => Some(3),
        _ => None,
    }
}

/// Stable sort order of `keys`.
///
/// Keys are checked for mutual comparability up front so the comparator
/// stays a total order; NaN sorts by `total_cmp`.
pub(crate) fn sort_indices(keys: &[Value], reverse: bool) -> Result<Vec<usize>, EvalError> {
    if keys.len() > 1 {
        let family = sort_family(&keys[0]);
        for key in keys {
            if family.is_none() || sort_family(key) != family {
                partial_order(&keys[0], key, "<")?;
            }
        }
    }
    let mut failure = None;
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| {
        let (x, y) = if reverse {
            (&keys[b], &keys[a])
        } else {
            (&keys[a], &keys[b])
        };
        match partial_order(x, y, "<") {
            Ok(Some(ordering)) => ordering,
            Ok(None) => {
                let (fx, fy) = (x.as_float().unwrap_or(f64::NAN), y.as_float().unwrap_or(f64::NAN));
                fx.total_cmp(&fy)
            }
            Err(err) => {
                failure.get_or_insert(err);
                Ordering::Equal
            }
        }
    });
    failure.map_or(Ok(order), Err)
}

fn builtin_enumerate(_ctx: &ExecContext, kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 1, 2)?;
    let start = match args.get(1) {
        Some(value) => value.as_int()?,
        None => kwargs.get_int("start", 0)?,
    };
    let pairs = args[0]
        .to_items()?
        .into_iter()
        .enumerate()
        .map(|(i, item)| Value::tuple(vec![Value::Int(start.saturating_add(to_int(i))), item]))
        .collect();
    Ok(Value::list(pairs))
}

fn builtin_zip(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    let columns = args
        .iter()
        .map(Value::to_items)
        .collect::<Result<Vec<_>, _>>()?;
    let len = columns.iter().map(Vec::len).min().unwrap_or(0);
    let rows = (0..len)
        .map(|i| Value::tuple(columns.iter().map(|column| column[i].clone()).collect()))
        .collect();
    Ok(Value::list(rows))
}

fn is_attribute_error(err: &EvalError) -> bool {
    err.exception_type() == "AttributeError"
}

fn builtin_hasattr(ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 2)?;
    let name = args[1].as_string()?;
    match ctx.get_attribute(&args[0], &name) {
        Ok(_) => Ok(Value::Bool(true)),
        Err(err) if is_attribute_error(&err) => Ok(Value::Bool(false)),
        Err(err) => Err(err),
    }
}

fn builtin_getattr(ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 2, 3)?;
    let name = args[1].as_string()?;
    match (ctx.get_attribute(&args[0], &name), args.get(2)) {
        (Err(err), Some(default)) if is_attribute_error(&err) => Ok(default.clone()),
        (result, _) => result,
    }
}

fn builtin_setattr(ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 3)?;
    let name = args[1].as_string()?;
    ctx.set_attribute(&args[0], &name, args[2].clone())?;
    Ok(Value::Null)
}
