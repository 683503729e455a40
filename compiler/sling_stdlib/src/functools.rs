//! `functools`: higher-order helpers that call back into scripts.

use std::sync::{Arc, OnceLock};

use sling_value::args::{min_args, range_args};
use sling_value::errors::type_error;
use sling_value::{EvalError, EvalResult, ExecContext, Kwargs, Library, Value};

pub fn functools() -> Arc<Library> {
    static LIBRARY: OnceLock<Arc<Library>> = OnceLock::new();
    Arc::clone(LIBRARY.get_or_init(|| {
        Library::builder("functools")
            .description("Higher-order functions")
            .function(
                "reduce",
                "reduce(function, iterable[, initial]) - fold from the left",
                reduce,
            )
            .function(
                "partial",
                "partial(func, *args, **kwargs) - pre-fill arguments",
                partial,
            )
            .build()
    }))
}

fn reduce(ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    range_args(&args, 2, 3)?;
    let mut items = args[1].to_items()?.into_iter();
    let initial = match args.get(2) {
        Some(initial) => Some(initial.clone()),
        None => items.next(),
    };
    let mut acc = initial
        .ok_or_else(|| EvalError::new("reduce() of empty sequence with no initial value"))?;
    for item in items {
        ctx.check()?;
        acc = ctx.call(&args[0], vec![acc, item], Kwargs::new())?;
    }
    Ok(acc)
}

/// The returned callable keeps its own copy of the stored arguments; each
/// call overlays its keywords on a fresh map.
fn partial(_ctx: &ExecContext, kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    min_args(&args, 1)?;
    let mut args = args.into_iter();
    let Some(func) = args.next() else {
        return Ok(Value::Null);
    };
    if !func.is_callable() {
        return Err(type_error("the first argument must be callable"));
    }
    let stored: Vec<Value> = args.collect();
    let help = format!("partial({})", func.inspect());
    Ok(Value::builtin("partial", Some(help), move |ctx, call_kwargs, call_args| {
        let mut full = stored.clone();
        full.extend(call_args);
        ctx.call(&func, full, kwargs.merged(&call_kwargs))
    }))
}

#[cfg(test)]
mod tests;
