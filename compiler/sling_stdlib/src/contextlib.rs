//! `contextlib`: `suppress(*exceptions)`.

use std::sync::{Arc, OnceLock};

use sling_value::args::{exact_args, min_args};
use sling_value::errors::{exception_filter_name, exception_matches, type_error};
use sling_value::value::{ENTER, EXIT, INIT};
use sling_value::{EvalError, EvalResult, ExecContext, Kwargs, Library, Value};

use crate::{native_class, receiver};

const SUPPRESS: &str = "suppress";
const TYPES: &str = "types";

pub fn contextlib() -> Arc<Library> {
    static LIBRARY: OnceLock<Arc<Library>> = OnceLock::new();
    Arc::clone(LIBRARY.get_or_init(|| {
        let suppress = native_class(
            SUPPRESS,
            "suppress(*exceptions) - context manager that swallows the named exceptions",
            &[
                (INIT, suppress_init),
                (ENTER, suppress_enter),
                (EXIT, suppress_exit),
            ],
        );
        Library::builder("contextlib")
            .description("Utilities for with-statement contexts")
            .callable(SUPPRESS, suppress)
            .build()
    }))
}

fn suppress_init(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    min_args(&args, 1)?;
    let inst = receiver(&args, SUPPRESS)?;
    let names = args[1..]
        .iter()
        .map(|filter| {
            exception_filter_name(filter).map(Value::string).ok_or_else(|| {
                type_error(format!(
                    "suppress() arguments must be exception types, not {}",
                    filter.type_name()
                ))
            })
        })
        .collect::<Result<Vec<_>, EvalError>>()?;
    inst.set_field(TYPES, Value::tuple(names));
    Ok(Value::Null)
}

fn suppress_enter(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 1)?;
    receiver(&args, SUPPRESS)?;
    Ok(args[0].clone())
}

/// An empty filter list swallows everything.
fn suppress_exit(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 4)?;
    let inst = receiver(&args, SUPPRESS)?;
    let Value::Str(tag) = &args[1] else {
        return Ok(Value::Bool(false));
    };
    let filters = inst.get_field(TYPES).map_or(Ok(Vec::new()), |types| types.as_list())?;
    if filters.is_empty() {
        return Ok(Value::Bool(true));
    }
    let caught = filters
        .iter()
        .filter_map(exception_filter_name)
        .any(|filter| exception_matches(tag, &filter));
    Ok(Value::Bool(caught))
}

#[cfg(test)]
mod tests;
