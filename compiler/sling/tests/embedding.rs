//! End-to-end scenarios through the public `sling` API.

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use sling::args::range_args;
use sling::{EvalErrorKind, HostValue, Library, Runtime, ScriptError, Value};

fn runtime() -> Runtime {
    Runtime::builder().capture_output().build()
}

fn eval_error_type(err: &ScriptError) -> &str {
    err.as_eval().map_or("<host>", |err| err.exception_type())
}

#[test]
fn exit_runs_once_on_every_path() {
    let rt = runtime();
    let src = "
class Tracker:
    def __enter__(self):
        print('enter')
        return self
    def __exit__(self, exc_type, exc, tb):
        print('exit', exc_type)
        return False

def early():
    with Tracker():
        return 'early'

with Tracker():
    pass
early()
try:
    with Tracker():
        raise KeyError('k')
except KeyError:
    print('caught')
";
    rt.eval(src).unwrap();
    assert_eq!(
        rt.output(),
        "enter\nexit None\nenter\nexit None\nenter\nexit KeyError\ncaught\n"
    );
}

#[test]
fn variadic_and_keyword_routing() {
    let rt = runtime();
    let src = "
def f(a, *args, b=2, **kwargs):
    return [a, args, b, kwargs]
f(1, 2, 3, b=4, c=5)
";
    assert_eq!(
        rt.eval(src).unwrap(),
        Value::list(vec![
            Value::Int(1),
            Value::tuple(vec![Value::Int(2), Value::Int(3)]),
            Value::Int(4),
            rt.eval("{'c': 5}").unwrap(),
        ])
    );

    let err = rt.eval("def g(a):\n    return a\ng(1, z=2)").unwrap_err();
    assert_eq!(eval_error_type(&err), "TypeError");
    assert_eq!(
        err.as_eval().unwrap().message,
        "got an unexpected keyword argument 'z'"
    );
}

#[test]
fn builtin_arity_errors() {
    let err = runtime().eval("len()").unwrap_err();
    assert_eq!(
        err.as_eval().unwrap().kind,
        EvalErrorKind::Argument { want: 1, got: 0 }
    );
    assert_eq!(eval_error_type(&err), "TypeError");
}

#[test]
fn host_values_marshal_both_ways() {
    let rt = runtime();
    rt.set_var("data", vec![HostValue::Int(1), HostValue::Float(1.5), "x".into()]);
    rt.set_var("integral", 4.0);
    assert_eq!(
        rt.eval("[type(integral) == 'int', data[1] * 2]").unwrap(),
        Value::list(vec![Value::Bool(true), Value::Float(3.0)])
    );
    rt.eval("out = {'n': 1, 'items': [True, None]}").unwrap();
    let HostValue::Map(map) = rt.get_var("out").unwrap() else {
        panic!("expected a map");
    };
    assert_eq!(map["n"], HostValue::Int(1));
    assert_eq!(
        map["items"],
        HostValue::List(vec![HostValue::Bool(true), HostValue::Null])
    );
}

#[test]
fn library_registration_is_idempotent_and_shared() {
    let rt = runtime();
    let before = rt.libraries().len();
    rt.register_library(sling::stdlib::functools()).unwrap();
    assert_eq!(rt.libraries().len(), before);
    assert!(Arc::ptr_eq(
        &sling::stdlib::collections(),
        &sling::stdlib::collections()
    ));
}

#[test]
fn nested_host_libraries() {
    let rt = runtime();
    let inner = Library::builder("parse")
        .function("int", "int(s)", |_ctx, _kwargs, args| {
            range_args(&args, 1, 1)?;
            Ok(Value::Int(args[0].as_string()?.trim().parse().unwrap_or(0)))
        })
        .build();
    let outer = Library::builder("text").sub_library(inner).build();
    rt.register_library(outer).unwrap();
    assert_eq!(rt.eval("import text\ntext.parse.int(' 12 ')").unwrap(), Value::Int(12));
    assert_eq!(
        rt.call_function("text.parse.int", ["7"], HashMap::new()).unwrap(),
        Value::Int(7)
    );
}

#[test]
fn standard_library_scenarios() {
    let rt = runtime();
    let src = "
from functools import reduce, partial
from collections import Counter
from contextlib import suppress
def add(a, b):
    return a + b
c = Counter([1, 1, 2, 3, 3, 3])
with suppress(ValueError):
    int('x')
with suppress():
    raise RuntimeError('ignored')
[reduce(add, [1, 2, 3, 4]), reduce(add, [1, 2, 3], 10), c[1], c[4], partial(add, 5)(3)]
";
    assert_eq!(
        rt.eval(src).unwrap(),
        Value::list(vec![
            Value::Int(10),
            Value::Int(16),
            Value::Int(2),
            Value::Int(0),
            Value::Int(8),
        ])
    );
    let err = rt.eval("reduce(add, [])").unwrap_err();
    assert_eq!(eval_error_type(&err), "Exception");
    assert_eq!(err.as_eval().unwrap().kind, EvalErrorKind::Generic);
}

#[test]
fn sleep_respects_the_deadline() {
    let rt = runtime();
    let started = Instant::now();
    let err = rt
        .eval_with_timeout(Duration::from_millis(50), "import time\ntime.sleep(10)")
        .unwrap_err();
    assert_eq!(eval_error_type(&err), "TimeoutError");
    assert_eq!(err.as_eval().unwrap().message, "execution timeout");
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(50), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(50 + 250), "{elapsed:?}");
}

#[test]
fn deep_recursion_is_a_recursion_error() {
    let rt = runtime();
    let err = rt
        .eval("def down(n):\n    return down(n + 1)\ndown(0)")
        .unwrap_err();
    assert_eq!(eval_error_type(&err), "RecursionError");
    assert_eq!(
        err.as_eval().unwrap().message,
        "maximum recursion depth exceeded"
    );
    // The runtime stays usable.
    assert_eq!(rt.eval("1 + 1").unwrap(), Value::Int(2));
}
