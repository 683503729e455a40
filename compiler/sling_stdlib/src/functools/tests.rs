#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::run;

#[test]
fn accessor_is_a_singleton() {
    assert!(Arc::ptr_eq(&functools(), &functools()));
}

#[test]
fn reduce_folds_from_the_left() {
    let src = "
from functools import reduce
def add(a, b):
    return a + b
[reduce(add, [1, 2, 3, 4]), reduce(add, [1, 2, 3], 10), reduce(add, [], 7)]
";
    assert_eq!(
        run(src),
        Ok(Value::list(vec![Value::Int(10), Value::Int(16), Value::Int(7)]))
    );
}

#[test]
fn reduce_of_empty_sequence_without_initial() {
    let err = run("import functools\nfunctools.reduce(lambda a, b: a, [])\n").unwrap_err();
    assert_eq!(err.kind, sling_value::EvalErrorKind::Generic);
    assert_eq!(err.exception_type(), "Exception");
    assert_eq!(err.message, "reduce() of empty sequence with no initial value");
}

#[test]
fn empty_reduce_is_not_a_type_error() {
    let src = "
from functools import reduce
caught = 'none'
try:
    try:
        reduce(lambda a, b: a, [])
    except TypeError:
        caught = 'type'
except Exception:
    caught = 'generic'
caught
";
    assert_eq!(run(src), Ok(Value::string("generic")));
}

#[test]
fn reduce_arity() {
    let err = run("import functools\nfunctools.reduce(len)\n").unwrap_err();
    assert_eq!(err.kind, sling_value::EvalErrorKind::Argument { want: 2, got: 1 });
}

#[test]
fn partial_prefills_positionals() {
    let src = "
from functools import partial
def add(a, b):
    return a + b
add5 = partial(add, 5)
add5(3)
";
    assert_eq!(run(src), Ok(Value::Int(8)));
}

#[test]
fn partial_keyword_overrides_do_not_stick() {
    let src = "
from functools import partial
def greet(name, greeting='hello'):
    return greeting + ' ' + name
hi = partial(greet, greeting='hi')
[hi('a'), hi('b', greeting='yo'), hi('c')]
";
    assert_eq!(
        run(src),
        Ok(Value::list(vec![
            Value::string("hi a"),
            Value::string("yo b"),
            Value::string("hi c"),
        ]))
    );
}

#[test]
fn partial_wraps_builtins_too() {
    assert_eq!(
        run("from functools import partial\nto_int = partial(int)\nto_int('12')\n"),
        Ok(Value::Int(12))
    );
    let err = run("from functools import partial\npartial(1)\n").unwrap_err();
    assert_eq!(err.exception_type(), "TypeError");
}
