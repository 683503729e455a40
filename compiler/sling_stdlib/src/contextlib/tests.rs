#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::run;

#[test]
fn suppress_swallows_matching_exceptions() {
    let src = "
from contextlib import suppress
result = 'start'
with suppress(ValueError):
    int('x')
    result = 'unreachable'
result
";
    assert_eq!(run(src), Ok(Value::string("start")));
}

#[test]
fn suppress_accepts_several_filters() {
    let src = "
from contextlib import suppress
with suppress(KeyError, IndexError):
    [][3]
'done'
";
    assert_eq!(run(src), Ok(Value::string("done")));
}

#[test]
fn suppress_without_filters_swallows_everything() {
    let src = "
import contextlib
with contextlib.suppress():
    raise RuntimeError('boom')
'done'
";
    assert_eq!(run(src), Ok(Value::string("done")));
}

#[test]
fn suppress_matches_script_exception_classes() {
    let src = "
from contextlib import suppress
class Oops(Exception):
    pass
with suppress(Oops):
    raise Oops('quiet')
'done'
";
    assert_eq!(run(src), Ok(Value::string("done")));
}

#[test]
fn non_matching_exception_propagates() {
    let src = "
from contextlib import suppress
with suppress(KeyError):
    int('x')
";
    let err = run(src).unwrap_err();
    assert_eq!(err.exception_type(), "ValueError");
}

#[test]
fn enter_returns_the_manager() {
    let src = "
from contextlib import suppress
with suppress(ValueError) as s:
    pass
type(s).__name__
";
    assert_eq!(run(src), Ok(Value::string(SUPPRESS)));
}

#[test]
fn suppress_rejects_non_exception_arguments() {
    let err = run("from contextlib import suppress\nsuppress(1)\n").unwrap_err();
    assert_eq!(err.exception_type(), "TypeError");
}
