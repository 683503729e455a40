use pretty_assertions::assert_eq;

use super::*;

#[test]
fn system_exit_zero_is_success() {
    assert!(ScriptError::from_eval(EvalError::exception("SystemExit", "")).is_ok());
    assert!(ScriptError::from_eval(EvalError::exception("SystemExit", "0")).is_ok());
}

#[test]
fn system_exit_status() {
    let err = ScriptError::from_eval(EvalError::exception("SystemExit", "3"));
    assert!(matches!(err, Err(ScriptError::Exit { code: 3 })));

    let err = ScriptError::from_eval(EvalError::exception("SystemExit", "bye"));
    assert!(matches!(err, Err(ScriptError::Exit { code: 1 })));
}

#[test]
fn runtime_errors_show_their_line() {
    let err = EvalError::exception("ValueError", "bad").at_line(4);
    let Err(err) = ScriptError::from_eval(err) else {
        panic!("expected an error");
    };
    assert_eq!(err.to_string(), "ValueError: bad (line 4)");
    assert_eq!(err.exit_code(), 1);
    assert_eq!(err.as_eval().map(EvalError::exception_type), Some("ValueError"));
}

#[test]
fn context_prefixes_the_message() {
    let err = EvalError::new("boom");
    let Err(err) = ScriptError::from_eval_in(err, "function 'f'") else {
        panic!("expected an error");
    };
    assert_eq!(err.to_string(), "function 'f': boom");
}

#[test]
fn exit_codes() {
    assert_eq!(ScriptError::Exit { code: 7 }.exit_code(), 7);
    assert_eq!(ScriptError::Host("x".into()).exit_code(), 1);
}
