use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use super::*;
use crate::errors::EvalErrorKind;

#[test]
fn background_context_passes_checks() {
    let ctx = ExecContext::background();
    assert!(ctx.check().is_ok());
    assert!(ctx.deadline().is_none());
}

#[test]
fn expired_deadline_is_timeout() {
    let ctx = ExecContext::background().with_deadline(Instant::now());
    let err = ctx.check().err();
    assert_eq!(err.map(|e| e.kind), Some(EvalErrorKind::Timeout));
}

#[test]
fn cancel_is_shared_by_clones() {
    let ctx = ExecContext::background();
    let child = ctx.with_timeout(Duration::from_secs(60));
    ctx.cancel();
    assert!(child.cancel_token().is_cancelled());
    let err = child.check().err();
    assert_eq!(err.map(|e| e.message), Some("execution cancelled".to_string()));
}

#[test]
fn child_deadline_never_extends_parent() {
    let parent = ExecContext::background().with_timeout(Duration::from_millis(10));
    let child = parent.with_timeout(Duration::from_secs(60));
    assert_eq!(child.deadline(), parent.deadline());
}

#[test]
fn sleep_completes_without_deadline() {
    let ctx = ExecContext::background();
    assert!(ctx.sleep(Duration::from_millis(5)).is_ok());
}

#[test]
fn sleep_races_deadline() {
    let ctx = ExecContext::background().with_timeout(Duration::from_millis(50));
    let start = Instant::now();
    let err = ctx.sleep(Duration::from_secs(10)).err();
    assert_eq!(err.map(|e| e.kind), Some(EvalErrorKind::Timeout));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn sleep_wakes_on_cancel() {
    let ctx = ExecContext::background();
    let canceller = ctx.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        canceller.cancel();
    });
    let start = Instant::now();
    let err = ctx.sleep(Duration::from_secs(10)).err();
    assert_eq!(err.map(|e| e.kind), Some(EvalErrorKind::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(handle.join().is_ok());
}

#[derive(Debug, PartialEq)]
struct Client {
    endpoint: &'static str,
}

#[test]
fn capabilities_are_typed() {
    let ctx = ExecContext::background();
    assert!(ctx.capability::<Client>().is_none());
    let ctx = ctx.with_capability(Arc::new(Client { endpoint: "local" }));
    assert_eq!(
        ctx.capability::<Client>().map(|c| c.endpoint),
        Some("local")
    );
    assert!(ctx.capability::<String>().is_none());
}

#[test]
fn call_without_evaluator_runs_builtins() {
    let ctx = ExecContext::background();
    let double = Value::builtin("double", None, |_, _, args| {
        Ok(Value::Int(args[0].as_int()? * 2))
    });
    let result = ctx.call(&double, vec![Value::Int(21)], Kwargs::new());
    assert_eq!(result.ok(), Some(Value::Int(42)));

    let err = ctx.call(&Value::Int(1), vec![], Kwargs::new()).err();
    assert_eq!(
        err.map(|e| e.message),
        Some("'int' object is not callable".to_string())
    );
}

struct Echo;

impl Evaluator for Echo {
    fn call_value(
        &self,
        _ctx: &ExecContext,
        _callee: &Value,
        args: Vec<Value>,
        _kwargs: Kwargs,
    ) -> EvalResult {
        Ok(Value::Int(i64::try_from(args.len()).unwrap_or(0)))
    }
}

#[test]
fn call_routes_through_evaluator() {
    let ctx = ExecContext::background().with_evaluator(Arc::new(Echo));
    let result = ctx.call(&Value::Null, vec![Value::Null, Value::Null], Kwargs::new());
    assert_eq!(result.ok(), Some(Value::Int(2)));
}
