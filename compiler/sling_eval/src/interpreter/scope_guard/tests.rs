use pretty_assertions::assert_eq;

use sling_value::{FrameKind, Value};

use super::*;

#[test]
fn uncaptured_frames_are_freed_on_scope_exit() {
    let interpreter = Interpreter::new();
    let before = interpreter.arena().live_frames();
    {
        let scope = interpreter.scoped(Frame::new(FrameKind::Function, None));
        interpreter.arena().define(scope.env(), "x", Value::Int(1));
        assert_eq!(interpreter.arena().live_frames(), before + 1);
    }
    assert_eq!(interpreter.arena().live_frames(), before);
}

#[test]
fn captured_frames_outlive_the_guard() {
    let interpreter = Interpreter::new();
    let before = interpreter.arena().live_frames();
    let captured = {
        let scope = interpreter.scoped(Frame::new(FrameKind::Function, None));
        scope.env().clone()
    };
    assert_eq!(interpreter.arena().live_frames(), before + 1);
    drop(captured);
    interpreter.arena().collect();
    assert_eq!(interpreter.arena().live_frames(), before);
}
