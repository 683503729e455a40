use super::*;
use pretty_assertions::assert_eq;

#[test]
fn deep_recursion_does_not_overflow() {
    fn depth(n: u64) -> u64 {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
    }

    assert_eq!(depth(100_000), 100_000);
}

#[test]
fn passes_through_closure_result() {
    let result: Result<i32, &str> = ensure_sufficient_stack(|| Ok(7));
    assert_eq!(result, Ok(7));
}

#[test]
fn call_depth_releases_on_drop() {
    let depth = CallDepth::new(2);
    {
        let _a = depth.enter();
        let _b = depth.enter();
        assert_eq!(depth.current(), 2);
    }
    assert_eq!(depth.current(), 0);
}

#[test]
fn call_depth_refuses_past_max() {
    let depth = CallDepth::new(1);
    let first = depth.enter();
    assert!(first.is_some());
    assert!(depth.enter().is_none());
    assert_eq!(depth.current(), 1);
    drop(first);
    assert!(depth.enter().is_some());
}

#[test]
fn clones_share_the_counter() {
    let depth = CallDepth::default();
    let other = depth.clone();
    let _guard = depth.enter();
    assert_eq!(other.current(), 1);
    assert_eq!(other.max(), DEFAULT_MAX_CALL_DEPTH);
}
