use super::*;
use pretty_assertions::assert_eq;

fn name(n: &str) -> Expr {
    Expr::new(ExprKind::Name(n.to_string()), Span::DUMMY)
}

fn int(n: i64) -> Expr {
    Expr::new(ExprKind::Int(n), Span::DUMMY)
}

fn spec() -> ParamSpec {
    ParamSpec {
        required: vec!["a".into(), "b".into()],
        defaults: vec![("c".into(), int(3))],
        varargs: Some("rest".into()),
        kwargs: Some("options".into()),
    }
}

#[test]
fn positional_slots_cover_required_then_defaults() {
    let spec = spec();
    assert_eq!(spec.positional_count(), 3);
    assert_eq!(spec.positional_name(0), Some("a"));
    assert_eq!(spec.positional_name(2), Some("c"));
    assert_eq!(spec.positional_name(3), None);
}

#[test]
fn position_of_finds_defaulted_params() {
    let spec = spec();
    assert_eq!(spec.position_of("b"), Some(1));
    assert_eq!(spec.position_of("c"), Some(2));
    assert_eq!(spec.position_of("rest"), None);
}

#[test]
fn names_lists_every_binding() {
    let spec = spec();
    let names: Vec<&str> = spec.names().collect();
    assert_eq!(names, vec!["a", "b", "c", "rest", "options"]);
}

#[test]
fn assign_targets() {
    assert!(name("x").is_assign_target());
    let tuple = Expr::new(ExprKind::Tuple(vec![name("a"), name("b")]), Span::DUMMY);
    assert!(tuple.is_assign_target());
    assert!(!int(1).is_assign_target());
    let mixed = Expr::new(ExprKind::Tuple(vec![name("a"), int(1)]), Span::DUMMY);
    assert!(!mixed.is_assign_target());
}

#[test]
fn operator_symbols() {
    assert_eq!(BinaryOp::FloorDiv.as_symbol(), "//");
    assert_eq!(CompareOp::NotIn.as_symbol(), "not in");
    assert_eq!(UnaryOp::Not.as_symbol(), "not");
}
