#![expect(clippy::unwrap_used, reason = "tests unwrap parse results")]

use pretty_assertions::assert_eq;
use sling_ir::{Arg, BinaryOp, CompareOp, ExprKind, Stmt, StmtKind};

use super::*;

fn parse_ok(source: &str) -> Vec<Stmt> {
    parse(source).unwrap().body
}

fn single_expr(source: &str) -> ExprKind {
    let body = parse_ok(source);
    assert_eq!(body.len(), 1);
    match body.into_iter().next().unwrap().kind {
        StmtKind::Expr(expr) => expr.kind,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

fn syntax_message(source: &str) -> String {
    match parse(source) {
        Err(ParseError::Syntax { message, .. }) => message,
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn empty_source_is_empty_module() {
    let module = parse("").unwrap();
    assert!(module.body.is_empty());
    assert_eq!(module.docstring, None);
}

#[test]
fn module_docstring() {
    let module = parse("\"\"\"Helpers.\"\"\"\nx = 1\n").unwrap();
    assert_eq!(module.docstring.as_deref(), Some("Helpers."));
    assert_eq!(module.body.len(), 2);
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let ExprKind::Binary { op, right, .. } = single_expr("1 + 2 * 3") else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(
        right.kind,
        ExprKind::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn power_is_right_associative() {
    let ExprKind::Binary { op, left, right } = single_expr("2 ** 3 ** 2") else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Pow);
    assert_eq!(left.kind, ExprKind::Int(2));
    assert!(matches!(
        right.kind,
        ExprKind::Binary {
            op: BinaryOp::Pow,
            ..
        }
    ));
}

#[test]
fn negative_literal_folds() {
    assert_eq!(single_expr("-5"), ExprKind::Int(-5));
    assert_eq!(single_expr("-2.5"), ExprKind::Float(-2.5));
}

#[test]
fn chained_comparison_keeps_links() {
    let ExprKind::Compare { links, .. } = single_expr("a < b <= c") else {
        panic!("expected comparison");
    };
    let ops: Vec<_> = links.iter().map(|(op, _)| *op).collect();
    assert_eq!(ops, vec![CompareOp::Lt, CompareOp::LtEq]);
}

#[test]
fn two_word_comparison_operators() {
    let ExprKind::Compare { links, .. } = single_expr("a not in b") else {
        panic!("expected comparison");
    };
    assert_eq!(links[0].0, CompareOp::NotIn);

    let ExprKind::Compare { links, .. } = single_expr("a is not None") else {
        panic!("expected comparison");
    };
    assert_eq!(links[0].0, CompareOp::IsNot);
}

#[test]
fn call_argument_kinds() {
    let ExprKind::Call { args, .. } = single_expr("f(1, *rest, key=2, **opts)") else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 4);
    assert!(matches!(args[0], Arg::Positional(_)));
    assert!(matches!(args[1], Arg::Star(_)));
    assert!(matches!(&args[2], Arg::Keyword(name, _) if name == "key"));
    assert!(matches!(args[3], Arg::DoubleStar(_)));
}

#[test]
fn positional_after_keyword_is_rejected() {
    assert_eq!(
        syntax_message("f(a=1, 2)"),
        "positional argument follows keyword argument"
    );
}

#[test]
fn method_call_chain() {
    let ExprKind::Call { func, .. } = single_expr("obj.items().count(3)") else {
        panic!("expected call");
    };
    assert!(matches!(func.kind, ExprKind::Attribute { ref attr, .. } if attr == "count"));
}

#[test]
fn slices_and_indexes() {
    assert!(matches!(single_expr("xs[0]"), ExprKind::Index { .. }));
    let ExprKind::Slice {
        lower, upper, step, ..
    } = single_expr("xs[1:]")
    else {
        panic!("expected slice");
    };
    assert!(lower.is_some());
    assert!(upper.is_none());
    assert!(step.is_none());
    assert!(matches!(
        single_expr("xs[::2]"),
        ExprKind::Slice { step: Some(_), .. }
    ));
}

#[test]
fn collection_literals() {
    assert!(matches!(single_expr("[1, 2, 3]"), ExprKind::List(ref v) if v.len() == 3));
    assert!(matches!(single_expr("(1,)"), ExprKind::Tuple(ref v) if v.len() == 1));
    assert!(matches!(single_expr("()"), ExprKind::Tuple(ref v) if v.is_empty()));
    assert!(matches!(single_expr("{'a': 1, 'b': 2}"), ExprKind::Dict(ref v) if v.len() == 2));
    assert!(matches!(single_expr("(1)"), ExprKind::Int(1)));
}

#[test]
fn list_comprehension_with_condition() {
    let ExprKind::ListComp { conditions, .. } = single_expr("[x * 2 for x in xs if x > 1]")
    else {
        panic!("expected comprehension");
    };
    assert_eq!(conditions.len(), 1);
}

#[test]
fn adjacent_strings_concatenate() {
    assert_eq!(single_expr("'ab' \"cd\""), ExprKind::Str("abcd".to_string()));
}

#[test]
fn lambda_parameters() {
    let ExprKind::Lambda(def) = single_expr("lambda a, b=2: a + b") else {
        panic!("expected lambda");
    };
    assert!(def.is_lambda());
    assert_eq!(def.params.required, vec!["a".to_string()]);
    assert_eq!(def.params.defaults.len(), 1);
}

#[test]
fn ternary_expression() {
    assert!(matches!(single_expr("a if c else b"), ExprKind::IfExp { .. }));
}

#[test]
fn chained_assignment() {
    let body = parse_ok("a = b = 3\n");
    let StmtKind::Assign { targets, value } = &body[0].kind else {
        panic!("expected assignment");
    };
    assert_eq!(targets.len(), 2);
    assert_eq!(value.kind, ExprKind::Int(3));
}

#[test]
fn tuple_unpacking_assignment() {
    let body = parse_ok("a, b = b, a\n");
    let StmtKind::Assign { targets, value } = &body[0].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(targets[0].kind, ExprKind::Tuple(_)));
    assert!(matches!(value.kind, ExprKind::Tuple(_)));
}

#[test]
fn augmented_assignment() {
    let body = parse_ok("total += 1\n");
    assert!(matches!(
        body[0].kind,
        StmtKind::AugAssign {
            op: BinaryOp::Add,
            ..
        }
    ));
}

#[test]
fn invalid_assignment_target() {
    assert_eq!(syntax_message("f() = 1\n"), "cannot assign to expression");
}

#[test]
fn semicolons_split_statements() {
    let body = parse_ok("a = 1; b = 2; pass\n");
    assert_eq!(body.len(), 3);
}

#[test]
fn if_elif_else() {
    let body = parse_ok("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
    let StmtKind::If { branches, orelse } = &body[0].kind else {
        panic!("expected if");
    };
    assert_eq!(branches.len(), 2);
    assert_eq!(orelse.len(), 1);
}

#[test]
fn inline_suite() {
    let body = parse_ok("while x: x -= 1\n");
    let StmtKind::While { body, .. } = &body[0].kind else {
        panic!("expected while");
    };
    assert_eq!(body.len(), 1);
}

#[test]
fn missing_indent_is_reported() {
    assert_eq!(
        syntax_message("if x:\npass\n"),
        "expected an indented block"
    );
}

#[test]
fn function_definition_with_all_parameter_kinds() {
    let source = "def f(a, b: int = 1, *args, **kwargs) -> int:\n    \"\"\"Doc.\"\"\"\n    return a\n";
    let body = parse_ok(source);
    let StmtKind::FunctionDef(def) = &body[0].kind else {
        panic!("expected def");
    };
    assert_eq!(def.name, "f");
    assert_eq!(def.params.required, vec!["a".to_string()]);
    assert_eq!(def.params.defaults[0].0, "b");
    assert_eq!(def.params.varargs.as_deref(), Some("args"));
    assert_eq!(def.params.kwargs.as_deref(), Some("kwargs"));
    assert_eq!(def.docstring.as_deref(), Some("Doc."));
    assert_eq!(def.body.len(), 2);
}

#[test]
fn default_before_required_is_rejected() {
    assert_eq!(
        syntax_message("def f(a=1, b):\n    pass\n"),
        "non-default argument follows default argument"
    );
}

#[test]
fn duplicate_parameter_is_rejected() {
    assert_eq!(
        syntax_message("def f(a, a):\n    pass\n"),
        "duplicate argument 'a' in function definition"
    );
}

#[test]
fn class_with_parent_and_methods() {
    let source = "class B(A):\n    \"\"\"A B.\"\"\"\n    def m(self):\n        return 1\n";
    let body = parse_ok(source);
    let StmtKind::ClassDef(def) = &body[0].kind else {
        panic!("expected class");
    };
    assert_eq!(def.name, "B");
    assert!(def.parent.is_some());
    assert_eq!(def.docstring.as_deref(), Some("A B."));
    assert_eq!(def.body.len(), 2);
}

#[test]
fn try_with_handlers_else_finally() {
    let source = "try:\n    x()\nexcept (ValueError, TypeError) as e:\n    pass\nexcept:\n    pass\nelse:\n    y = 1\nfinally:\n    z = 2\n";
    let body = parse_ok(source);
    let StmtKind::Try {
        handlers,
        orelse,
        finally,
        ..
    } = &body[0].kind
    else {
        panic!("expected try");
    };
    assert_eq!(handlers.len(), 2);
    assert_eq!(handlers[0].types.len(), 2);
    assert_eq!(handlers[0].name.as_deref(), Some("e"));
    assert!(handlers[1].types.is_empty());
    assert_eq!(orelse.len(), 1);
    assert_eq!(finally.len(), 1);
}

#[test]
fn bare_try_is_rejected() {
    assert_eq!(
        syntax_message("try:\n    pass\nx = 1\n"),
        "try statement needs an except or finally clause"
    );
}

#[test]
fn multi_item_with_nests() {
    let body = parse_ok("with a() as x, b() as y:\n    pass\n");
    let StmtKind::With { target, body, .. } = &body[0].kind else {
        panic!("expected with");
    };
    assert!(target.is_some());
    assert!(matches!(body[0].kind, StmtKind::With { .. }));
}

#[test]
fn imports() {
    let body = parse_ok("import a.b as c, d\nfrom e.f import (g, h as i,)\n");
    let StmtKind::Import(names) = &body[0].kind else {
        panic!("expected import");
    };
    assert_eq!(names[0].path, "a.b");
    assert_eq!(names[0].alias.as_deref(), Some("c"));
    assert_eq!(names[1].alias, None);

    let StmtKind::FromImport { module, names } = &body[1].kind else {
        panic!("expected from import");
    };
    assert_eq!(module, "e.f");
    assert_eq!(
        names,
        &vec![
            ("g".to_string(), None),
            ("h".to_string(), Some("i".to_string()))
        ]
    );
}

#[test]
fn simple_keyword_statements() {
    let body = parse_ok(
        "def f():\n    global g\n    nonlocal n\n    assert x, 'msg'\n    del d['k'], e\n    raise\n    return\n",
    );
    let StmtKind::FunctionDef(def) = &body[0].kind else {
        panic!("expected def");
    };
    let kinds: Vec<_> = def.body.iter().map(|s| &s.kind).collect();
    assert!(matches!(kinds[0], StmtKind::Global(_)));
    assert!(matches!(kinds[1], StmtKind::Nonlocal(_)));
    assert!(matches!(kinds[2], StmtKind::Assert { message: Some(_), .. }));
    assert!(matches!(kinds[3], StmtKind::Del(targets) if targets.len() == 2));
    assert!(matches!(kinds[4], StmtKind::Raise(None)));
    assert!(matches!(kinds[5], StmtKind::Return(None)));
}

#[test]
fn error_reports_line() {
    let err = parse("x = 1\ny = (\n").unwrap_err();
    assert!(err.line() >= 2);
}

#[test]
fn lex_errors_pass_through() {
    assert!(matches!(parse("x = 'open\n"), Err(ParseError::Lex(_))));
}
