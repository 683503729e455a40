use pretty_assertions::assert_eq;

use super::*;
use crate::EnvArena;

fn point_class() -> Arc<ClassValue> {
    Arc::new(ClassValue::new("Point", None, DictMap::new(), None))
}

#[test]
fn truthiness() {
    assert!(!Value::Null.is_truthy());
    assert!(!Value::Bool(false).is_truthy());
    assert!(!Value::Int(0).is_truthy());
    assert!(!Value::Float(0.0).is_truthy());
    assert!(!Value::string("").is_truthy());
    assert!(!Value::list(vec![]).is_truthy());
    assert!(!Value::tuple(vec![]).is_truthy());
    assert!(!Value::empty_dict().is_truthy());
    assert!(Value::Int(-1).is_truthy());
    assert!(Value::string("x").is_truthy());
    assert!(Value::instance(point_class()).is_truthy());
}

#[test]
fn coercion_table() {
    assert_eq!(Value::Int(3).as_float().ok(), Some(3.0));
    assert_eq!(Value::Int(3).as_bool().ok(), Some(true));
    assert_eq!(Value::Float(3.9).as_int().ok(), Some(3));
    assert_eq!(Value::Float(-3.9).as_int().ok(), Some(-3));
    assert!(Value::Bool(true).as_int().is_err());
    assert!(Value::Bool(true).as_float().is_err());
    assert_eq!(Value::string("").as_bool().ok(), Some(false));
    assert_eq!(Value::Null.as_bool().ok(), Some(false));
    assert_eq!(Value::list(vec![]).as_bool().ok(), Some(false));
    assert_eq!(Value::tuple(vec![Value::Null]).as_bool().ok(), Some(true));
    assert_eq!(Value::empty_dict().as_bool().ok(), Some(false));
    assert_eq!(Value::class(point_class()).as_string().ok(), Some("Point".to_string()));
    assert_eq!(
        Value::error("ValueError", "bad").as_string().ok(),
        Some("bad".to_string())
    );
}

#[test]
fn coercion_error_messages() {
    let message = |r: Result<(), EvalError>| r.err().map(|e| e.message);
    assert_eq!(
        message(Value::Int(1).as_string().map(drop)),
        Some("must be a string".to_string())
    );
    assert_eq!(
        message(Value::string("1").as_int().map(drop)),
        Some("must be an integer".to_string())
    );
    assert_eq!(
        message(Value::Null.as_float().map(drop)),
        Some("must be a number".to_string())
    );
    assert_eq!(
        message(Value::instance(point_class()).as_bool().map(drop)),
        Some("must be a boolean".to_string())
    );
    assert_eq!(
        message(Value::Int(1).as_list().map(drop)),
        Some("must be a list".to_string())
    );
    assert_eq!(
        message(Value::Int(1).as_dict().map(drop)),
        Some("must be a dict".to_string())
    );
}

#[test]
fn as_list_copies() {
    let list = Value::list(vec![Value::Int(1)]);
    let mut copy = list.as_list().unwrap_or_default();
    copy.push(Value::Int(2));
    assert_eq!(list.as_list().map(|v| v.len()).ok(), Some(1));
    assert_eq!(
        Value::tuple(vec![Value::Int(1), Value::Int(2)])
            .as_list()
            .map(|v| v.len())
            .ok(),
        Some(2)
    );
}

#[test]
fn inspect_forms() {
    assert_eq!(Value::Null.inspect(), "None");
    assert_eq!(Value::Bool(true).inspect(), "True");
    assert_eq!(Value::Float(2.0).inspect(), "2.0");
    assert_eq!(Value::Float(0.1).inspect(), "0.1");
    assert_eq!(Value::string("hi").inspect(), "hi");
    assert_eq!(
        Value::list(vec![Value::string("a"), Value::Int(1)]).inspect(),
        "['a', 1]"
    );
    assert_eq!(Value::tuple(vec![Value::Int(1)]).inspect(), "(1,)");
    assert_eq!(Value::tuple(vec![]).inspect(), "()");
    let mut map = DictMap::new();
    map.insert("k".to_string(), Value::Null);
    assert_eq!(Value::dict(map).inspect(), "{'k': None}");
    assert_eq!(Value::class(point_class()).inspect(), "<class 'Point'>");
    assert_eq!(Value::instance(point_class()).inspect(), "<Point object>");
    assert_eq!(Value::error("ValueError", "bad").inspect(), "ERROR: bad");
    let builtin = Value::builtin("len", None, |_, _, _| Ok(Value::Null));
    assert_eq!(builtin.inspect(), "<builtin function len>");
}

#[test]
fn function_and_bound_method_inspect() {
    let arena = EnvArena::new();
    let env = arena.push(crate::FrameKind::Module, None);
    let def = Arc::new(FunctionDef {
        name: "area".to_string(),
        params: sling_ir::ParamSpec::default(),
        body: Arc::from(Vec::<sling_ir::Stmt>::new()),
        docstring: None,
        span: sling_ir::Span::DUMMY,
    });
    let func = Value::function(def, env);
    assert_eq!(func.inspect(), "<function area>");
    let bound = Value::bound_method(Value::instance(point_class()), func, None);
    assert_eq!(bound.inspect(), "<bound method Point.area>");
}

#[test]
fn repr_quotes_strings() {
    assert_eq!(Value::string("it's").repr(), "\"it's\"");
    assert_eq!(Value::string("a\nb").repr(), "'a\\nb'");
}

#[test]
fn float_formatting() {
    assert_eq!(format_float(1e20), "1e+20");
    assert_eq!(format_float(1.5e-5), "1.5e-05");
    assert_eq!(format_float(-0.5), "-0.5");
    assert_eq!(format_float(f64::INFINITY), "inf");
    assert_eq!(format_float(100.0), "100.0");
}

#[test]
fn equality_rules() {
    assert!(Value::Int(2).equals(&Value::Float(2.0)));
    assert!(Value::string("a").equals(&Value::string("a")));
    assert!(Value::list(vec![Value::Int(1)]).equals(&Value::list(vec![Value::Int(1)])));
    assert!(!Value::list(vec![Value::Int(1)]).equals(&Value::tuple(vec![Value::Int(1)])));
    let class = point_class();
    assert!(!Value::instance(Arc::clone(&class)).equals(&Value::instance(class)));
}

#[test]
fn identity_differs_from_equality() {
    let a = Value::list(vec![]);
    let b = Value::list(vec![]);
    assert!(a.equals(&b));
    assert!(!a.is_same(&b));
    assert!(a.is_same(&a.clone()));
}

#[test]
fn dict_keys() {
    assert_eq!(Value::string("k").dict_key().ok(), Some("k".to_string()));
    assert_eq!(Value::Int(3).dict_key().ok(), Some("3".to_string()));
    assert!(Value::list(vec![]).dict_key().is_err());
}

#[test]
fn dunders_fold_parent_chain() {
    let noop = Value::builtin("noop", None, |_, _, _| Ok(Value::Null));
    let mut base_members = DictMap::new();
    base_members.insert(ENTER.to_string(), noop.clone());
    base_members.insert(GETITEM.to_string(), noop.clone());
    let base = Arc::new(ClassValue::new("Base", None, base_members, None));

    let mut child_members = DictMap::new();
    child_members.insert(EXIT.to_string(), noop);
    let child = Arc::new(ClassValue::new("Child", Some(base), child_members, None));

    let dunders = child.dunders();
    assert!(dunders.enter.is_some());
    assert!(dunders.exit.is_some());
    assert!(dunders.getitem.is_some());
    assert!(dunders.init.is_none());
    assert!(dunders.is_context_manager());
    assert!(child.is_or_inherits("Base"));

    let (_, owner) = child.lookup_with_owner(GETITEM).unwrap_or_else(|| panic!("missing"));
    assert_eq!(owner.name(), "Base");
}

#[test]
fn instance_fields() {
    let Value::Instance(inst) = Value::instance(point_class()) else {
        panic!("expected instance");
    };
    inst.set_field("x", Value::Int(1));
    inst.set_field("y", Value::Int(2));
    assert_eq!(inst.get_field("x"), Some(Value::Int(1)));
    assert_eq!(
        inst.fields().keys().cloned().collect::<Vec<_>>(),
        vec!["x".to_string(), "y".to_string()]
    );
    assert_eq!(inst.remove_field("x"), Some(Value::Int(1)));
    assert!(!inst.has_field("x"));
}
