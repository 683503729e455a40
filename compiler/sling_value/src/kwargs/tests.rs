use pretty_assertions::assert_eq;

use super::*;

fn sample() -> Kwargs {
    [
        ("name".to_string(), Value::string("ada")),
        ("count".to_string(), Value::Int(3)),
        ("ratio".to_string(), Value::Float(0.5)),
        ("flag".to_string(), Value::Bool(true)),
        ("items".to_string(), Value::list(vec![Value::Int(1)])),
    ]
    .into_iter()
    .collect()
}

#[test]
fn basic_accessors() {
    let kw = sample();
    assert_eq!(kw.len(), 5);
    assert!(!kw.is_empty());
    assert!(kw.has("name"));
    assert!(!kw.has("missing"));
    assert_eq!(kw.keys(), vec!["count", "flag", "items", "name", "ratio"]);
}

#[test]
fn permissive_accessors_fall_back() {
    let kw = sample();
    assert_eq!(kw.must_get_string("name", "x"), "ada");
    assert_eq!(kw.must_get_string("count", "x"), "x");
    assert_eq!(kw.must_get_int("count", 0), 3);
    assert_eq!(kw.must_get_int("missing", 7), 7);
    assert_eq!(kw.must_get_float("count", 0.0), 3.0);
    assert!(kw.must_get_bool("flag", false));
    assert!(kw.must_get_bool("items", false));
    assert_eq!(kw.must_get_list("items", Vec::new()).len(), 1);
    assert!(kw.must_get_list("name", Vec::new()).is_empty());
}

#[test]
fn precise_accessors_report_shape() {
    let kw = sample();
    assert_eq!(kw.get_int("count", 0).ok(), Some(3));
    assert_eq!(kw.get_int("missing", 9).ok(), Some(9));
    let err = kw.get_string("count", "").err();
    assert_eq!(
        err.map(|e| e.message),
        Some("count: must be a string".to_string())
    );
    let err = kw.get_int("name", 0).err();
    assert_eq!(
        err.map(|e| e.message),
        Some("name: must be an integer".to_string())
    );
    let err = kw.get_list("flag", Vec::new()).err();
    assert_eq!(err.map(|e| e.message), Some("flag: must be a list".to_string()));
}

#[test]
fn merged_leaves_original_untouched() {
    let base: Kwargs = [("a".to_string(), Value::Int(1))].into_iter().collect();
    let overrides: Kwargs = [("a".to_string(), Value::Int(2)), ("b".to_string(), Value::Int(3))]
        .into_iter()
        .collect();
    let merged = base.merged(&overrides);
    assert_eq!(merged.get("a"), Some(&Value::Int(2)));
    assert_eq!(merged.get("b"), Some(&Value::Int(3)));
    assert_eq!(base.get("a"), Some(&Value::Int(1)));
    assert_eq!(base.len(), 1);
}
