use std::sync::OnceLock;

use pretty_assertions::assert_eq;

use super::*;

fn math() -> Arc<Library> {
    static LIB: OnceLock<Arc<Library>> = OnceLock::new();
    Arc::clone(LIB.get_or_init(|| {
        Library::builder("math")
            .description("Math helpers.")
            .function("double", "double(n)", |_, _, args| {
                Ok(Value::Int(args[0].as_int()? * 2))
            })
            .constant("ratio", 2.5)
            .sub_library(Library::builder("math.stats").constant("n", 0_i64).build())
            .build()
    }))
}

#[test]
fn accessor_is_singleton() {
    assert!(Arc::ptr_eq(&math(), &math()));
}

#[test]
fn dict_view_contents() {
    let dict = math().to_dict().as_dict().unwrap_or_default();
    let keys: Vec<&String> = dict.keys().collect();
    assert_eq!(keys, vec!["double", "ratio", "stats", "__doc__"]);
    assert_eq!(dict.get(DOC_KEY), Some(&Value::string("Math helpers.")));
    assert!(matches!(dict.get("stats"), Some(Value::Dict(_))));
}

#[test]
fn dict_view_is_cached() {
    let lib = math();
    let (Value::Dict(a), Value::Dict(b)) = (lib.to_dict(), lib.to_dict()) else {
        panic!("expected dicts");
    };
    assert!(a.ptr_eq(&b));
}

#[test]
fn no_doc_key_without_description() {
    let lib = Library::builder("bare").constant("x", 1_i64).build();
    let dict = lib.to_dict().as_dict().unwrap_or_default();
    assert!(!dict.contains_key(DOC_KEY));
    assert_eq!(lib.short_name(), "bare");
}

#[test]
fn function_help_is_kept() {
    let lib = math();
    let Some(Value::Builtin(double)) = lib.functions().get("double") else {
        panic!("expected builtin");
    };
    assert_eq!(double.help(), Some("double(n)"));
    assert_eq!(double.name(), "double");
}
