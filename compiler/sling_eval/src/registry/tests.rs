use pretty_assertions::assert_eq;

use super::*;

fn library(name: &str) -> Arc<Library> {
    Library::builder(name).constant("answer", 42_i64).build()
}

#[test]
fn registering_twice_keeps_one_entry() {
    let registry = LibraryRegistry::new();
    let first = library("util");
    assert_eq!(registry.register_library(Arc::clone(&first)), Ok(()));
    assert_eq!(registry.register_library(library("util")), Ok(()));
    assert_eq!(registry.libraries().len(), 1);
    let stored = registry.library("util");
    assert!(stored.is_some_and(|lib| Arc::ptr_eq(&lib, &first)));
}

#[test]
fn nesting_is_limited_to_five_levels() {
    let registry = LibraryRegistry::new();
    assert_eq!(registry.register_library(library("a.b.c.d.e")), Ok(()));
    let err = registry
        .register_script_library("a.b.c.d.e.f", "x = 1")
        .err()
        .map(|e| e.message);
    assert_eq!(
        err.as_deref(),
        Some("library nesting too deep (max 5 levels): a.b.c.d.e.f")
    );
}

#[test]
fn listing_is_sorted_and_tracks_imports() {
    let registry = LibraryRegistry::new();
    assert_eq!(registry.register_library(library("zeta")), Ok(()));
    assert_eq!(registry.register_script_library("alpha", "x = 1"), Ok(()));
    registry.mark_imported("zeta");
    assert_eq!(
        registry.libraries(),
        vec![
            LibraryInfo {
                name: "alpha".into(),
                imported: false
            },
            LibraryInfo {
                name: "zeta".into(),
                imported: true
            },
        ]
    );
}

#[test]
fn script_cache_keeps_first_value() {
    let registry = LibraryRegistry::new();
    assert_eq!(registry.register_script_library("s", "x = 1"), Ok(()));
    let script = registry.script("s");
    assert!(script.as_ref().is_some_and(|s| s.source() == "x = 1"));
    if let Some(script) = script {
        assert!(script.cached().is_none());
        assert_eq!(script.cache(Value::Int(1)), Value::Int(1));
        assert_eq!(script.cache(Value::Int(2)), Value::Int(1));
    }
}
