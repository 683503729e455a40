//! Classes and instances.
//!
//! A class is immutable once built. The recognized dunder methods are
//! resolved a single time, with the parent chain folded in, into a
//! [`Dunders`] table so indexing and `with` dispatch never walk the chain.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::Value;

pub const INIT: &str = "__init__";
pub const GETITEM: &str = "__getitem__";
pub const SETITEM: &str = "__setitem__";
pub const ENTER: &str = "__enter__";
pub const EXIT: &str = "__exit__";

/// Resolved dunder capability table.
#[derive(Clone, Debug, Default)]
pub struct Dunders {
    pub init: Option<Value>,
    pub getitem: Option<Value>,
    pub setitem: Option<Value>,
    pub enter: Option<Value>,
    pub exit: Option<Value>,
}

impl Dunders {
    fn resolve(members: &IndexMap<String, Value>, parent: Option<&ClassValue>) -> Self {
        let inherited = parent.map(|p| p.dunders.clone()).unwrap_or_default();
        let own = |name: &str| members.get(name).filter(|v| v.is_callable()).cloned();
        Dunders {
            init: own(INIT).or(inherited.init),
            getitem: own(GETITEM).or(inherited.getitem),
            setitem: own(SETITEM).or(inherited.setitem),
            enter: own(ENTER).or(inherited.enter),
            exit: own(EXIT).or(inherited.exit),
        }
    }

    pub fn is_context_manager(&self) -> bool {
        self.enter.is_some() && self.exit.is_some()
    }
}

#[derive(Debug)]
pub struct ClassValue {
    name: String,
    parent: Option<Arc<ClassValue>>,
    members: IndexMap<String, Value>,
    dunders: Dunders,
    doc: Option<String>,
}

impl ClassValue {
    pub fn new(
        name: impl Into<String>,
        parent: Option<Arc<ClassValue>>,
        members: IndexMap<String, Value>,
        doc: Option<String>,
    ) -> Self {
        let dunders = Dunders::resolve(&members, parent.as_deref());
        ClassValue {
            name: name.into(),
            parent,
            members,
            dunders,
            doc,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ClassValue>> {
        self.parent.as_ref()
    }

    /// Members defined directly on this class.
    pub fn members(&self) -> &IndexMap<String, Value> {
        &self.members
    }

    #[inline]
    pub fn dunders(&self) -> &Dunders {
        &self.dunders
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Member lookup along the class chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut class = self;
        loop {
            if let Some(value) = class.members.get(name) {
                return Some(value.clone());
            }
            class = class.parent.as_deref()?;
        }
    }

    /// Member lookup that also reports the class defining it.
    pub fn lookup_with_owner(self: &Arc<Self>, name: &str) -> Option<(Value, Arc<ClassValue>)> {
        let mut class = Arc::clone(self);
        loop {
            if let Some(value) = class.members.get(name) {
                return Some((value.clone(), class));
            }
            class = Arc::clone(class.parent.as_ref()?);
        }
    }

    /// Whether `name` is this class or one of its ancestors.
    pub fn is_or_inherits(&self, name: &str) -> bool {
        let mut class = Some(self);
        while let Some(c) = class {
            if c.name == name {
                return true;
            }
            class = c.parent.as_deref();
        }
        false
    }
}

/// An instance: a shared class reference and its own field map.
#[derive(Debug)]
pub struct InstanceValue {
    class: Arc<ClassValue>,
    fields: RwLock<IndexMap<String, Value>>,
}

impl InstanceValue {
    pub fn new(class: Arc<ClassValue>) -> Self {
        InstanceValue {
            class,
            fields: RwLock::new(IndexMap::new()),
        }
    }

    #[inline]
    pub fn class(&self) -> &Arc<ClassValue> {
        &self.class
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        // Replaced value drops after the guard is released.
        let _old = self.fields.write().insert(name.into(), value);
    }

    pub fn remove_field(&self, name: &str) -> Option<Value> {
        self.fields.write().shift_remove(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.read().contains_key(name)
    }

    /// Snapshot of the fields in insertion order.
    pub fn fields(&self) -> IndexMap<String, Value> {
        self.fields.read().clone()
    }
}
