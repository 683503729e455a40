//! Host libraries exposed to scripts through `import`.
//!
//! A [`Library`] is immutable once built. Libraries are normally built once
//! per process behind a `OnceLock`, so every accessor returns the same
//! `Arc`. The dict view scripts see is built lazily and cached.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

use crate::context::ExecContext;
use crate::errors::EvalResult;
use crate::kwargs::Kwargs;
use crate::value::{DictMap, Value};

/// Key holding a library's description in its dict view.
pub const DOC_KEY: &str = "__doc__";

pub struct Library {
    name: String,
    description: String,
    functions: IndexMap<String, Value>,
    constants: IndexMap<String, Value>,
    sub_libraries: Vec<Arc<Library>>,
    dict: OnceLock<Value>,
}

impl Library {
    pub fn builder(name: impl Into<String>) -> LibraryBuilder {
        LibraryBuilder {
            name: name.into(),
            description: String::new(),
            functions: IndexMap::new(),
            constants: IndexMap::new(),
            sub_libraries: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn functions(&self) -> &IndexMap<String, Value> {
        &self.functions
    }

    pub fn constants(&self) -> &IndexMap<String, Value> {
        &self.constants
    }

    pub fn sub_libraries(&self) -> &[Arc<Library>] {
        &self.sub_libraries
    }

    /// Script-facing dict: functions, constants, nested sub-library dicts
    /// and `__doc__` when a description is set. Built on first use.
    pub fn to_dict(&self) -> Value {
        self.dict
            .get_or_init(|| {
                let mut map = DictMap::new();
                for (name, func) in &self.functions {
                    map.insert(name.clone(), func.clone());
                }
                for (name, value) in &self.constants {
                    map.insert(name.clone(), value.clone());
                }
                for sub in &self.sub_libraries {
                    map.insert(sub.short_name().to_string(), sub.to_dict());
                }
                if !self.description.is_empty() {
                    map.insert(DOC_KEY.to_string(), Value::string(&self.description));
                }
                Value::dict(map)
            })
            .clone()
    }

    /// Last segment of a dotted name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("constants", &self.constants.keys().collect::<Vec<_>>())
            .field("sub_libraries", &self.sub_libraries.len())
            .finish_non_exhaustive()
    }
}

pub struct LibraryBuilder {
    name: String,
    description: String,
    functions: IndexMap<String, Value>,
    constants: IndexMap<String, Value>,
    sub_libraries: Vec<Arc<Library>>,
}

impl LibraryBuilder {
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a host function.
    #[must_use]
    pub fn function<F>(mut self, name: &str, help: &str, func: F) -> Self
    where
        F: Fn(&ExecContext, Kwargs, Vec<Value>) -> EvalResult + Send + Sync + 'static,
    {
        let help = (!help.is_empty()).then(|| help.to_string());
        self.functions
            .insert(name.to_string(), Value::builtin(name, help, func));
        self
    }

    /// Add any callable under `name` (a class, say).
    #[must_use]
    pub fn callable(mut self, name: &str, value: Value) -> Self {
        self.functions.insert(name.to_string(), value);
        self
    }

    #[must_use]
    pub fn constant(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.constants.insert(name.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn sub_library(mut self, library: Arc<Library>) -> Self {
        self.sub_libraries.push(library);
        self
    }

    pub fn build(self) -> Arc<Library> {
        Arc::new(Library {
            name: self.name,
            description: self.description,
            functions: self.functions,
            constants: self.constants,
            sub_libraries: self.sub_libraries,
            dict: OnceLock::new(),
        })
    }
}

#[cfg(test)]
mod tests;
