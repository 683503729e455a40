//! Library registry: host libraries, script libraries and the on-demand
//! callback.
//!
//! The registry only stores. Resolution (`import`) lives on the
//! interpreter, since script libraries have to be evaluated on first use.
//! Map guards are never held across a call back into the interpreter.

use std::sync::{Arc, OnceLock};

use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use sling_value::{EvalError, Library, Value};

/// Deepest dotted library name accepted (`a.b.c.d.e`).
pub const MAX_LIBRARY_DEPTH: usize = 5;

/// Host hook consulted once when an import misses. Returning `true` means
/// the callback registered something and resolution should be retried.
pub type OnDemandFn = dyn Fn(&LibraryRegistry, &str) -> bool + Send + Sync;

/// Listing entry for [`LibraryRegistry::libraries`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryInfo {
    pub name: String,
    pub imported: bool,
}

/// Script source plus the dict its first evaluation produced.
pub(crate) struct ScriptLibrary {
    source: Arc<str>,
    cached: OnceLock<Value>,
}

impl ScriptLibrary {
    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn cached(&self) -> Option<Value> {
        self.cached.get().cloned()
    }

    /// Store the evaluated dict; a racing first import keeps the winner.
    pub(crate) fn cache(&self, value: Value) -> Value {
        self.cached.get_or_init(|| value).clone()
    }
}

#[derive(Default)]
pub struct LibraryRegistry {
    libraries: DashMap<String, Arc<Library>>,
    scripts: DashMap<String, Arc<ScriptLibrary>>,
    imported: DashSet<String>,
    on_demand: RwLock<Option<Arc<OnDemandFn>>>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        LibraryRegistry::default()
    }

    /// Register a host library. A second registration under the same name
    /// keeps the first.
    pub fn register_library(&self, library: Arc<Library>) -> Result<(), EvalError> {
        check_depth(library.name())?;
        tracing::debug!(name = library.name(), "registering library");
        self.libraries
            .entry(library.name().to_string())
            .or_insert(library);
        Ok(())
    }

    /// Register script source to be evaluated on first import. Replaces an
    /// earlier script of the same name along with its cache.
    pub fn register_script_library(&self, name: &str, source: &str) -> Result<(), EvalError> {
        check_depth(name)?;
        tracing::debug!(name, "registering script library");
        self.scripts.insert(
            name.to_string(),
            Arc::new(ScriptLibrary {
                source: Arc::from(source),
                cached: OnceLock::new(),
            }),
        );
        Ok(())
    }

    pub fn set_on_demand(&self, callback: Option<Arc<OnDemandFn>>) {
        *self.on_demand.write() = callback;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.libraries.contains_key(name) || self.scripts.contains_key(name)
    }

    pub fn library(&self, name: &str) -> Option<Arc<Library>> {
        self.libraries.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Every registered library, sorted by name.
    pub fn libraries(&self) -> Vec<LibraryInfo> {
        let mut infos: Vec<LibraryInfo> = self
            .libraries
            .iter()
            .map(|entry| entry.key().clone())
            .chain(self.scripts.iter().map(|entry| entry.key().clone()))
            .map(|name| LibraryInfo {
                imported: self.imported.contains(&name),
                name,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos.dedup_by(|a, b| a.name == b.name);
        infos
    }

    pub(crate) fn script(&self, name: &str) -> Option<Arc<ScriptLibrary>> {
        self.scripts.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn on_demand(&self) -> Option<Arc<OnDemandFn>> {
        self.on_demand.read().clone()
    }

    pub(crate) fn is_imported(&self, name: &str) -> bool {
        self.imported.contains(name)
    }

    pub(crate) fn mark_imported(&self, name: &str) {
        self.imported.insert(name.to_string());
    }
}

impl std::fmt::Debug for LibraryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryRegistry")
            .field("libraries", &self.libraries.len())
            .field("scripts", &self.scripts.len())
            .finish_non_exhaustive()
    }
}

pub(crate) fn check_depth(name: &str) -> Result<(), EvalError> {
    if name.split('.').count() > MAX_LIBRARY_DEPTH {
        return Err(EvalError::new(format!(
            "library nesting too deep (max {MAX_LIBRARY_DEPTH} levels): {name}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
