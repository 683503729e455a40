//! `import` resolution.
//!
//! A name resolves, in order, to a binding already in scope, a registered
//! host or script library, a sub-library reached through a registered
//! prefix, a dotted path through dicts already in scope, and finally
//! whatever the on-demand callback registers.
//!
//! Importing `a.b` first imports `a` when `a` is registered. A dict that
//! only exists as the parent of an earlier dotted import is a placeholder:
//! importing the library of that name later merges into it.

use sling_ir::Module;
use sling_value::errors::{module_not_found, recursion_limit_exceeded};
use sling_value::value::DictMap;
use sling_value::{
    EnvRef, EvalError, EvalResult, ExecContext, Frame, FrameKind, Value, DOC_KEY,
};

use super::{syntax_error, Interpreter};
use crate::registry::ScriptLibrary;

impl Interpreter {
    /// `import name [as alias]` into `env`.
    pub(super) fn import_into(
        &self,
        ctx: &ExecContext,
        name: &str,
        alias: Option<&str>,
        env: &EnvRef,
    ) -> Result<(), EvalError> {
        if let Some(existing) = self.arena().get(env, name) {
            if !self.is_placeholder(name, &existing) {
                if let Some(alias) = alias {
                    self.arena().set(env, alias, existing);
                }
                return Ok(());
            }
        }
        if alias.is_none() {
            self.import_parents(ctx, name, env)?;
        }
        let value = self.find_library(ctx, name, env)?;
        self.bind_library(name, alias, value, env);
        Ok(())
    }

    /// Import every registered proper prefix of `name`, shortest first.
    fn import_parents(&self, ctx: &ExecContext, name: &str, env: &EnvRef) -> Result<(), EvalError> {
        let prefixes = name.match_indices('.').map(|(at, _)| &name[..at]);
        for prefix in prefixes {
            if self.registry().contains(prefix) {
                self.import_into(ctx, prefix, None, env)?;
            }
        }
        Ok(())
    }

    /// A dict bound under a registered library's name before that library
    /// itself was imported.
    fn is_placeholder(&self, name: &str, existing: &Value) -> bool {
        matches!(existing, Value::Dict(_))
            && self.registry().contains(name)
            && !self.registry().is_imported(name)
    }

    /// The library value for `from name import ...`, without binding it.
    pub(super) fn resolve_library(&self, ctx: &ExecContext, name: &str, env: &EnvRef) -> EvalResult {
        if let Some(existing) = self.arena().get(env, name) {
            return Ok(existing);
        }
        let value = self.find_library(ctx, name, env)?;
        self.registry().mark_imported(name);
        Ok(value)
    }

    fn find_library(&self, ctx: &ExecContext, name: &str, env: &EnvRef) -> EvalResult {
        if let Some(value) = self.library_value(ctx, name)? {
            return Ok(value);
        }
        if let Some(value) = self.registered_prefix(ctx, name)? {
            return Ok(value);
        }
        if let Some(value) = self.traverse_bound(env, name) {
            return Ok(value);
        }
        // The callback gets one chance to register the library.
        if let Some(on_demand) = self.registry().on_demand() {
            tracing::debug!(name, "consulting on-demand library callback");
            if on_demand(self.registry(), name) {
                if let Some(value) = self.library_value(ctx, name)? {
                    return Ok(value);
                }
                if let Some(value) = self.registered_prefix(ctx, name)? {
                    return Ok(value);
                }
                if let Some(value) = self.traverse_bound(env, name) {
                    return Ok(value);
                }
            }
        }
        Err(module_not_found(name))
    }

    fn library_value(&self, ctx: &ExecContext, name: &str) -> Result<Option<Value>, EvalError> {
        if let Some(library) = self.registry().library(name) {
            return Ok(Some(library.to_dict()));
        }
        match self.registry().script(name) {
            Some(script) => self.load_script(ctx, name, &script).map(Some),
            None => Ok(None),
        }
    }

    /// `a.b.c` where the longest registered prefix, say `a`, holds `b` and
    /// then `c` as nested dict entries.
    fn registered_prefix(&self, ctx: &ExecContext, name: &str) -> Result<Option<Value>, EvalError> {
        for (at, _) in name.rmatch_indices('.') {
            if let Some(root) = self.library_value(ctx, &name[..at])? {
                return Ok(walk_dicts(root, name[at + 1..].split('.')));
            }
        }
        Ok(None)
    }

    /// `a.b.c` where `a` is bound and each step is a dict key.
    fn traverse_bound(&self, env: &EnvRef, name: &str) -> Option<Value> {
        let (root, rest) = name.split_once('.')?;
        let current = self.arena().get(env, root)?;
        walk_dicts(current, rest.split('.'))
    }

    /// Bind an imported library. A dotted name without alias also builds
    /// or extends the chain of parent dicts from its root, and is bound
    /// under its full dotted name. A placeholder already sitting where the
    /// library lands keeps the entries the library lacks.
    fn bind_library(&self, name: &str, alias: Option<&str>, value: Value, env: &EnvRef) {
        self.registry().mark_imported(name);
        if let Some(alias) = alias {
            self.arena().set(env, alias, value);
            return;
        }
        let parts: Vec<&str> = name.split('.').collect();
        let [root, path @ .., leaf] = parts.as_slice() else {
            let merged = merge_placeholder(value, self.arena().get(env, name));
            self.arena().set(env, name, merged);
            return;
        };
        let mut parent = match self.arena().get(env, root) {
            Some(dict @ Value::Dict(_)) => dict,
            _ => {
                let dict = Value::empty_dict();
                self.arena().set(env, root, dict.clone());
                dict
            }
        };
        for part in path {
            let Value::Dict(map) = &parent else { break };
            let existing = map.read().get(*part).cloned();
            let child = match existing {
                Some(dict @ Value::Dict(_)) => dict,
                _ => {
                    let dict = Value::empty_dict();
                    map.write().insert((*part).to_string(), dict.clone());
                    dict
                }
            };
            parent = child;
        }
        let mut value = value;
        if let Value::Dict(map) = &parent {
            let existing = map.read().get(*leaf).cloned();
            value = merge_placeholder(value, existing);
            map.write().insert((*leaf).to_string(), value.clone());
        }
        self.arena().set(env, name, value);
    }

    /// Evaluate a script library once and cache its bindings.
    #[tracing::instrument(level = "debug", skip(self, ctx, script))]
    fn load_script(&self, ctx: &ExecContext, name: &str, script: &ScriptLibrary) -> EvalResult {
        if let Some(cached) = script.cached() {
            return Ok(cached);
        }
        // Guards against libraries importing each other in a cycle.
        let _depth = ctx
            .call_depth()
            .enter()
            .ok_or_else(recursion_limit_exceeded)?;
        let module: Module = sling_parse::parse(script.source()).map_err(|err| syntax_error(&err))?;
        let scope = self.scoped(Frame::new(FrameKind::Module, None));
        self.run_module(ctx, &module, scope.env())?;
        let mut members: DictMap = self.arena().locals(scope.env()).into_iter().collect();
        if let Some(doc) = &module.docstring {
            members.insert(DOC_KEY.to_string(), Value::string(doc));
        }
        tracing::debug!(bindings = members.len(), "script library evaluated");
        Ok(script.cache(Value::dict(members)))
    }
}

/// Follow `parts` through nested dicts. `None` when a step is missing or
/// lands on something that is not a dict.
fn walk_dicts<'a>(root: Value, parts: impl Iterator<Item = &'a str>) -> Option<Value> {
    let mut current = root;
    for part in parts {
        let next = match &current {
            Value::Dict(map) => map.read().get(part).cloned()?,
            _ => return None,
        };
        current = next;
    }
    Some(current)
}

/// `value` extended with the entries of an earlier placeholder dict that it
/// lacks. Anything added goes into a fresh dict.
fn merge_placeholder(value: Value, existing: Option<Value>) -> Value {
    let (Value::Dict(fresh), Some(Value::Dict(old))) = (&value, &existing) else {
        return value;
    };
    if fresh.ptr_eq(old) {
        return value;
    }
    let missing: Vec<(String, Value)> = {
        let fresh = fresh.read();
        old.read()
            .iter()
            .filter(|(key, _)| !fresh.contains_key(*key))
            .map(|(key, item)| (key.clone(), item.clone()))
            .collect()
    };
    if missing.is_empty() {
        return value;
    }
    let mut map = fresh.read().clone();
    map.extend(missing);
    Value::dict(map)
}
