//! Keyword arguments passed to a call.
//!
//! Two accessor families:
//!
//! - `must_get_*` is permissive: a missing or mis-shaped entry yields the
//!   caller's default.
//! - `get_*` is precise: a missing entry yields the default, a mis-shaped one
//!   an error prefixed with the keyword name.

use rustc_hash::FxHashMap;

use crate::errors::EvalError;
use crate::value::Value;

/// Name to value map. Keyword order is not preserved.
#[derive(Clone, Debug, Default)]
pub struct Kwargs {
    entries: FxHashMap<String, Value>,
}

impl Kwargs {
    pub fn new() -> Self {
        Kwargs::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Keyword names, sorted for stable iteration.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert, returning the previous value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Fresh map holding `self` overlaid with `overrides`.
    #[must_use]
    pub fn merged(&self, overrides: &Kwargs) -> Kwargs {
        let mut merged = self.clone();
        for (name, value) in overrides.iter() {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    // Permissive accessors

    pub fn must_get_string(&self, name: &str, default: &str) -> String {
        self.get(name)
            .and_then(|v| v.as_string().ok())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn must_get_int(&self, name: &str, default: i64) -> i64 {
        self.get(name)
            .and_then(|v| v.as_int().ok())
            .unwrap_or(default)
    }

    pub fn must_get_float(&self, name: &str, default: f64) -> f64 {
        self.get(name)
            .and_then(|v| v.as_float().ok())
            .unwrap_or(default)
    }

    pub fn must_get_bool(&self, name: &str, default: bool) -> bool {
        self.get(name)
            .and_then(|v| v.as_bool().ok())
            .unwrap_or(default)
    }

    pub fn must_get_list(&self, name: &str, default: Vec<Value>) -> Vec<Value> {
        self.get(name)
            .and_then(|v| v.as_list().ok())
            .unwrap_or(default)
    }

    // Precise accessors

    pub fn get_string(&self, name: &str, default: &str) -> Result<String, EvalError> {
        self.precise(name, Value::as_string)
            .map(|v| v.unwrap_or_else(|| default.to_string()))
    }

    pub fn get_int(&self, name: &str, default: i64) -> Result<i64, EvalError> {
        self.precise(name, Value::as_int)
            .map(|v| v.unwrap_or(default))
    }

    pub fn get_float(&self, name: &str, default: f64) -> Result<f64, EvalError> {
        self.precise(name, Value::as_float)
            .map(|v| v.unwrap_or(default))
    }

    pub fn get_bool(&self, name: &str, default: bool) -> Result<bool, EvalError> {
        self.precise(name, Value::as_bool)
            .map(|v| v.unwrap_or(default))
    }

    pub fn get_list(&self, name: &str, default: Vec<Value>) -> Result<Vec<Value>, EvalError> {
        self.precise(name, Value::as_list)
            .map(|v| v.unwrap_or(default))
    }

    fn precise<T>(
        &self,
        name: &str,
        coerce: impl FnOnce(&Value) -> Result<T, EvalError>,
    ) -> Result<Option<T>, EvalError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => coerce(value)
                .map(Some)
                .map_err(|err| err.with_prefix(&format!("{name}: "))),
        }
    }
}

impl FromIterator<(String, Value)> for Kwargs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Kwargs {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Kwargs {
    type Item = (String, Value);
    type IntoIter = std::collections::hash_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests;
