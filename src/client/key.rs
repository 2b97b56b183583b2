/*!
 * Cache Keys
 * Query parameters and canonical cache-key derivation
 */

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Flat query parameters
///
/// Values are stringified on insert: `null` is dropped, strings are kept
/// verbatim, numbers and booleans use their JSON text, and arrays or objects
/// are stored as compact JSON with sorted object keys. Iteration is always in
/// key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryParams {
    params: BTreeMap<String, String>,
}

fn stringify(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        // serde_json maps are ordered, so nested objects print canonically
        other => Some(other.to_string()),
    }
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a parameter; a `null` value removes it
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        match stringify(value.into()) {
            Some(value) => {
                self.params.insert(key, value);
            }
            None => {
                self.params.remove(&key);
            }
        }
    }

    /// Parameters from a JSON object; anything else yields no parameters
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::default();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Canonical identity of one cached GET
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path: String,
    query: String,
}

impl CacheKey {
    pub fn new(path: &str, params: &QueryParams) -> Self {
        let query = if params.is_empty() {
            String::new()
        } else {
            let map: Map<String, Value> = params
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect();
            Value::Object(map).to_string()
        };

        Self {
            path: path.to_string(),
            query,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// True when this key's path equals `prefix` or lies beneath it
    ///
    /// Matching is per path segment: `/homework` covers `/homework/7` but not
    /// `/homeworks`.
    pub fn is_under(&self, prefix: &str) -> bool {
        if prefix.is_empty() || prefix.ends_with('/') {
            return self.path.starts_with(prefix);
        }
        match self.path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.query.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}?{}", self.path, self.query)
        }
    }
}

/// First path segment, the scope a write invalidates
///
/// `/homework/42/submissions` becomes `/homework`.
pub fn resource_root(path: &str) -> &str {
    let trimmed = path.trim_start_matches('/');
    let segment_len = trimmed.find(['/', '?']).unwrap_or(trimmed.len());
    let start = path.len() - trimmed.len();
    &path[..start + segment_len]
}
