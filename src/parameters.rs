//! Authorization-request parameters and their merge semantics.

use std::collections::{BTreeMap, HashMap};

/// Scope always present after a scope union.
const OPENID_SCOPE: &str = "openid";

/// An immutable key/value collection of authorization-request parameters.
///
/// Keys are unique; entry order is not part of the contract (iteration is
/// sorted only so output is deterministic). A set is built fresh for each
/// authorization attempt and dropped once the URL has been built.
///
/// Merge precedence, lowest to highest: provider defaults, typed builder
/// values, caller-supplied extras — with the single exception that a `scope`
/// arriving through extras is unioned with the scope already present rather
/// than overwriting it (see [`ParameterSet::merge`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, overwriting any earlier value for the same key.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Set a parameter only if a value is present.
    pub fn set_opt(self, key: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge defaults, typed builder values, and free-form extras into the
    /// final per-attempt set.
    ///
    /// `overrides` overwrite `defaults` key by key. `extras` overwrite the
    /// result of that, except `scope`: the final scope is the deduplicated
    /// space-delimited union of whatever scope is already present and the
    /// extras scope, and always contains `openid`.
    pub fn merge(
        defaults: ParameterSet,
        overrides: ParameterSet,
        extras: &HashMap<String, String>,
    ) -> ParameterSet {
        let mut merged = defaults;
        for (key, value) in overrides.entries {
            merged.entries.insert(key, value);
        }
        for (key, value) in extras {
            if key == "scope" {
                let unioned = union_scopes(merged.get("scope"), value);
                merged.entries.insert(key.clone(), unioned);
            } else {
                merged.entries.insert(key.clone(), value.clone());
            }
        }
        merged
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Space-delimited set union of two scope strings, `openid` included.
///
/// Existing tokens keep their relative order, novel ones append; only the
/// resulting token set is contractual.
fn union_scopes(existing: Option<&str>, extra: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut out: Vec<&str> = Vec::new();
    for token in std::iter::once(OPENID_SCOPE)
        .chain(existing.unwrap_or_default().split_whitespace())
        .chain(extra.split_whitespace())
    {
        if seen.insert(token) {
            out.push(token);
        }
    }
    out.join(" ")
}
