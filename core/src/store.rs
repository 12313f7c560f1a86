//! Per-level schema store and field visibility.
//!
//! A [`SchemaStore`] is built once from a list of path strings and is never
//! mutated afterwards. It maps every head segment (negation marker included)
//! to the tails that follow it, so that one level of a traversal can decide
//! which fields to emit and what schema to hand to each nested field.
//!
//! # Example
//!
//! ```
//! use to_dict_core::{PrivacyRule, SchemaStore};
//!
//! let store = SchemaStore::load(["-age", "child.value", "child.extra"]);
//! let privacy = PrivacyRule::default();
//!
//! assert!(!store.is_included("age", true, &privacy));
//! assert!(store.is_included("child", false, &privacy));
//! assert_eq!(store.sub_schema("child").unwrap(), vec!["value", "extra"]);
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::PrivacyRule;
use crate::error::{Result, SerializeError};
use crate::path;

/// Lookup table from head segment to the tails rooted at it.
///
/// A key and its negated counterpart may both be present; resolution in
/// [`is_included`](SchemaStore::is_included) arbitrates between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaStore {
    keys: BTreeMap<String, Vec<Vec<String>>>,
}

impl SchemaStore {
    /// Builds a store from path strings.
    ///
    /// A head seen for the first time gets `[tail]`, or no tails for a bare
    /// key. Later mentions of the same head only append non-empty tails, so
    /// a bare re-mention never erases sub-schemas already recorded.
    ///
    /// # Examples
    ///
    /// ```
    /// use to_dict_core::SchemaStore;
    ///
    /// let store = SchemaStore::load(["a.b", "a", "a.c.d"]);
    /// assert_eq!(store.tails("a").unwrap().len(), 2);
    /// assert!(store.tails("z").is_none());
    /// ```
    pub fn load<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut store = Self::default();
        for raw in paths {
            let (head, tail) = path::split(raw.as_ref());
            let tail: Vec<String> = tail.into_iter().map(String::from).collect();
            store.insert(head, tail);
        }
        debug!(keys = ?store.keys, "Loaded schema");
        store
    }

    fn insert(&mut self, head: &str, tail: Vec<String>) {
        match self.keys.get_mut(head) {
            Some(tails) => {
                if !tail.is_empty() {
                    tails.push(tail);
                }
            }
            None => {
                let tails = if tail.is_empty() { Vec::new() } else { vec![tail] };
                self.keys.insert(head.to_string(), tails);
            }
        }
    }

    /// Returns `true` if no path was loaded.
    ///
    /// # Examples
    ///
    /// ```
    /// use to_dict_core::SchemaStore;
    ///
    /// assert!(SchemaStore::default().is_empty());
    /// assert!(SchemaStore::load(&[] as &[&str]).is_empty());
    /// assert!(!SchemaStore::load(["a"]).is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns `true` if `key` (taken verbatim) is a head in the store.
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Returns the tails stored under `key`, taken verbatim.
    pub fn tails(&self, key: &str) -> Option<&[Vec<String>]> {
        self.keys.get(key).map(Vec::as_slice)
    }

    /// Decides whether the field `key` is emitted at this level.
    ///
    /// The checks run in a fixed order:
    ///
    /// 1. a negated key with no tails excludes the field outright;
    /// 2. a wildcard head includes it;
    /// 3. an explicit mention includes it;
    /// 4. otherwise it is included only in greedy mode, and never when
    ///    `privacy` marks it private.
    ///
    /// # Examples
    ///
    /// ```
    /// use to_dict_core::{PrivacyRule, SchemaStore};
    ///
    /// let privacy = PrivacyRule::default();
    /// let store = SchemaStore::load(["*", "-secret"]);
    /// assert!(store.is_included("anything", false, &privacy));
    /// assert!(!store.is_included("secret", true, &privacy));
    ///
    /// let empty = SchemaStore::default();
    /// assert!(empty.is_included("name", true, &privacy));
    /// assert!(!empty.is_included("_name", true, &privacy));
    /// assert!(!empty.is_included("name", false, &privacy));
    /// ```
    pub fn is_included(&self, key: &str, greedy: bool, privacy: &PrivacyRule) -> bool {
        if let Some(tails) = self.keys.get(&path::negate(key)) {
            if tails.is_empty() {
                return false;
            }
        }
        if self.contains(path::WILDCARD) {
            return true;
        }
        self.contains(key) || (greedy && !privacy.is_private(key))
    }

    /// Computes the schema handed to the nested traversal of field `key`.
    ///
    /// Tails under the plain key are rejoined as-is. Tails under the negated
    /// key move the negation marker onto their first segment, pushing the
    /// exclusion one level deeper.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::ExcludedKeyHasSubkeys`] if an empty tail is
    /// stored under the negated key, since an outright exclusion cannot
    /// carry nested rules.
    ///
    /// # Examples
    ///
    /// ```
    /// use to_dict_core::SchemaStore;
    ///
    /// let store = SchemaStore::load(["a.b", "-a.c.*"]);
    /// assert_eq!(store.sub_schema("a").unwrap(), vec!["b", "-c.*"]);
    /// assert!(store.sub_schema("missing").unwrap().is_empty());
    /// ```
    pub fn sub_schema(&self, key: &str) -> Result<Vec<String>> {
        let mut schema = Vec::new();

        if let Some(tails) = self.keys.get(key) {
            schema.extend(
                tails
                    .iter()
                    .filter(|tail| !tail.is_empty())
                    .map(|tail| path::join(tail)),
            );
        }

        let negated = path::negate(key);
        if let Some(tails) = self.keys.get(&negated) {
            for tail in tails {
                let Some((first, rest)) = tail.split_first() else {
                    return Err(SerializeError::ExcludedKeyHasSubkeys { key: negated });
                };
                let mut shifted = Vec::with_capacity(tail.len());
                shifted.push(path::negate(first));
                shifted.extend(rest.iter().cloned());
                schema.push(path::join(&shifted));
            }
        }

        Ok(schema)
    }
}
