//! Key translation cache for maps with non-string keys
//!
//! Scripts name map entries by string (or by index, which is stringified).
//! The cache remembers which native key object each script-visible string
//! stands for. It is built lazily, in one pass over the keys present at that
//! moment, and then only grows: keys created from script are memoised as
//! they are first written.
//!
//! The cache is never refreshed behind the owner's back. Keys added to the
//! map by host code after the build are invisible to script lookups until
//! the owner calls `invalidate` (or rebuilds); keys removed by host code
//! keep their entry, which is harmless since every lookup is followed by a
//! containment check on the map itself.

use rustc_hash::FxHashMap;

use crate::host::HostValue;

/// String form → native key table.
#[derive(Debug, Default)]
pub struct KeyTranslationCache {
    entries: Option<FxHashMap<String, HostValue>>,
}

impl KeyTranslationCache {
    /// Create an unbuilt cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the initial scan has happened
    pub fn is_built(&self) -> bool {
        self.entries.is_some()
    }

    /// Number of cached translations
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, FxHashMap::len)
    }

    /// Check if no translation is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the contents with the string forms of `keys`.
    ///
    /// When two keys share a string form the later one wins.
    pub fn build<'a, I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = &'a HostValue>,
    {
        let entries = keys
            .into_iter()
            .map(|key| (key.to_script_string(), key.clone()))
            .collect();
        self.entries = Some(entries);
    }

    /// Native key cached for `name`
    pub fn lookup(&self, name: &str) -> Option<&HostValue> {
        self.entries.as_ref()?.get(name)
    }

    /// Remember that `name` stands for `key`
    pub fn memoize(&mut self, name: String, key: HostValue) {
        self.entries
            .get_or_insert_with(FxHashMap::default)
            .insert(name, key);
    }

    /// Drop every translation; the next lookup rebuilds
    pub fn invalidate(&mut self) {
        self.entries = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostRecord;

    #[test]
    fn test_unbuilt_cache() {
        let cache = KeyTranslationCache::new();
        assert!(!cache.is_built());
        assert!(cache.is_empty());
        assert!(cache.lookup("1").is_none());
    }

    #[test]
    fn test_build_uses_string_forms() {
        let point: HostValue = HostRecord::new("Point", vec![1.into(), 2.into()]).into();
        let keys = vec![HostValue::Int(1), HostValue::Double(2.5), point.clone()];

        let mut cache = KeyTranslationCache::new();
        cache.build(&keys);
        assert!(cache.is_built());
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.lookup("1"), Some(&HostValue::Int(1)));
        assert_eq!(cache.lookup("2.5"), Some(&HostValue::Double(2.5)));
        assert_eq!(cache.lookup("Point(1, 2)"), Some(&point));
    }

    #[test]
    fn test_colliding_string_forms_keep_last() {
        let keys = vec![HostValue::Int(1), HostValue::str("1")];
        let mut cache = KeyTranslationCache::new();
        cache.build(&keys);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("1"), Some(&HostValue::str("1")));
    }

    #[test]
    fn test_memoize_and_invalidate() {
        let mut cache = KeyTranslationCache::new();
        cache.build(std::iter::empty());
        cache.memoize("7".to_string(), HostValue::Long(7));
        assert_eq!(cache.lookup("7"), Some(&HostValue::Long(7)));

        cache.invalidate();
        assert!(!cache.is_built());
        assert!(cache.lookup("7").is_none());
    }
}
