//! Bounded parse-tree cache.
//!
//! Keyed by the xxh3 hash of the source text and evicted in insertion order:
//! once full, the least-recently-added tree goes first, and a hit does not
//! move an entry. A hit is only accepted when the cached tree was parsed from
//! byte-identical text, so two sources never share a tree even if their
//! hashes collide. Tracks hits/misses/rate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use polyglot_core::constants::DEFAULT_PARSE_CACHE_CAPACITY;
use polyglot_core::errors::ParseError;
use rustc_hash::FxHashMap;

use super::hasher::hash_content;
use super::tree::ParsedTree;

#[derive(Default)]
struct Entries {
    trees: FxHashMap<u64, Arc<ParsedTree>>,
    /// Keys oldest first.
    order: VecDeque<u64>,
}

pub struct ParseCache {
    entries: Mutex<Entries>,
    capacity: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ParseCache {
    /// Create a cache holding at most `capacity` trees.
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lookup(&self, key: u64) -> Option<Arc<ParsedTree>> {
        let entries = self.entries.lock().ok()?;
        entries.trees.get(&key).cloned()
    }

    /// Get the cached tree for exactly this source text.
    pub fn get(&self, source: &str) -> Option<Arc<ParsedTree>> {
        let key = hash_content(source.as_bytes());
        match self.lookup(key) {
            Some(tree) if tree.source == source => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(tree)
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert a tree under the hash of its own source text.
    pub fn insert(&self, tree: Arc<ParsedTree>) {
        let key = hash_content(tree.source.as_bytes());
        self.insert_keyed(key, tree);
    }

    fn insert_keyed(&self, key: u64, tree: Arc<ParsedTree>) {
        if self.capacity == 0 {
            return;
        }
        // A poisoned lock only costs a cache miss later.
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.trees.insert(key, tree).is_some() {
            // Replacing keeps the original insertion slot.
            return;
        }
        entries.order.push_back(key);
        while entries.order.len() as u64 > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.trees.remove(&oldest);
                tracing::trace!(key = oldest, "evicted parse tree");
            }
        }
    }

    /// Return the cached tree for `source`, or run `parse` and cache its
    /// result. The flag is `true` on a hit.
    pub fn get_or_parse<F>(&self, source: &str, parse: F) -> Result<(Arc<ParsedTree>, bool), ParseError>
    where
        F: FnOnce() -> Result<ParsedTree, ParseError>,
    {
        if let Some(tree) = self.get(source) {
            return Ok((tree, true));
        }
        let tree = Arc::new(parse()?);
        self.insert(Arc::clone(&tree));
        Ok((tree, false))
    }

    /// Whether a tree for exactly this source text is cached. Does not
    /// count as a hit or miss.
    pub fn contains(&self, source: &str) -> bool {
        self.lookup(hash_content(source.as_bytes()))
            .is_some_and(|tree| tree.source == source)
    }

    /// Total cache hits.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total cache misses.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let h = self.hits() as f64;
        let m = self.misses() as f64;
        let total = h + m;
        if total == 0.0 {
            0.0
        } else {
            h / total
        }
    }

    /// Number of trees currently cached.
    pub fn entry_count(&self) -> u64 {
        self.entries
            .lock()
            .map(|entries| entries.trees.len() as u64)
            .unwrap_or(0)
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Drop every cached tree.
    pub fn invalidate_all(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.trees.clear();
            entries.order.clear();
        }
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(DEFAULT_PARSE_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for ParseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseCache")
            .field("capacity", &self.capacity)
            .field("entries", &self.entry_count())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::language::Language;
    use crate::parsers::tree::parse_tree;

    fn parse(source: &str) -> Result<ParsedTree, ParseError> {
        parse_tree(Language::JavaScript, source, Path::new("t.js"))
    }

    fn fill(cache: &ParseCache, source: &str) -> bool {
        cache.get_or_parse(source, || parse(source)).unwrap().1
    }

    #[test]
    fn second_lookup_hits() {
        let cache = ParseCache::new(4);
        let (first, hit) = cache.get_or_parse("a + 1;", || parse("a + 1;")).unwrap();
        assert!(!hit);
        let (second, hit) = cache.get_or_parse("a + 1;", || panic!("re-parsed")).unwrap();
        assert!(hit);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert!((cache.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn different_text_never_shares_a_tree() {
        let cache = ParseCache::new(4);
        let (a, _) = cache.get_or_parse("a + 1;", || parse("a + 1;")).unwrap();
        let (b, hit) = cache.get_or_parse("a + 2;", || parse("a + 2;")).unwrap();
        assert!(!hit);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.source, "a + 2;");
    }

    #[test]
    fn mismatched_source_under_same_key_is_a_miss() {
        let cache = ParseCache::new(4);
        let tree = Arc::new(parse("x;").unwrap());
        // Simulate a collision: store a tree under another text's key.
        cache.insert_keyed(hash_content(b"y;"), Arc::clone(&tree));
        assert!(cache.get("y;").is_none());
        assert!(!cache.contains("y;"));
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn capacity_is_bounded() {
        let cache = ParseCache::new(2);
        for i in 0..10 {
            fill(&cache, &format!("f({i});"));
        }
        assert_eq!(cache.entry_count(), 2);
        assert_eq!(cache.capacity(), 2);
        assert!(cache.contains("f(8);"));
        assert!(cache.contains("f(9);"));
    }

    #[test]
    fn hit_does_not_protect_the_oldest_entry() {
        let cache = ParseCache::new(2);
        assert!(!fill(&cache, "a;"));
        assert!(!fill(&cache, "b;"));
        assert!(fill(&cache, "a;"));
        assert!(!fill(&cache, "c;"));

        assert!(!cache.contains("a;"));
        assert!(cache.contains("b;"));
        assert!(cache.contains("c;"));
    }

    #[test]
    fn reinserting_keeps_the_original_slot() {
        let cache = ParseCache::new(2);
        fill(&cache, "a;");
        fill(&cache, "b;");
        cache.insert(Arc::new(parse("a;").unwrap()));
        fill(&cache, "c;");
        assert!(!cache.contains("a;"));
        assert!(cache.contains("b;"));
    }

    #[test]
    fn zero_capacity_caches_nothing() {
        let cache = ParseCache::new(0);
        assert!(!fill(&cache, "a;"));
        assert!(!fill(&cache, "a;"));
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn invalidate_all_empties_the_cache() {
        let cache = ParseCache::new(4);
        fill(&cache, "a;");
        fill(&cache, "b;");
        cache.invalidate_all();
        assert_eq!(cache.entry_count(), 0);
        assert!(!fill(&cache, "a;"));
    }
}
