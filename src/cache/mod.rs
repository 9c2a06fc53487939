//! Widget render cache.
//!
//! Widgets whose inputs have not changed since the last frame can skip
//! drawing entirely: their cells are captured once and blitted back on later
//! frames. Entries are keyed by widget identity plus geometry and validated
//! by a caller-supplied content hash; when the hash changes the entry is
//! dropped and the widget redraws.
//!
//! The cache is bounded and evicts the least recently used entry. Recency is
//! a monotonically increasing tick kept in a `BTreeMap`, so finding the LRU
//! entry is `O(log n)`.

use crate::buffer::Snapshot;
use crate::layout::Rect;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Default number of widgets kept.
pub const DEFAULT_CAPACITY: usize = 128;

/// Hash any hashable widget input into the string form the cache compares.
///
/// The cache never looks inside widgets; callers hash whatever determines
/// the widget's appearance (text, colors, state) and pass the result to
/// [`RenderCache::try_get`] and [`RenderCache::store`].
pub fn content_hash<T: Hash + ?Sized>(value: &T) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Identity and placement of a cached widget.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetKey {
    /// Kind of widget, e.g. `"status_bar"`.
    pub widget_type: String,
    /// Instance name, distinguishing widgets of the same kind.
    pub widget_name: String,
    /// Column of the top-left corner.
    pub x: u16,
    /// Row of the top-left corner.
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
    /// Layer the widget is drawn on.
    pub z_index: i32,
}

impl WidgetKey {
    /// Create a key for a widget occupying `rect` on layer `z_index`.
    pub fn new(
        widget_type: impl Into<String>,
        widget_name: impl Into<String>,
        rect: Rect,
        z_index: i32,
    ) -> Self {
        Self {
            widget_type: widget_type.into(),
            widget_name: widget_name.into(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            z_index,
        }
    }

    /// The area the widget covers.
    pub const fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// The string the cache indexes by: every field joined with `|`.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.widget_type,
            self.widget_name,
            self.x,
            self.y,
            self.width,
            self.height,
            self.z_index
        )
    }

    /// A key with neither a type nor a name identifies nothing and is never
    /// cached.
    pub fn is_anonymous(&self) -> bool {
        self.widget_type.is_empty() && self.widget_name.is_empty()
    }
}

impl fmt::Display for WidgetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

/// A cached widget: where it was drawn and the cells it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedWidget {
    /// Column of the top-left corner.
    pub x: u16,
    /// Row of the top-left corner.
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
    /// Layer the widget was drawn on.
    pub z_index: i32,
    /// Hash of the inputs the cells were rendered from.
    pub content_hash: String,
    /// The rendered cells.
    pub cells: Snapshot,
}

/// Counters for monitoring cache performance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that returned an entry.
    pub hits: u64,
    /// Lookups that returned nothing (including stale entries).
    pub misses: u64,
    /// Entries removed to make room.
    pub evictions: u64,
    /// Entries removed because their content hash no longer matched.
    pub invalidations: u64,
    /// Current number of entries.
    pub entries: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, in `0.0..=1.0`. Zero when nothing has
    /// been looked up yet.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total lookups.
    pub const fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

#[derive(Debug)]
struct Entry {
    widget: CachedWidget,
    last_used: u64,
}

/// Bounded LRU cache of rendered widgets.
///
/// One cache lives for the whole process and is passed by `&mut` to the code
/// that draws widgets (see [`Compositor::render_widget`]).
///
/// [`Compositor::render_widget`]: crate::Compositor::render_widget
#[derive(Debug)]
pub struct RenderCache {
    entries: HashMap<String, Entry>,
    /// `last_used` tick → cache key. Smallest tick is the LRU entry.
    recency: BTreeMap<u64, String>,
    tick: u64,
    capacity: usize,
    stats: CacheStats,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RenderCache {
    /// Create a cache holding at most `capacity` widgets. A capacity of zero
    /// disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            recency: BTreeMap::new(),
            tick: 0,
            capacity,
            stats: CacheStats::default(),
        }
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check for an entry without touching recency or statistics.
    pub fn contains(&self, key: &WidgetKey) -> bool {
        self.entries.contains_key(&key.cache_key())
    }

    /// Look up a widget.
    ///
    /// A hit refreshes the entry's recency. An entry stored under a
    /// different content hash is stale: it is removed on the spot and the
    /// lookup counts as both an invalidation and a miss. An anonymous key or
    /// an empty hash always misses.
    pub fn try_get(&mut self, key: &WidgetKey, hash: &str) -> Option<&CachedWidget> {
        if key.is_anonymous() || hash.is_empty() {
            self.stats.misses += 1;
            return None;
        }

        let id = key.cache_key();
        let stale = match self.entries.get(&id) {
            Some(entry) => entry.widget.content_hash != hash,
            None => {
                self.stats.misses += 1;
                return None;
            }
        };

        if stale {
            self.remove_entry(&id);
            self.stats.invalidations += 1;
            self.stats.misses += 1;
            tracing::trace!(key = %id, "cache entry stale, removed");
            return None;
        }

        self.stats.hits += 1;
        self.tick += 1;
        let tick = self.tick;
        let entry = self.entries.get_mut(&id)?;
        self.recency.remove(&entry.last_used);
        entry.last_used = tick;
        self.recency.insert(tick, id);
        Some(&entry.widget)
    }

    /// Insert or replace a widget's cells.
    ///
    /// Inserting a new key into a full cache evicts exactly one entry, the
    /// least recently used. Anonymous keys, empty hashes and a zero capacity
    /// make this a no-op.
    pub fn store(&mut self, key: &WidgetKey, hash: impl Into<String>, cells: Snapshot) {
        let content_hash = hash.into();
        if self.capacity == 0 || key.is_anonymous() || content_hash.is_empty() {
            return;
        }

        let id = key.cache_key();
        let widget = CachedWidget {
            x: key.x,
            y: key.y,
            width: key.width,
            height: key.height,
            z_index: key.z_index,
            content_hash,
            cells,
        };

        self.tick += 1;
        let tick = self.tick;

        if let Some(entry) = self.entries.get_mut(&id) {
            self.recency.remove(&entry.last_used);
            entry.widget = widget;
            entry.last_used = tick;
            self.recency.insert(tick, id);
            return;
        }

        if self.entries.len() >= self.capacity {
            self.evict_lru();
        }

        self.recency.insert(tick, id.clone());
        self.entries.insert(
            id,
            Entry {
                widget,
                last_used: tick,
            },
        );
    }

    /// Drop every entry. Statistics other than the entry count are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            capacity: self.capacity,
            ..self.stats
        }
    }

    /// Zero the hit/miss/eviction/invalidation counters.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    fn evict_lru(&mut self) {
        if let Some((_, id)) = self.recency.pop_first() {
            self.entries.remove(&id);
            self.stats.evictions += 1;
            tracing::trace!(key = %id, "evicted least recently used widget");
        }
    }

    fn remove_entry(&mut self, id: &str) {
        if let Some(entry) = self.entries.remove(id) {
            self.recency.remove(&entry.last_used);
        }
    }
}
