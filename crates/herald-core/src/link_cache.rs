//! Bounded map from a triggering message to the responses it produced.
//!
//! The cache backs cascading deletion: when the message that invoked a
//! command is deleted, every response the bot linked to it can be deleted
//! too. Capacity is fixed; inserting a new source beyond it evicts the source
//! that was inserted first (FIFO, lookups do not refresh an entry).
//!
//! A capacity of `0` disables tracking entirely and allocates nothing.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;

use parking_lot::Mutex;
use tracing::trace;

struct LinkCacheInner<K, V> {
    /// Source keys in insertion order, oldest first.
    order: VecDeque<K>,
    links: HashMap<K, HashSet<V>>,
}

/// Fixed-capacity FIFO map from a source id to a set of response ids.
pub struct LinkCache<K, V> {
    capacity: usize,
    inner: Option<Mutex<LinkCacheInner<K, V>>>,
}

impl<K, V> LinkCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Eq + Hash,
{
    /// Creates a cache holding at most `capacity` source keys.
    pub fn new(capacity: usize) -> Self {
        let inner = (capacity > 0).then(|| {
            Mutex::new(LinkCacheInner {
                order: VecDeque::with_capacity(capacity),
                links: HashMap::with_capacity(capacity),
            })
        });
        Self { capacity, inner }
    }

    /// Records that `response` was produced for `source`.
    ///
    /// Does nothing when the cache is disabled.
    pub fn link(&self, source: K, response: V) {
        let Some(inner) = &self.inner else {
            return;
        };
        let mut inner = inner.lock();

        if let Some(responses) = inner.links.get_mut(&source) {
            responses.insert(response);
            return;
        }

        if inner.links.len() >= self.capacity
            && let Some(oldest) = inner.order.pop_front()
        {
            trace!(source = ?oldest, "Evicted oldest linked message");
            inner.links.remove(&oldest);
        }

        inner.order.push_back(source.clone());
        inner.links.insert(source, HashSet::from([response]));
    }

    /// Removes and returns every response linked to `source`.
    pub fn consume(&self, source: &K) -> Option<HashSet<V>> {
        let mut inner = self.inner.as_ref()?.lock();
        let responses = inner.links.remove(source)?;
        inner.order.retain(|key| key != source);
        Some(responses)
    }

    /// Returns `true` if `source` currently has linked responses.
    pub fn contains(&self, source: &K) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.lock().links.contains_key(source))
    }

    /// Returns the number of resident source keys.
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.lock().links.len())
    }

    /// Returns `true` if no source key is resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `false` when the cache was created with capacity `0`.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

impl<K, V> fmt::Debug for LinkCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkCache")
            .field("capacity", &self.capacity)
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}
