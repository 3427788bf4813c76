//! Per-key cooldown expiry tracking.
//!
//! Keys are opaque to the tracker. Integrators usually build them from the
//! command name plus a scope, e.g. `"ping|U:42"` for a per-user limit or
//! `"ping|G:1001"` for a per-guild one.
//!
//! An entry whose expiry has passed is logically absent: [`remaining`] treats
//! it as such and evicts it on the spot. [`sweep`] reclaims the entries nobody
//! asks about again; it only bounds memory and is never needed for
//! correctness.
//!
//! [`remaining`]: CooldownTracker::remaining
//! [`sweep`]: CooldownTracker::sweep

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

/// Tracks when each cooldown key becomes usable again.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    expiries: Mutex<HashMap<String, Instant>>,
}

impl CooldownTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) a cooldown of `seconds` for `key`.
    pub fn apply(&self, key: impl Into<String>, seconds: u32) {
        let expiry = Instant::now() + Duration::from_secs(u64::from(seconds));
        self.expiries.lock().insert(key.into(), expiry);
    }

    /// Returns the whole seconds left on `key`, rounded up.
    ///
    /// Returns `0` when the key is unknown or already expired; an expired entry
    /// is evicted as a side effect.
    pub fn remaining(&self, key: &str) -> u32 {
        let mut expiries = self.expiries.lock();
        let Some(&expiry) = expiries.get(key) else {
            return 0;
        };

        match expiry.checked_duration_since(Instant::now()) {
            Some(left) if !left.is_zero() => ceil_secs(left),
            _ => {
                expiries.remove(key);
                0
            }
        }
    }

    /// Starts a cooldown of `seconds` for `key` unless one is still running.
    ///
    /// Returns the whole seconds left on the running cooldown, or `None` when
    /// a new one was started. Check and start happen under one lock, so two
    /// concurrent callers cannot both get `None` for the same key.
    pub fn try_start(&self, key: impl Into<String>, seconds: u32) -> Option<u32> {
        let key = key.into();
        let now = Instant::now();
        let mut expiries = self.expiries.lock();
        if let Some(left) = expiries
            .get(&key)
            .and_then(|expiry| expiry.checked_duration_since(now))
            .filter(|left| !left.is_zero())
        {
            return Some(ceil_secs(left));
        }
        expiries.insert(key, now + Duration::from_secs(u64::from(seconds)));
        None
    }

    /// Returns the raw expiry instant for `key`, expired or not.
    pub fn expiry(&self, key: &str) -> Option<Instant> {
        self.expiries.lock().get(key).copied()
    }

    /// Removes every entry whose expiry is at or before now.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut expiries = self.expiries.lock();
        let before = expiries.len();
        expiries.retain(|_, expiry| *expiry > now);
        let removed = before - expiries.len();
        trace!(removed, remaining = expiries.len(), "Swept cooldowns");
        removed
    }

    /// Returns the number of resident entries, including expired ones not yet
    /// reclaimed.
    pub fn len(&self) -> usize {
        self.expiries.lock().len()
    }

    /// Returns `true` if no entry is resident.
    pub fn is_empty(&self) -> bool {
        self.expiries.lock().is_empty()
    }
}

fn ceil_secs(duration: Duration) -> u32 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}
