//! Per-command invocation counters.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Counts how many times each command has been dispatched.
///
/// Counts only ever grow and live for the lifetime of the process.
#[derive(Debug, Default)]
pub struct UsageCounter {
    uses: Mutex<HashMap<String, u64>>,
}

impl UsageCounter {
    /// Creates an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one invocation of `name` and returns the new count.
    pub fn increment(&self, name: &str) -> u64 {
        let mut uses = self.uses.lock();
        let count = uses.entry(name.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Returns the number of recorded invocations of `name`.
    pub fn get(&self, name: &str) -> u64 {
        self.uses.lock().get(name).copied().unwrap_or(0)
    }

    /// Returns a copy of every counter.
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.uses.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_increment_from_zero() {
        let counter = UsageCounter::new();
        assert_eq!(counter.get("ping"), 0);
        assert_eq!(counter.increment("ping"), 1);
        assert_eq!(counter.increment("ping"), 2);
        assert_eq!(counter.get("ping"), 2);
        assert_eq!(counter.get("pong"), 0);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let counter = Arc::new(UsageCounter::new());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        counter.increment("ping");
                        counter.increment("echo");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(counter.get("ping"), 2000);
        assert_eq!(counter.snapshot().get("echo"), Some(&2000));
    }
}
