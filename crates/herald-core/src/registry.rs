//! Ordered, alias-indexed command registry.
//!
//! A [`CommandRegistry`] keeps two structures in lockstep:
//!
//! - an ordered sequence of commands (the order integrators see when listing
//!   commands, e.g. for help output)
//! - an index from every lowercased name and alias to the command's position
//!   in that sequence
//!
//! Both live behind a single [`RwLock`], and every mutation patches both of
//! them inside one write-lock acquisition. A concurrent [`lookup`] therefore
//! observes either the state before or the state after an insert or remove,
//! never a half-shifted index.
//!
//! The same type backs the text-command registry and the structured-command
//! registry. Structured commands simply report no aliases through
//! [`Indexed::aliases`].
//!
//! [`lookup`]: CommandRegistry::lookup
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_core::{CommandRegistry, Indexed};
//!
//! let registry = CommandRegistry::new();
//! registry.append(ping)?;
//! registry.insert(help, 0)?;
//!
//! assert_eq!(registry.lookup("PING").unwrap().name(), "ping");
//! registry.remove("help")?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// Anything that can be stored in a [`CommandRegistry`].
pub trait Indexed: Send + Sync {
    /// The canonical name of the entry.
    fn name(&self) -> &str;

    /// Additional names under which the entry can be looked up.
    fn aliases(&self) -> &[String] {
        &[]
    }
}

struct RegistryInner<T> {
    entries: Vec<Arc<T>>,
    /// Lowercased name or alias → position in `entries`.
    index: HashMap<String, usize>,
}

/// An ordered collection of commands indexed by case-insensitive name and alias.
///
/// Positions are always contiguous `[0, len)`, every index key resolves to
/// the entry that owns it, and no two live entries share a key.
pub struct CommandRegistry<T> {
    inner: RwLock<RegistryInner<T>>,
}

impl<T: Indexed> CommandRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                entries: Vec::new(),
                index: HashMap::new(),
            }),
        }
    }

    /// Appends a command at the end of the registry.
    pub fn append(&self, command: T) -> RegistryResult<()> {
        let mut inner = self.inner.write();
        let len = inner.entries.len();
        Self::insert_locked(&mut inner, command, len)
    }

    /// Inserts a command at `index`, shifting every later command up by one.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidIndex`] if `index > len`.
    /// - [`RegistryError::DuplicateKey`] if the command's name or any alias is
    ///   already indexed.
    ///
    /// The registry is left untouched on error.
    pub fn insert(&self, command: T, index: usize) -> RegistryResult<()> {
        let mut inner = self.inner.write();
        Self::insert_locked(&mut inner, command, index)
    }

    fn insert_locked(
        inner: &mut RegistryInner<T>,
        command: T,
        index: usize,
    ) -> RegistryResult<()> {
        let len = inner.entries.len();
        if index > len {
            return Err(RegistryError::InvalidIndex { index, len });
        }

        let keys = index_keys(&command);
        if let Some(taken) = keys.iter().find(|key| inner.index.contains_key(*key)) {
            return Err(RegistryError::DuplicateKey(taken.clone()));
        }

        if index < len {
            for position in inner.index.values_mut() {
                if *position >= index {
                    *position += 1;
                }
            }
        }

        debug!(command = %command.name(), index, keys = keys.len(), "Indexed command");
        for key in keys {
            inner.index.insert(key, index);
        }
        inner.entries.insert(index, Arc::new(command));
        Ok(())
    }

    /// Removes the command owning `name_or_alias`, along with all of its keys.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no command owns the key.
    pub fn remove(&self, name_or_alias: &str) -> RegistryResult<Arc<T>> {
        let key = name_or_alias.to_lowercase();
        let mut inner = self.inner.write();

        let Some(&target) = inner.index.get(&key) else {
            return Err(RegistryError::NotFound(name_or_alias.to_string()));
        };

        let removed = inner.entries.remove(target);
        inner.index.retain(|_, position| {
            if *position == target {
                return false;
            }
            if *position > target {
                *position -= 1;
            }
            true
        });

        debug!(command = %removed.name(), index = target, "Removed command");
        Ok(removed)
    }

    /// Looks up a command by case-insensitive name or alias.
    pub fn lookup(&self, name_or_alias: &str) -> Option<Arc<T>> {
        let key = name_or_alias.to_lowercase();
        let inner = self.inner.read();
        inner
            .index
            .get(&key)
            .map(|&position| Arc::clone(&inner.entries[position]))
    }

    /// Returns `true` if some command owns `name_or_alias`.
    pub fn contains(&self, name_or_alias: &str) -> bool {
        self.inner
            .read()
            .index
            .contains_key(&name_or_alias.to_lowercase())
    }

    /// Returns a snapshot of the commands in registry order.
    pub fn list(&self) -> Vec<Arc<T>> {
        self.inner.read().entries.clone()
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Returns `true` if no command is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}

impl<T: Indexed> Default for CommandRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Indexed> fmt::Debug for CommandRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("CommandRegistry")
            .field(
                "commands",
                &inner.entries.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("keys", &inner.index.len())
            .finish()
    }
}

/// Lowercased name followed by lowercased aliases, without repeats.
fn index_keys<T: Indexed>(command: &T) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(1 + command.aliases().len());
    for key in std::iter::once(command.name()).chain(command.aliases().iter().map(String::as_str))
    {
        let key = key.to_lowercase();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Entry {
        name: String,
        aliases: Vec<String>,
    }

    impl Entry {
        fn new(name: &str, aliases: &[&str]) -> Self {
            Self {
                name: name.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
            }
        }
    }

    impl Indexed for Entry {
        fn name(&self) -> &str {
            &self.name
        }

        fn aliases(&self) -> &[String] {
            &self.aliases
        }
    }

    fn names(registry: &CommandRegistry<Entry>) -> Vec<String> {
        registry.list().iter().map(|e| e.name.clone()).collect()
    }

    /// Every index key must point at the entry that owns it.
    fn assert_consistent(registry: &CommandRegistry<Entry>) {
        let inner = registry.inner.read();
        for (key, &position) in &inner.index {
            let entry = &inner.entries[position];
            assert!(
                entry.name.to_lowercase() == *key
                    || entry.aliases.iter().any(|a| a.to_lowercase() == *key),
                "key {key} points at {}",
                entry.name
            );
        }
        let expected: usize = inner.entries.iter().map(|e| index_keys(e.as_ref()).len()).sum();
        assert_eq!(inner.index.len(), expected);
    }

    fn seeded() -> CommandRegistry<Entry> {
        let registry = CommandRegistry::new();
        registry.append(Entry::new("alpha", &["a"])).unwrap();
        registry.append(Entry::new("beta", &["b", "bb"])).unwrap();
        registry.append(Entry::new("gamma", &["g"])).unwrap();
        registry
    }

    #[test]
    fn test_insert_at_every_position_shifts_later_entries() {
        for position in 0..=3 {
            let registry = seeded();
            let before = names(&registry);
            registry.insert(Entry::new("new", &["n"]), position).unwrap();

            let after = names(&registry);
            assert_eq!(after[position], "new");
            assert_eq!(&after[..position], &before[..position]);
            assert_eq!(&after[position + 1..], &before[position..]);

            for (i, name) in before.iter().enumerate() {
                let expected = if i >= position { i + 1 } else { i };
                assert_eq!(registry.inner.read().index[name.as_str()], expected);
            }
            assert_eq!(registry.lookup("N").unwrap().name, "new");
            assert_consistent(&registry);
        }
    }

    #[test]
    fn test_insert_invalid_index() {
        let registry = seeded();
        let err = registry.insert(Entry::new("late", &[]), 4).unwrap_err();
        assert_eq!(err, RegistryError::InvalidIndex { index: 4, len: 3 });
        assert_eq!(registry.len(), 3);
        assert!(registry.lookup("late").is_none());
    }

    #[test]
    fn test_duplicate_name_or_alias_leaves_registry_unchanged() {
        let registry = seeded();
        let snapshot = |r: &CommandRegistry<Entry>| {
            let inner = r.inner.read();
            let mut index: Vec<(String, usize)> =
                inner.index.iter().map(|(k, v)| (k.clone(), *v)).collect();
            index.sort();
            (names(r), index)
        };
        let before = snapshot(&registry);

        let err = registry.insert(Entry::new("BETA", &[]), 0).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateKey("beta".to_string()));

        let err = registry.append(Entry::new("delta", &["d", "G"])).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateKey("g".to_string()));

        // An alias colliding with another command's canonical name counts too.
        let err = registry.insert(Entry::new("epsilon", &["Alpha"]), 1).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateKey("alpha".to_string()));

        assert_eq!(snapshot(&registry), before);
    }

    #[test]
    fn test_self_repeated_alias_is_indexed_once() {
        let registry = CommandRegistry::new();
        registry.append(Entry::new("ping", &["PING", "p"])).unwrap();
        assert_eq!(registry.inner.read().index.len(), 2);
        registry.remove("p").unwrap();
        assert!(registry.is_empty());
        assert!(registry.inner.read().index.is_empty());
    }

    #[test]
    fn test_remove_drops_all_keys_and_keeps_later_aliases() {
        let registry = seeded();
        let removed = registry.remove("BB").unwrap();
        assert_eq!(removed.name, "beta");

        for key in ["beta", "b", "bb"] {
            assert!(registry.lookup(key).is_none(), "{key} still resolves");
        }
        assert_eq!(registry.lookup("g").unwrap().name, "gamma");
        assert_eq!(registry.lookup("gamma").unwrap().name, "gamma");
        assert_eq!(registry.lookup("a").unwrap().name, "alpha");
        assert_eq!(names(&registry), vec!["alpha", "gamma"]);
        assert_consistent(&registry);
    }

    #[test]
    fn test_remove_not_found() {
        let registry = seeded();
        let err = registry.remove("delta").unwrap_err();
        assert_eq!(err, RegistryError::NotFound("delta".to_string()));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_removed_key_can_be_reused() {
        let registry = seeded();
        registry.remove("alpha").unwrap();
        registry.insert(Entry::new("a", &["alpha"]), 0).unwrap();
        assert_eq!(registry.lookup("ALPHA").unwrap().name, "a");
        assert_consistent(&registry);
    }

    #[test]
    fn test_concurrent_lookups_during_mutation() {
        let registry = Arc::new(seeded());
        let writer = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for i in 0..200 {
                    let name = format!("cmd{i}");
                    registry.insert(Entry::new(&name, &[]), i % 2).unwrap();
                    registry.remove(&name).unwrap();
                }
            })
        };
        let reader = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..2000 {
                    assert_eq!(registry.lookup("g").unwrap().name, "gamma");
                    assert_eq!(registry.lookup("b").unwrap().name, "beta");
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(names(&registry), vec!["alpha", "beta", "gamma"]);
        assert_consistent(&registry);
    }
}
