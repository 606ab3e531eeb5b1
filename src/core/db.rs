use std::collections::BTreeMap;
use std::sync::RwLock;

#[cfg(test)]
use mockall::automock;
use serde::{de::DeserializeOwned, Serialize};

use crate::core::errors::StoreError;
use crate::core::validation::{EditProfileForm, RegistrationForm};
use crate::Bord;

/// Persistence contract the services are built on.
///
/// Keys are ordered lexicographically; `scan_prefix` must return entries in
/// ascending key order. `insert_if_absent` and `increment` must be atomic with
/// respect to every other call on the same store.
#[cfg_attr(test, automock)]
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Returns whether the key existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Writes `value` only if `key` is unused. Returns whether it wrote.
    fn insert_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError>;

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Bumps the counter at `key` and returns the new value, starting at 1.
    fn increment(&self, key: &str) -> Result<u64, StoreError>;
}

/// JSON helpers layered over any [`Store`].
pub trait StoreExt: Store {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, &bytes)
    }

    fn insert_json_if_absent<T: Serialize>(&self, key: &str, value: &T) -> Result<bool, StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.insert_if_absent(key, &bytes)
    }

    fn scan_json<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, StoreError> {
        self.scan_prefix(prefix)?
            .into_iter()
            .map(|(_, bytes)| serde_json::from_slice(&bytes).map_err(StoreError::from))
            .collect()
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// In-process [`Store`] backed by an ordered map.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.remove(key).is_some())
    }

    fn insert_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_vec());
        Ok(true)
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let current = match entries.get(key) {
            Some(bytes) => std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| StoreError::Backend(format!("counter {key} is not a number")))?,
            None => 0,
        };
        let next = current + 1;
        entries.insert(key.to_string(), next.to_string().into_bytes());
        Ok(next)
    }
}

/// Demo accounts and posts. Safe to call repeatedly.
pub fn init_test_data(bord: &Bord) -> anyhow::Result<()> {
    let accounts = [
        ("test", "test@example.com", "test", "Test user bio", &["This is my first post on Bord!"][..]),
        (
            "alice",
            "alice@example.com",
            "alice",
            "Hello, I'm Alice!",
            &[
                "Welcome to my board! Excited to share thoughts here.",
                "Just finished an amazing project. Feeling productive today!",
            ][..],
        ),
        (
            "bob",
            "bob@example.com",
            "bob",
            "Bob's corner of the internet",
            &["Hey everyone! Just joined Bord, looking forward to connecting with you all."][..],
        ),
    ];

    for (username, email, password, about_me, posts) in accounts {
        if bord.users.find_by_username(username)?.is_some() {
            continue;
        }

        let user = bord.users.register(&RegistrationForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password2: password.to_string(),
        })?;
        bord.users.edit_profile(
            &user.id,
            &EditProfileForm {
                username: username.to_string(),
                about_me: about_me.to_string(),
            },
        )?;

        for body in posts {
            bord.posts.create_post(&user.id, body)?;
        }
    }

    // "test" follows "bob"
    if let (Some(test), Some(bob)) = (
        bord.users.find_by_username("test")?,
        bord.users.find_by_username("bob")?,
    ) {
        bord.graph.follow(&test.id, &bob.id)?;
    }

    tracing::info!("seed data in place");
    Ok(())
}

/// Removes every record from the store.
pub fn reset_db_data(store: &dyn Store) -> anyhow::Result<()> {
    let keys: Vec<String> = store.scan_prefix("")?.into_iter().map(|(k, _)| k).collect();
    for key in &keys {
        store.delete(key)?;
    }
    tracing::info!(removed = keys.len(), "store cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_prefix_is_ordered_and_bounded() {
        let store = MemoryStore::new();
        store.set("b:2", b"2").unwrap();
        store.set("a:1", b"x").unwrap();
        store.set("b:1", b"1").unwrap();
        store.set("c:1", b"y").unwrap();

        let keys: Vec<String> = store.scan_prefix("b:").unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b:1".to_string(), "b:2".to_string()]);
    }

    #[test]
    fn insert_if_absent_only_writes_once() {
        let store = MemoryStore::new();
        assert!(store.insert_if_absent("k", b"first").unwrap());
        assert!(!store.insert_if_absent("k", b"second").unwrap());
        assert_eq!(store.get("k").unwrap(), Some(b"first".to_vec()));
    }

    #[test]
    fn increment_counts_from_one() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("seq").unwrap(), 1);
        assert_eq!(store.increment("seq").unwrap(), 2);
        assert_eq!(store.increment("other").unwrap(), 1);
    }

    #[test]
    fn increment_rejects_garbage_counter() {
        let store = MemoryStore::new();
        store.set("seq", b"not a number").unwrap();
        assert!(matches!(store.increment("seq"), Err(StoreError::Backend(_))));
    }

    #[test]
    fn json_helpers_round_trip_through_bytes() {
        let store = MemoryStore::new();
        store.set_json("list", &vec!["a", "b"]).unwrap();
        let list: Option<Vec<String>> = store.get_json("list").unwrap();
        assert_eq!(list, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(store.get_json::<Vec<String>>("missing").unwrap().is_none());
    }

    #[test]
    fn reset_clears_everything() {
        let store = MemoryStore::new();
        store.set("a", b"1").unwrap();
        store.set("b", b"2").unwrap();
        reset_db_data(&store).unwrap();
        assert!(store.is_empty().unwrap());
    }
}
