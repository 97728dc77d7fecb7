//! User Store
//!
//! Trivial unique-key credential table backing the REST endpoints. Seeded
//! from configuration, mutated only by registration, reset on restart.

use crate::config::UserConfig;
use crate::Result;
use anyhow::bail;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

/// A stored user record.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
}

/// In-memory user table keyed by unique username.
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl UserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table contents with the configured seed users.
    pub fn load_from_config(&self, users: &[UserConfig]) {
        let mut table = self.users.write().unwrap();
        table.clear();
        for user in users {
            table.insert(
                user.username.clone(),
                UserRecord {
                    username: user.username.clone(),
                    password: user.password.clone(),
                },
            );
        }

        info!(count = table.len(), "Loaded seed users");
    }

    /// Check a username/password pair against the table.
    pub fn validate_credentials(&self, username: &str, password: &str) -> bool {
        let table = self.users.read().unwrap();
        table
            .get(username)
            .map(|user| user.password == password)
            .unwrap_or(false)
    }

    /// Insert a new user; fails if the username is already taken.
    pub fn insert(&self, username: &str, password: &str) -> Result<()> {
        let mut table = self.users.write().unwrap();
        if table.contains_key(username) {
            bail!("username '{}' is already taken", username);
        }

        table.insert(
            username.to_string(),
            UserRecord {
                username: username.to_string(),
                password: password.to_string(),
            },
        );

        Ok(())
    }

    /// List all usernames, sorted for stable output. Passwords never leave
    /// the store.
    pub fn list_usernames(&self) -> Vec<String> {
        let table = self.users.read().unwrap();
        let mut names: Vec<String> = table.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_validate() {
        let store = UserStore::new();
        store.insert("alice", "secret").unwrap();

        assert!(store.validate_credentials("alice", "secret"));
        assert!(!store.validate_credentials("alice", "wrong"));
        assert!(!store.validate_credentials("bob", "secret"));
    }

    #[test]
    fn test_duplicate_username_is_rejected() {
        let store = UserStore::new();
        store.insert("alice", "secret").unwrap();

        assert!(store.insert("alice", "other").is_err());
        // The original record is untouched.
        assert!(store.validate_credentials("alice", "secret"));
    }

    #[test]
    fn test_load_from_config_replaces_contents() {
        let store = UserStore::new();
        store.insert("stale", "pw").unwrap();

        store.load_from_config(&[
            UserConfig {
                username: "alice".to_string(),
                password: "secret".to_string(),
            },
            UserConfig {
                username: "bob".to_string(),
                password: "hunter2".to_string(),
            },
        ]);

        assert_eq!(store.list_usernames(), vec!["alice", "bob"]);
        assert!(!store.validate_credentials("stale", "pw"));
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let store = UserStore::new();
        assert!(store.is_empty());
        assert!(store.list_usernames().is_empty());
    }
}
