// User storage abstraction
// The registry only talks to `UserStore`; `MemoryStore` is the in-process backend

use anyhow::Result;
use dashmap::DashMap;

use crate::models::user::User;

/// Keyed storage for user records
pub trait UserStore: Send + Sync {
    /// Get a user by identity key
    fn get(&self, id: &str) -> Result<Option<User>>;

    /// Insert or replace a user record
    fn put(&self, user: &User) -> Result<()>;

    /// Get a user, inserting `default` first if absent.
    /// Returns the stored record and whether it was newly created.
    fn upsert(&self, id: &str, default: User) -> Result<(User, bool)>;
}

/// In-memory store backed by a concurrent map
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.get(id).map(|entry| entry.value().clone()))
    }

    fn put(&self, user: &User) -> Result<()> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn upsert(&self, id: &str, default: User) -> Result<(User, bool)> {
        let mut created = false;
        let entry = self.users.entry(id.to_string()).or_insert_with(|| {
            created = true;
            default
        });
        Ok((entry.value().clone(), created))
    }
}
