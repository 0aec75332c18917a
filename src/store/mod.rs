//! Durable client-side key/value storage.
//!
//! Every key is read and written independently; there are no multi-key
//! transactions.

pub mod memory;
pub mod secret;
pub mod sqlite;

use anyhow::Result;

pub use memory::MemoryKvStore;
pub use secret::KeyringSecrets;
pub use sqlite::SqliteKvStore;

pub mod keys {
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const USER_ID: &str = "user_id";
    pub const CHAT_ID: &str = "chat_id";
    pub const API_BASE: &str = "api_base";
    pub const UI_LANGUAGE: &str = "ui_language";
    pub const PROFILE_LAYOUT: &str = "profile_layout";
}

pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Best-effort read: storage failures read as "absent".
pub fn load(store: &dyn KvStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("couldn't read {key} from storage: {e}");
            None
        }
    }
}

/// Best-effort write.
pub fn save(store: &dyn KvStore, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        log::warn!("couldn't write {key} to storage: {e}");
    }
}

/// Best-effort delete.
pub fn forget(store: &dyn KvStore, key: &str) {
    if let Err(e) = store.remove(key) {
        log::warn!("couldn't remove {key} from storage: {e}");
    }
}
