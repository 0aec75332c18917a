use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

use crate::store::{KvStore, keys};

const SERVICE: &str = "inbox_dashboard";

/// Keys kept in the OS keyring instead of the plain store.
const SECRET_KEYS: &[&str] = &[keys::AUTH_TOKEN];

/// Routes secret keys (the auth token) to the OS keyring and everything
/// else to `inner`.
pub struct KeyringSecrets<S> {
    inner: S,
}

impl<S: KvStore> KeyringSecrets<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    fn is_secret(key: &str) -> bool {
        SECRET_KEYS.contains(&key)
    }
}

impl<S: KvStore> KvStore for KeyringSecrets<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if !Self::is_secret(key) {
            return self.inner.get(key);
        }
        let entry = Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(v) => Ok(Some(v)),
            Err(KeyringError::NoEntry) => Ok(None),
            Err(e) => Err(anyhow!(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if !Self::is_secret(key) {
            return self.inner.set(key, value);
        }
        Entry::new(SERVICE, key)?
            .set_password(value)
            .map_err(|e| anyhow!(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !Self::is_secret(key) {
            return self.inner.remove(key);
        }
        match Entry::new(SERVICE, key)?.delete_credential() {
            Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
            Err(e) => Err(anyhow!(e.to_string())),
        }
    }
}
