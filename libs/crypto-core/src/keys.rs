//! Purpose-scoped master key store
//!
//! Explicit, constructor-injected replacement for a static key-manager map:
//! components that encrypt fields receive a `&MasterKeyStore` and resolve the
//! secret for a purpose (`pii`, `financial`, `payment`, `documents`, ...).
//! Read-mostly: registration happens at startup, lookups happen per request.

use std::collections::HashMap;
use std::sync::RwLock;

use secrecy::SecretString;
use tracing::info;

/// Env prefix for master keys, e.g. `MERIDIAN_MASTER_KEY_PII`
pub const MASTER_KEY_ENV_PREFIX: &str = "MERIDIAN_MASTER_KEY_";

pub struct MasterKeyStore {
    keys: RwLock<HashMap<String, SecretString>>,
}

impl MasterKeyStore {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Build a store from (purpose, secret) pairs
    pub fn with_keys(entries: impl IntoIterator<Item = (String, SecretString)>) -> Self {
        Self {
            keys: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Load every `MERIDIAN_MASTER_KEY_<PURPOSE>` environment variable;
    /// purposes are stored lowercased
    pub fn from_env() -> Self {
        let keys: HashMap<String, SecretString> = std::env::vars()
            .filter_map(|(name, value)| {
                name.strip_prefix(MASTER_KEY_ENV_PREFIX)
                    .map(|purpose| (purpose.to_lowercase(), SecretString::from(value)))
            })
            .collect();
        info!(purposes = keys.len(), "loaded master keys from environment");
        Self {
            keys: RwLock::new(keys),
        }
    }

    /// Register or replace the secret for a purpose
    pub fn register(&self, purpose: &str, secret: SecretString) {
        let mut keys = match self.keys.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        keys.insert(purpose.to_string(), secret);
        // Log the purpose only; the secret never reaches the log stream
        info!(purpose, "master key registered");
    }

    /// Resolve the secret for a purpose
    pub fn resolve(&self, purpose: &str) -> Option<SecretString> {
        let keys = match self.keys.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        keys.get(purpose).cloned()
    }

    pub fn contains(&self, purpose: &str) -> bool {
        let keys = match self.keys.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        keys.contains_key(purpose)
    }

    pub fn purposes(&self) -> Vec<String> {
        let keys = match self.keys.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        keys.keys().cloned().collect()
    }
}

impl Default for MasterKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_register_and_resolve() {
        let store = MasterKeyStore::new();
        store.register("pii", SecretString::from("pii-master-secret".to_string()));

        let resolved = store.resolve("pii").unwrap();
        assert_eq!(resolved.expose_secret(), "pii-master-secret");
        assert!(store.resolve("financial").is_none());
    }

    #[test]
    fn test_with_keys_constructor() {
        let store = MasterKeyStore::with_keys(vec![
            ("payment".to_string(), SecretString::from("a".to_string())),
            ("documents".to_string(), SecretString::from("b".to_string())),
        ]);
        assert!(store.contains("payment"));
        assert!(store.contains("documents"));
        assert_eq!(store.purposes().len(), 2);
    }

    #[test]
    fn test_reads_survive_poisoned_lock() {
        let store = MasterKeyStore::new();
        store.register("pii", SecretString::from("k1".to_string()));

        // Poison the lock from a panicking writer
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = store.keys.write().unwrap();
                    panic!("writer died mid-update");
                })
                .join();
        });

        // Readers and later writers keep working on the recovered map
        assert_eq!(store.resolve("pii").unwrap().expose_secret(), "k1");
        store.register("financial", SecretString::from("k2".to_string()));
        assert!(store.contains("financial"));
    }

    #[test]
    fn test_register_replaces() {
        let store = MasterKeyStore::new();
        store.register("pii", SecretString::from("old".to_string()));
        store.register("pii", SecretString::from("new".to_string()));
        assert_eq!(store.resolve("pii").unwrap().expose_secret(), "new");
    }
}
