//! In-process key-value backend.

use super::{check_quota, KeyValueStore, KvError, KvResult};
use std::collections::HashMap;

/// `HashMap` backend with an optional quota and an availability switch.
#[derive(Debug, Clone)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
    available: bool,
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            quota_bytes: None,
            available: true,
        }
    }

    /// Rejects any single value longer than `quota_bytes`.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn set_quota(&mut self, quota_bytes: Option<usize>) {
        self.quota_bytes = quota_bytes;
    }

    /// While unavailable, every call fails with `KvError::Unavailable`.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    fn ensure_available(&self) -> KvResult<()> {
        if self.available {
            Ok(())
        } else {
            Err(KvError::Unavailable("memory store is offline".to_string()))
        }
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.ensure_available()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        self.ensure_available()?;
        check_quota(key, value, self.quota_bytes)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.ensure_available()?;
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryKeyValueStore;
    use crate::kv::{KeyValueStore, KvError};

    #[test]
    fn quota_rejects_oversized_values_and_keeps_previous() {
        let mut kv = MemoryKeyValueStore::new().with_quota(8);
        kv.set("notes", "[]").unwrap();

        let err = kv.set("notes", "0123456789").unwrap_err();
        assert!(matches!(err, KvError::QuotaExceeded { bytes: 10, quota: 8, .. }));
        assert_eq!(kv.get("notes").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn offline_store_fails_every_call() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set_available(false);
        assert!(matches!(kv.get("notes"), Err(KvError::Unavailable(_))));
        assert!(kv.set("notes", "[]").is_err());
        assert!(kv.remove("notes").is_err());
    }
}
