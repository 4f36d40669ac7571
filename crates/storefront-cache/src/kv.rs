//! Key-Value store wrapper with automatic serialization.

use crate::CacheError;
use serde::{de::DeserializeOwned, Serialize};

#[cfg(not(target_arch = "wasm32"))]
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::sync::{Arc, Mutex, OnceLock};

#[cfg(not(target_arch = "wasm32"))]
type MemoryStore = Arc<Mutex<HashMap<String, Vec<u8>>>>;

/// Type-safe cache backed by Spin's Key-Value Store.
///
/// Values are stored as JSON. Outside of `wasm32` every named store lives in
/// process memory and is shared by all handles opened with the same name.
pub struct Cache {
    #[cfg(target_arch = "wasm32")]
    store: spin_sdk::key_value::Store,
    #[cfg(not(target_arch = "wasm32"))]
    store: MemoryStore,
}

impl Cache {
    /// Open the default Key-Value store.
    #[cfg(target_arch = "wasm32")]
    pub fn open_default() -> Result<Self, CacheError> {
        let store = spin_sdk::key_value::Store::open_default()
            .map_err(|e| CacheError::OpenError(e.to_string()))?;
        Ok(Self { store })
    }

    /// Open a named Key-Value store.
    #[cfg(target_arch = "wasm32")]
    pub fn open(name: &str) -> Result<Self, CacheError> {
        let store = spin_sdk::key_value::Store::open(name)
            .map_err(|e| CacheError::OpenError(e.to_string()))?;
        Ok(Self { store })
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    #[cfg(target_arch = "wasm32")]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key) {
            Ok(Some(bytes)) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(CacheError::StoreError(e.to_string())),
        }
    }

    /// Set a value in the cache.
    #[cfg(target_arch = "wasm32")]
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.store
            .set(key, &bytes)
            .map_err(|e| CacheError::StoreError(e.to_string()))
    }

    /// Delete a value from the cache.
    #[cfg(target_arch = "wasm32")]
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store
            .delete(key)
            .map_err(|e| CacheError::StoreError(e.to_string()))
    }

    /// Check if a key exists in the cache.
    #[cfg(target_arch = "wasm32")]
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.store
            .exists(key)
            .map_err(|e| CacheError::StoreError(e.to_string()))
    }

    /// Get all keys in the cache.
    #[cfg(target_arch = "wasm32")]
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.store
            .get_keys()
            .map_err(|e| CacheError::StoreError(e.to_string()))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn open_default() -> Result<Self, CacheError> {
        Self::open("default")
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn open(name: &str) -> Result<Self, CacheError> {
        static STORES: OnceLock<Mutex<HashMap<String, MemoryStore>>> = OnceLock::new();

        let mut stores = STORES
            .get_or_init(|| Mutex::new(HashMap::new()))
            .lock()
            .map_err(|e| CacheError::OpenError(e.to_string()))?;
        let store = stores.entry(name.to_string()).or_default().clone();
        Ok(Self { store })
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let bytes = self.with_store(|map| map.get(key).cloned())?;
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.with_store(|map| {
            map.insert(key.to_string(), bytes);
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.with_store(|map| {
            map.remove(key);
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.with_store(|map| map.contains_key(key))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.with_store(|map| {
            let mut keys: Vec<String> = map.keys().cloned().collect();
            keys.sort();
            keys
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn with_store<R>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Vec<u8>>) -> R,
    ) -> Result<R, CacheError> {
        let mut map = self
            .store
            .lock()
            .map_err(|e| CacheError::StoreError(e.to_string()))?;
        Ok(f(&mut map))
    }
}

/// Helper to build cache keys with namespacing.
///
/// ```rust,ignore
/// let key = cache_key!("cart", store_id);
/// // "cart:store-123"
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}
