/// Operation result cache
///
/// Process-wide key/value store shared by every operation pipeline:
/// - Per-entry TTL in minutes, checked lazily on read
/// - Type-tagged JSON payloads for typed retrieval
/// - Glob/prefix pattern removal for write invalidation
/// - Key enumeration for diagnostics

pub mod key;
pub mod memory;
pub mod pattern;

pub use key::{derive_cache_key, ArgumentSignature};
pub use memory::MemoryCacheStore;
pub use pattern::KeyPattern;

use crate::error::AppResult;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// A cached payload and the type it was stored as
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    pub value: serde_json::Value,
    /// Rust type name recorded by `add_typed`; `None` for untyped inserts
    pub type_tag: Option<String>,
}

impl CachedValue {
    pub fn untyped(value: serde_json::Value) -> Self {
        Self {
            value,
            type_tag: None,
        }
    }

    pub fn typed<T: Serialize>(value: &T) -> AppResult<Self> {
        Ok(Self {
            value: serde_json::to_value(value)?,
            type_tag: Some(std::any::type_name::<T>().to_string()),
        })
    }
}

/// Cache store contract
///
/// Implementations must be safe under concurrent use from many operation
/// invocations. Overwriting a key replaces value, type and expiry together.
pub trait CacheStore: Send + Sync {
    /// Look up a live entry. Expired entries behave as misses.
    fn get(&self, key: &str) -> Option<CachedValue>;

    /// Insert or overwrite an entry. `duration_minutes` of `None` means no
    /// expiry unless the store enforces a ceiling.
    fn add(&self, key: &str, value: CachedValue, duration_minutes: Option<u64>);

    fn exists(&self, key: &str) -> bool;

    /// Remove a key. Removing an absent key is a no-op.
    fn remove(&self, key: &str);

    /// Remove `key` only while it still holds `expected`. Returns whether it
    /// was removed; a concurrent overwrite is left in place.
    fn remove_if_unchanged(&self, key: &str, expected: &CachedValue) -> bool;

    /// Remove every key matching `pattern`, returning how many were removed
    fn remove_by_pattern(&self, pattern: &str) -> usize;

    /// All live keys, sorted. Diagnostic use only.
    fn keys(&self) -> Vec<String>;

    /// Number of live entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);
}

/// Typed helpers over any cache store
pub trait CacheStoreExt: CacheStore {
    /// Typed lookup. Returns `None` on miss, on type mismatch, or when the
    /// payload no longer deserializes (the entry is then dropped).
    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cached = self.get(key)?;

        if let Some(tag) = &cached.type_tag {
            if tag != std::any::type_name::<T>() {
                return None;
            }
        }

        match <T as serde::Deserialize>::deserialize(&cached.value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to deserialize cached value for {}: {}", key, e);
                // Delete corrupted cache entry unless it was replaced meanwhile
                self.remove_if_unchanged(key, &cached);
                None
            }
        }
    }

    /// Serialize and store a value tagged with its type
    fn add_typed<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        duration_minutes: Option<u64>,
    ) -> AppResult<()> {
        let cached = CachedValue::typed(value)?;
        self.add(key, cached, duration_minutes);
        Ok(())
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}
