//! Memoization of the expensive pipeline steps.
//!
//! A [`Memo`] pairs a key function with a [`CacheStore`]. Values are stored as
//! JSON so the same memo works over the in-memory store used in tests and the
//! SQLite store used by the application.

pub mod sqlite;

pub use sqlite::SqliteStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::error::{QuizError, QuizResult};

/// Backing store for memoized values, partitioned by namespace
pub trait CacheStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> QuizResult<Option<String>>;
    fn put(&self, namespace: &str, key: &str, value: &str) -> QuizResult<()>;
    /// Remove every entry, returning how many were dropped
    fn clear(&self) -> QuizResult<usize>;
    fn len(&self) -> QuizResult<usize>;
}

/// Process-lifetime store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> QuizResult<std::sync::MutexGuard<'_, HashMap<(String, String), String>>> {
        self.entries
            .lock()
            .map_err(|_| QuizError::Cache("memory store lock poisoned".to_string()))
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, namespace: &str, key: &str) -> QuizResult<Option<String>> {
        Ok(self
            .lock()?
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> QuizResult<()> {
        self.lock()?
            .insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn clear(&self) -> QuizResult<usize> {
        let mut entries = self.lock()?;
        let count = entries.len();
        entries.clear();
        Ok(count)
    }

    fn len(&self) -> QuizResult<usize> {
        Ok(self.lock()?.len())
    }
}

type KeyFn<A> = Box<dyn Fn(&A) -> String + Send + Sync>;

/// A memoized computation keyed by a function of its argument
pub struct Memo<A: ?Sized> {
    namespace: &'static str,
    key_fn: KeyFn<A>,
    store: Arc<dyn CacheStore>,
}

impl<A: ?Sized> Memo<A> {
    pub fn new(
        namespace: &'static str,
        store: Arc<dyn CacheStore>,
        key_fn: impl Fn(&A) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            namespace,
            key_fn: Box::new(key_fn),
            store,
        }
    }

    pub fn key(&self, arg: &A) -> String {
        (self.key_fn)(arg)
    }

    /// Return the cached value for `arg`, or run `compute` and cache its result.
    ///
    /// Errors from `compute` are returned as-is and nothing is cached. An
    /// entry that no longer deserializes is treated as a miss.
    pub async fn get_or_try_insert_with<V, F, Fut>(&self, arg: &A, compute: F) -> QuizResult<V>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = QuizResult<V>>,
    {
        let key = self.key(arg);

        if let Some(raw) = self.store.get(self.namespace, &key)? {
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(namespace = self.namespace, %key, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(namespace = self.namespace, %key, error = %e, "discarding unreadable cache entry");
                }
            }
        }

        debug!(namespace = self.namespace, %key, "cache miss");
        let value = compute().await?;
        let raw = serde_json::to_string(&value)?;
        self.store.put(self.namespace, &key, &raw)?;
        Ok(value)
    }
}

/// Stable hex digest over a sequence of byte strings.
///
/// Each part is length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
pub fn digest<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().to_hex().to_string()
}
