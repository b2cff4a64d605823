use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::compliance::store::AuthCache;

/// Cache key for a role's computed authorization state
pub fn role_key(role_id: i64) -> String {
    format!("role:{}", role_id)
}

/// In-process authorization cache
#[derive(Debug, Default)]
pub struct LocalAuthCache {
    entries: RwLock<HashMap<String, Value>>,
    flushes: AtomicU64,
}

impl LocalAuthCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: impl Into<String>, value: Value) {
        self.entries.write().await.insert(key.into(), value);
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Number of global flushes since startup
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AuthCache for LocalAuthCache {
    async fn forget(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    async fn flush(&self) {
        self.entries.write().await.clear();
        self.flushes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Authorization cache flushed");
    }
}
