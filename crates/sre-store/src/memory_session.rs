use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::session::SessionStore;

#[derive(Default)]
struct Inner {
    values: HashMap<String, String>,
    logs: HashMap<String, Vec<String>>,
    locks: HashMap<String, bool>,
}

/// In-memory [`SessionStore`], used by the test suite and by single-process
/// deployments with no Redis available. TTLs are accepted but not enforced —
/// this store never expires keys, which is a conservative (over-retaining)
/// approximation acceptable for tests.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn set(&self, key: &str, value: &str, _ttl_secs: Option<u64>) -> bool {
        self.inner
            .write()
            .await
            .values
            .insert(key.to_string(), value.to_string());
        true
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.inner.read().await.values.get(key).cloned()
    }

    async fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.write().await;
        inner.values.remove(key);
        inner.logs.remove(key);
        true
    }

    async fn append_log(&self, id: &str, line: &str, _ttl_secs: u64) -> bool {
        self.inner
            .write()
            .await
            .logs
            .entry(id.to_string())
            .or_default()
            .push(line.to_string());
        true
    }

    async fn get_logs(&self, id: &str) -> Vec<String> {
        self.inner
            .read()
            .await
            .logs
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    async fn set_cluster_lock(&self, cluster_id: &str, locked: bool) -> bool {
        self.inner
            .write()
            .await
            .locks
            .insert(cluster_id.to_string(), locked);
        true
    }

    async fn is_cluster_locked(&self, cluster_id: &str) -> bool {
        self.inner
            .read()
            .await
            .locks
            .get(cluster_id)
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete_roundtrip() {
        let store = InMemorySessionStore::new();
        assert!(store.set("session:1", "{}", Some(3600)).await);
        assert_eq!(store.get("session:1").await, Some("{}".to_string()));
        assert!(store.delete("session:1").await);
        assert_eq!(store.get("session:1").await, None);
    }

    #[tokio::test]
    async fn logs_append_in_order_and_never_truncate() {
        let store = InMemorySessionStore::new();
        store.append_log("inc-1", "Investigation started", 3600).await;
        store.append_log("inc-1", "Step completed: planner", 3600).await;
        assert_eq!(
            store.get_logs("inc-1").await,
            vec!["Investigation started", "Step completed: planner"]
        );
    }

    #[tokio::test]
    async fn cluster_lock_is_existence_only() {
        let store = InMemorySessionStore::new();
        assert!(!store.is_cluster_locked("c-1").await);
        store.set_cluster_lock("c-1", true).await;
        assert!(store.is_cluster_locked("c-1").await);
        store.set_cluster_lock("c-1", false).await;
        assert!(!store.is_cluster_locked("c-1").await);
    }
}
