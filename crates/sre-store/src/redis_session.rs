use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::warn;

use crate::session::SessionStore;

const APPROVAL_PREFIX: &str = "sre_agent:approval:";
const LOGS_PREFIX: &str = "sre_agent:logs:";
const LOCK_PREFIX: &str = "sre_agent:cluster_lock:";

/// Redis-backed [`SessionStore`], the canonical cross-process implementation.
///
/// Every method swallows connection/command errors and returns the
/// documented soft-failure value (`false`, `None`, or an empty `Vec`) — §4.1
/// makes this a hard invariant: the engine and workers must keep functioning
/// with only cross-request visibility lost.
pub struct RedisSessionStore {
    manager: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let manager = client.get_connection_manager().await?;
        Ok(Self { manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> bool {
        let full_key = format!("{APPROVAL_PREFIX}{key}");
        let mut conn = self.conn();
        let result: redis::RedisResult<()> = match ttl_secs {
            Some(ttl) => conn.set_ex(&full_key, value, ttl).await,
            None => conn.set(&full_key, value).await,
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %full_key, error = %err, "session store SET failed");
                false
            }
        }
    }

    async fn get(&self, key: &str) -> Option<String> {
        let full_key = format!("{APPROVAL_PREFIX}{key}");
        match self.conn().get::<_, Option<String>>(&full_key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %full_key, error = %err, "session store GET failed");
                None
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        let full_key = format!("{APPROVAL_PREFIX}{key}");
        match self.conn().del::<_, i64>(&full_key).await {
            Ok(_) => true,
            Err(err) => {
                warn!(key = %full_key, error = %err, "session store DELETE failed");
                false
            }
        }
    }

    async fn append_log(&self, id: &str, line: &str, ttl_secs: u64) -> bool {
        let full_key = format!("{LOGS_PREFIX}{id}");
        let mut conn = self.conn();
        let new_len: redis::RedisResult<i64> = conn.rpush(&full_key, line).await;
        match new_len {
            Ok(len) => {
                // TTL is set only on the append that creates the list (len == 1),
                // never extended afterwards.
                if len == 1 {
                    if let Err(err) = conn.expire::<_, ()>(&full_key, ttl_secs as i64).await {
                        warn!(key = %full_key, error = %err, "session store EXPIRE failed");
                    }
                }
                true
            }
            Err(err) => {
                warn!(key = %full_key, error = %err, "session store RPUSH failed");
                false
            }
        }
    }

    async fn get_logs(&self, id: &str) -> Vec<String> {
        let full_key = format!("{LOGS_PREFIX}{id}");
        match self.conn().lrange::<_, Vec<String>>(&full_key, 0, -1).await {
            Ok(lines) => lines,
            Err(err) => {
                warn!(key = %full_key, error = %err, "session store LRANGE failed");
                Vec::new()
            }
        }
    }

    async fn set_cluster_lock(&self, cluster_id: &str, locked: bool) -> bool {
        let full_key = format!("{LOCK_PREFIX}{cluster_id}");
        let mut conn = self.conn();
        let result: redis::RedisResult<()> = if locked {
            conn.set(&full_key, "1").await
        } else {
            conn.del(&full_key).await
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %full_key, error = %err, "session store lock toggle failed");
                false
            }
        }
    }

    async fn is_cluster_locked(&self, cluster_id: &str) -> bool {
        let full_key = format!("{LOCK_PREFIX}{cluster_id}");
        match self.conn().exists::<_, bool>(&full_key).await {
            Ok(exists) => exists,
            Err(err) => {
                warn!(key = %full_key, error = %err, "session store lock check failed");
                false
            }
        }
    }
}
