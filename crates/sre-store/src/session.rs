use async_trait::async_trait;

/// The session/log/lock key-value store backing live investigations (C4, §4.1).
///
/// Every operation is documented as soft-failing when the backing store is
/// unreachable: this is a design invariant, not an oversight — the state
/// store is an availability aid, never a correctness dependency. Callers
/// must keep working when any of these return a failure/`None`/`false`.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Overwrites `key` with `value`, optionally expiring after `ttl_secs`.
    /// Returns `false` on any backend failure; never panics.
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> bool;

    /// Absent is indistinguishable from expired.
    async fn get(&self, key: &str) -> Option<String>;

    /// Idempotent.
    async fn delete(&self, key: &str) -> bool;

    /// Atomic append to the `logs:{id}` list. The first append also sets the
    /// list's TTL (`ttl_secs`); later appends never touch it again.
    async fn append_log(&self, id: &str, line: &str, ttl_secs: u64) -> bool;

    /// Returns a snapshot of the current log list, not a live stream.
    async fn get_logs(&self, id: &str) -> Vec<String>;

    /// Sets or clears the break-glass flag for `cluster_id`.
    async fn set_cluster_lock(&self, cluster_id: &str, locked: bool) -> bool;

    /// Existence-only check; no value semantics.
    async fn is_cluster_locked(&self, cluster_id: &str) -> bool;
}

/// Default TTL, in seconds, for a session snapshot and its associated log list (§3, §4.1, §4.6).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
