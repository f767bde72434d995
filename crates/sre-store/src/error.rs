use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("incident not found: {0}")]
    IncidentNotFound(String),

    #[error("organization not found: {0}")]
    OrgNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal store error: {0}")]
    Internal(String),
}
