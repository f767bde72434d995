use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid job transition: {job_id} is already terminal ({status})")]
    JobAlreadyTerminal { job_id: String, status: String },

    #[error("invalid action type: {0}")]
    InvalidActionType(String),

    #[error("invalid severity: {0}")]
    InvalidSeverity(String),

    #[error("invalid risk level: {0}")]
    InvalidRiskLevel(String),
}
