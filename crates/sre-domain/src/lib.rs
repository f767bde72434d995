pub mod error;
pub mod ids;
pub mod incident;
pub mod plan;

pub use error::DomainError;
pub use ids::{ClusterId, IncidentId, JobId, OrgId, UserId};
pub use incident::{
    ActorType, AuditEvent, AuditLog, AuditOutcome, Cluster, ClusterStatus, Incident,
    IncidentSeverity, IncidentStatus, Job, JobStatus, JobType, Organization, ToolAuditLog,
    ToolAuditStatus, User, UserRole,
};
pub use plan::{ApprovalStatus, RemediationAction, RemediationPlan, RiskLevel};
