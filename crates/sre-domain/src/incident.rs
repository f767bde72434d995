use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ClusterId, IncidentId, JobId, OrgId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub org_id: OrgId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    Online,
    Offline,
    Maintenance,
}

impl Default for ClusterStatus {
    fn default() -> Self {
        Self::Offline
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub name: String,
    pub org_id: OrgId,
    /// Bearer identity for this cluster's edge worker. Unique.
    pub token: String,
    pub status: ClusterStatus,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Investigation,
    Remediation,
    ConfigureCluster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub cluster_id: ClusterId,
    pub job_type: JobType,
    pub payload: Option<String>,
    pub status: JobStatus,
    pub result: Option<String>,
    pub logs: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(cluster_id: ClusterId, job_type: JobType, payload: Option<String>) -> Self {
        Self {
            id: JobId::new(),
            cluster_id,
            job_type,
            payload,
            status: JobStatus::Pending,
            result: None,
            logs: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Appends to the log blob, never replacing it (Open Question 4 resolved as append-only).
    pub fn append_logs(&mut self, text: &str) {
        match &mut self.logs {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(text);
            }
            None => self.logs = Some(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub cluster_id: ClusterId,
    pub title: String,
    pub description: Option<String>,
    pub severity: IncidentSeverity,
    pub status: IncidentStatus,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Incident {
    pub fn new(
        cluster_id: ClusterId,
        title: String,
        description: Option<String>,
        severity: IncidentSeverity,
    ) -> Self {
        Self {
            id: IncidentId::new(),
            cluster_id,
            title,
            description,
            severity,
            status: IncidentStatus::Open,
            summary: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}

#[cfg(test)]
mod job_tests {
    use super::*;

    #[test]
    fn append_logs_never_replaces() {
        let mut job = Job::new(ClusterId::new(), JobType::Investigation, None);
        job.append_logs("line one");
        job.append_logs("line two");
        assert_eq!(job.logs.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn new_job_is_pending() {
        let job = Job::new(ClusterId::new(), JobType::ConfigureCluster, Some("{}".into()));
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.started_at.is_none());
        assert!(!job.status.is_terminal());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActorType {
    Agent,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditOutcome {
    Success,
    Failed,
}

/// Append-only compliance record. Never mutated after insertion, never cascaded
/// on cluster deletion — it outlives the reference it carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: uuid::Uuid,
    pub cluster_id: ClusterId,
    pub occurred_at: DateTime<Utc>,
    pub actor_type: ActorType,
    pub actor_id: String,
    pub action_type: String,
    pub resource_target: String,
    pub outcome: AuditOutcome,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ToolAuditStatus {
    Pending,
    Success,
    Failure,
}

/// Generic user-action trail, distinct from the SOC2 [`AuditEvent`]/
/// [`ToolAuditLog`] pair — records dashboard actions like "created_cluster".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: uuid::Uuid,
    pub user_id: UserId,
    pub action: String,
    pub target_resource: String,
    pub target_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-tool-call flight recorder row. Written twice: PENDING at entry,
/// finalised at exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolAuditLog {
    pub id: uuid::Uuid,
    pub timestamp: DateTime<Utc>,
    pub incident_id: String,
    pub agent_name: String,
    pub tool_name: String,
    pub tool_args: String,
    pub status: ToolAuditStatus,
    pub result: Option<String>,
    pub error_message: Option<String>,
}
