use async_trait::async_trait;
use sre_domain::{
    AuditEvent, AuditLog, Cluster, Incident, IncidentStatus, Job, JobStatus, Organization,
    ToolAuditLog, ToolAuditStatus, User,
};
use sre_domain::{ClusterId, IncidentId, JobId, OrgId};
use uuid::Uuid;

use crate::error::StoreError;

/// Relational persistence for Organization/Cluster/Job/Incident/AuditEvent
/// (§3, §4.3). The database is the consistency authority for these entities;
/// no cross-entity transactions are required by the core (§5).
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    async fn create_organization(&self, name: &str) -> Result<Organization, StoreError>;
    async fn create_user(
        &self,
        org_id: OrgId,
        email: &str,
        hashed_password: &str,
        full_name: Option<&str>,
    ) -> Result<User, StoreError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn create_cluster(&self, org_id: OrgId, name: &str) -> Result<Cluster, StoreError>;
    async fn get_cluster(&self, id: ClusterId) -> Result<Option<Cluster>, StoreError>;
    async fn get_cluster_by_token(&self, token: &str) -> Result<Option<Cluster>, StoreError>;
    async fn list_clusters_for_org(&self, org_id: OrgId) -> Result<Vec<Cluster>, StoreError>;
    async fn delete_cluster(&self, id: ClusterId, org_id: OrgId) -> Result<bool, StoreError>;
    async fn touch_cluster_heartbeat(&self, id: ClusterId) -> Result<(), StoreError>;

    async fn create_job(&self, job: &Job) -> Result<(), StoreError>;
    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StoreError>;
    /// The oldest `pending` job for `cluster_id`, per §4.3's FIFO contract.
    /// Does not mark it `running` (Open Question 1).
    async fn claim_pending(&self, cluster_id: ClusterId) -> Result<Option<Job>, StoreError>;
    async fn update_job_status(
        &self,
        id: JobId,
        status: JobStatus,
        result: Option<&str>,
        logs: Option<&str>,
    ) -> Result<(), StoreError>;
    async fn append_job_logs(&self, id: JobId, text: &str) -> Result<(), StoreError>;
    async fn list_jobs_for_cluster(&self, cluster_id: ClusterId) -> Result<Vec<Job>, StoreError>;

    async fn create_incident(&self, incident: &Incident) -> Result<(), StoreError>;
    async fn get_incident(&self, id: IncidentId) -> Result<Option<Incident>, StoreError>;
    async fn list_incidents_for_cluster(
        &self,
        cluster_id: ClusterId,
    ) -> Result<Vec<Incident>, StoreError>;
    async fn update_incident_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
        summary: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn append_audit_event(&self, event: &AuditEvent) -> Result<(), StoreError>;
    /// Most-recent-first, bounded by `limit`.
    async fn list_audit_events(
        &self,
        cluster_id: ClusterId,
        limit: u32,
    ) -> Result<Vec<AuditEvent>, StoreError>;

    async fn append_audit_log(&self, log: &AuditLog) -> Result<(), StoreError>;

    /// Inserts a `PENDING` tool-audit row and returns its stable ID, which
    /// must be passed back to [`Repository::finalize_tool_audit`] (§4.2, §8
    /// invariant 4).
    async fn insert_tool_audit_pending(
        &self,
        incident_id: &str,
        agent_name: &str,
        tool_name: &str,
        tool_args: &str,
    ) -> Result<Uuid, StoreError>;
    async fn finalize_tool_audit(
        &self,
        id: Uuid,
        status: ToolAuditStatus,
        result: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), StoreError>;
    async fn list_tool_audit_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Vec<ToolAuditLog>, StoreError>;
}
