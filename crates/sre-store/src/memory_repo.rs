use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sre_domain::{
    AuditEvent, AuditLog, Cluster, ClusterId, ClusterStatus, Incident, IncidentId, IncidentStatus,
    Job, JobId, JobStatus, Organization, OrgId, ToolAuditLog, ToolAuditStatus, User,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::repo::Repository;

#[derive(Default)]
struct Inner {
    orgs: HashMap<OrgId, Organization>,
    users: HashMap<String, User>,
    clusters: HashMap<ClusterId, Cluster>,
    jobs: HashMap<JobId, Job>,
    incidents: HashMap<IncidentId, Incident>,
    audit_events: Vec<AuditEvent>,
    audit_logs: Vec<AuditLog>,
    tool_audit: HashMap<Uuid, ToolAuditLog>,
}

/// In-memory [`Repository`], used by the test suite in place of Postgres.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_organization(&self, name: &str) -> Result<Organization, StoreError> {
        let org = Organization {
            id: OrgId::new(),
            name: name.to_string(),
            api_key: new_token(),
            created_at: Utc::now(),
        };
        self.inner.write().await.orgs.insert(org.id, org.clone());
        Ok(org)
    }

    async fn create_user(
        &self,
        org_id: OrgId,
        email: &str,
        hashed_password: &str,
        full_name: Option<&str>,
    ) -> Result<User, StoreError> {
        let user = User {
            id: sre_domain::UserId::new(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            full_name: full_name.map(str::to_string),
            role: sre_domain::UserRole::Admin,
            is_active: true,
            org_id,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .users
            .insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(email).cloned())
    }

    async fn create_cluster(&self, org_id: OrgId, name: &str) -> Result<Cluster, StoreError> {
        let cluster = Cluster {
            id: ClusterId::new(),
            name: name.to_string(),
            org_id,
            token: new_token(),
            status: ClusterStatus::Offline,
            last_heartbeat: None,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .clusters
            .insert(cluster.id, cluster.clone());
        Ok(cluster)
    }

    async fn get_cluster(&self, id: ClusterId) -> Result<Option<Cluster>, StoreError> {
        Ok(self.inner.read().await.clusters.get(&id).cloned())
    }

    async fn get_cluster_by_token(&self, token: &str) -> Result<Option<Cluster>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .clusters
            .values()
            .find(|c| c.token == token)
            .cloned())
    }

    async fn list_clusters_for_org(&self, org_id: OrgId) -> Result<Vec<Cluster>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .clusters
            .values()
            .filter(|c| c.org_id == org_id)
            .cloned()
            .collect())
    }

    async fn delete_cluster(&self, id: ClusterId, org_id: OrgId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let owned = inner.clusters.get(&id).is_some_and(|c| c.org_id == org_id);
        if owned {
            inner.clusters.remove(&id);
        }
        Ok(owned)
    }

    async fn touch_cluster_heartbeat(&self, id: ClusterId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let cluster = inner
            .clusters
            .get_mut(&id)
            .ok_or_else(|| StoreError::ClusterNotFound(id.to_string()))?;
        cluster.last_heartbeat = Some(Utc::now());
        cluster.status = ClusterStatus::Online;
        Ok(())
    }

    async fn create_job(&self, job: &Job) -> Result<(), StoreError> {
        self.inner.write().await.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.inner.read().await.jobs.get(&id).cloned())
    }

    async fn claim_pending(&self, cluster_id: ClusterId) -> Result<Option<Job>, StoreError> {
        let inner = self.inner.read().await;
        let oldest = inner
            .jobs
            .values()
            .filter(|j| j.cluster_id == cluster_id && j.status == JobStatus::Pending)
            .min_by_key(|j| j.created_at)
            .cloned();
        Ok(oldest)
    }

    async fn update_job_status(
        &self,
        id: JobId,
        status: JobStatus,
        result: Option<&str>,
        logs: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;
        job.status = status;
        if let Some(result) = result {
            job.result = Some(result.to_string());
        }
        if let Some(logs) = logs {
            job.append_logs(logs);
        }
        match status {
            JobStatus::Running if job.started_at.is_none() => job.started_at = Some(Utc::now()),
            JobStatus::Completed | JobStatus::Failed => job.completed_at = Some(Utc::now()),
            _ => {}
        }
        Ok(())
    }

    async fn append_job_logs(&self, id: JobId, text: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;
        job.append_logs(text);
        Ok(())
    }

    async fn list_jobs_for_cluster(&self, cluster_id: ClusterId) -> Result<Vec<Job>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.cluster_id == cluster_id)
            .cloned()
            .collect())
    }

    async fn create_incident(&self, incident: &Incident) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .incidents
            .insert(incident.id, incident.clone());
        Ok(())
    }

    async fn get_incident(&self, id: IncidentId) -> Result<Option<Incident>, StoreError> {
        Ok(self.inner.read().await.incidents.get(&id).cloned())
    }

    async fn list_incidents_for_cluster(
        &self,
        cluster_id: ClusterId,
    ) -> Result<Vec<Incident>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .incidents
            .values()
            .filter(|i| i.cluster_id == cluster_id)
            .cloned()
            .collect())
    }

    async fn update_incident_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
        summary: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let incident = inner
            .incidents
            .get_mut(&id)
            .ok_or_else(|| StoreError::IncidentNotFound(id.to_string()))?;
        incident.status = status;
        if let Some(summary) = summary {
            incident.summary = Some(summary.to_string());
        }
        if status == IncidentStatus::Resolved {
            incident.resolved_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn append_audit_event(&self, event: &AuditEvent) -> Result<(), StoreError> {
        self.inner.write().await.audit_events.push(event.clone());
        Ok(())
    }

    async fn list_audit_events(
        &self,
        cluster_id: ClusterId,
        limit: u32,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        let inner = self.inner.read().await;
        let mut events: Vec<AuditEvent> = inner
            .audit_events
            .iter()
            .filter(|e| e.cluster_id == cluster_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        events.truncate(limit as usize);
        Ok(events)
    }

    async fn append_audit_log(&self, log: &AuditLog) -> Result<(), StoreError> {
        self.inner.write().await.audit_logs.push(log.clone());
        Ok(())
    }

    async fn insert_tool_audit_pending(
        &self,
        incident_id: &str,
        agent_name: &str,
        tool_name: &str,
        tool_args: &str,
    ) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let row = ToolAuditLog {
            id,
            timestamp: Utc::now(),
            incident_id: incident_id.to_string(),
            agent_name: agent_name.to_string(),
            tool_name: tool_name.to_string(),
            tool_args: tool_args.to_string(),
            status: ToolAuditStatus::Pending,
            result: None,
            error_message: None,
        };
        self.inner.write().await.tool_audit.insert(id, row);
        Ok(id)
    }

    async fn finalize_tool_audit(
        &self,
        id: Uuid,
        status: ToolAuditStatus,
        result: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner
            .tool_audit
            .get_mut(&id)
            .ok_or_else(|| StoreError::Internal(format!("tool audit row {id} not found")))?;
        row.status = status;
        row.result = result.map(str::to_string);
        row.error_message = error_message.map(str::to_string);
        Ok(())
    }

    async fn list_tool_audit_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Vec<ToolAuditLog>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .tool_audit
            .values()
            .filter(|r| r.incident_id == incident_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cluster_ownership_gates_deletion() {
        let repo = InMemoryRepository::new();
        let org_a = repo.create_organization("org-a").await.unwrap();
        let org_b = repo.create_organization("org-b").await.unwrap();
        let cluster = repo.create_cluster(org_a.id, "prod").await.unwrap();

        assert!(!repo.delete_cluster(cluster.id, org_b.id).await.unwrap());
        assert!(repo.delete_cluster(cluster.id, org_a.id).await.unwrap());
        assert!(repo.get_cluster(cluster.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn claim_pending_returns_oldest_first() {
        let repo = InMemoryRepository::new();
        let org = repo.create_organization("org").await.unwrap();
        let cluster = repo.create_cluster(org.id, "c").await.unwrap();

        let mut first = Job::new(cluster.id, sre_domain::JobType::Investigation, None);
        first.created_at = Utc::now() - chrono::Duration::seconds(10);
        let second = Job::new(cluster.id, sre_domain::JobType::Investigation, None);
        repo.create_job(&second).await.unwrap();
        repo.create_job(&first).await.unwrap();

        let claimed = repo.claim_pending(cluster.id).await.unwrap().unwrap();
        assert_eq!(claimed.id, first.id);
    }

    #[tokio::test]
    async fn job_status_update_sets_timestamps_once() {
        let repo = InMemoryRepository::new();
        let org = repo.create_organization("org").await.unwrap();
        let cluster = repo.create_cluster(org.id, "c").await.unwrap();
        let job = Job::new(cluster.id, sre_domain::JobType::Investigation, None);
        repo.create_job(&job).await.unwrap();

        repo.update_job_status(job.id, JobStatus::Running, None, None)
            .await
            .unwrap();
        let running = repo.get_job(job.id).await.unwrap().unwrap();
        let started_at = running.started_at.expect("started_at set");

        repo.update_job_status(job.id, JobStatus::Running, None, None)
            .await
            .unwrap();
        let still_running = repo.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(still_running.started_at, Some(started_at));

        repo.update_job_status(job.id, JobStatus::Completed, Some("{}"), None)
            .await
            .unwrap();
        let done = repo.get_job(job.id).await.unwrap().unwrap();
        assert!(done.completed_at.is_some());
        assert!(done.status.is_terminal());
    }

    #[tokio::test]
    async fn tool_audit_pending_then_finalized() {
        let repo = InMemoryRepository::new();
        let id = repo
            .insert_tool_audit_pending("inc-1", "InfraAgent", "get_pod", "{}")
            .await
            .unwrap();
        let rows = repo.list_tool_audit_for_incident("inc-1").await.unwrap();
        assert_eq!(rows[0].status, ToolAuditStatus::Pending);

        repo.finalize_tool_audit(id, ToolAuditStatus::Success, Some("ok"), None)
            .await
            .unwrap();
        let rows = repo.list_tool_audit_for_incident("inc-1").await.unwrap();
        assert_eq!(rows[0].status, ToolAuditStatus::Success);
        assert_eq!(rows[0].result.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn audit_events_are_most_recent_first() {
        let repo = InMemoryRepository::new();
        let org = repo.create_organization("org").await.unwrap();
        let cluster = repo.create_cluster(org.id, "c").await.unwrap();

        let mut first = audit_event(cluster.id, "restart");
        first.occurred_at = Utc::now() - chrono::Duration::seconds(5);
        let second = audit_event(cluster.id, "scale");
        repo.append_audit_event(&first).await.unwrap();
        repo.append_audit_event(&second).await.unwrap();

        let events = repo.list_audit_events(cluster.id, 10).await.unwrap();
        assert_eq!(events[0].action_type, "scale");
        assert_eq!(events[1].action_type, "restart");
    }

    fn audit_event(cluster_id: ClusterId, action_type: &str) -> AuditEvent {
        AuditEvent {
            id: Uuid::new_v4(),
            cluster_id,
            occurred_at: Utc::now(),
            actor_type: sre_domain::ActorType::Agent,
            actor_id: "Executor".to_string(),
            action_type: action_type.to_string(),
            resource_target: "deployment/api".to_string(),
            outcome: sre_domain::AuditOutcome::Success,
            details: None,
        }
    }
}
