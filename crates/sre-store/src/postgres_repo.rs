use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use sre_domain::{
    ActorType, AuditEvent, AuditLog, AuditOutcome, Cluster, ClusterId, ClusterStatus, Incident,
    IncidentId, IncidentStatus, IncidentSeverity, Job, JobId, JobStatus, JobType, Organization,
    OrgId, ToolAuditLog, ToolAuditStatus, User, UserId, UserRole,
};
use uuid::Uuid;

use crate::error::StoreError;
use crate::repo::Repository;

const MIGRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS organizations (
    id          UUID PRIMARY KEY,
    name        TEXT NOT NULL,
    api_key     TEXT NOT NULL UNIQUE,
    created_at  TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id               UUID PRIMARY KEY,
    email            TEXT NOT NULL UNIQUE,
    hashed_password  TEXT NOT NULL,
    full_name        TEXT,
    role             TEXT NOT NULL,
    is_active        BOOLEAN NOT NULL,
    org_id           UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    created_at       TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS clusters (
    id              UUID PRIMARY KEY,
    name            TEXT NOT NULL,
    org_id          UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    token           TEXT NOT NULL UNIQUE,
    status          TEXT NOT NULL,
    last_heartbeat  TIMESTAMPTZ,
    created_at      TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS jobs (
    id            UUID PRIMARY KEY,
    cluster_id    UUID NOT NULL REFERENCES clusters(id) ON DELETE CASCADE,
    job_type      TEXT NOT NULL,
    payload       TEXT,
    status        TEXT NOT NULL,
    result        TEXT,
    logs          TEXT,
    created_at    TIMESTAMPTZ NOT NULL,
    started_at    TIMESTAMPTZ,
    completed_at  TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS jobs_cluster_status_idx ON jobs(cluster_id, status, created_at);

CREATE TABLE IF NOT EXISTS incidents (
    id            UUID PRIMARY KEY,
    cluster_id    UUID NOT NULL REFERENCES clusters(id) ON DELETE CASCADE,
    title         TEXT NOT NULL,
    description   TEXT,
    severity      TEXT NOT NULL,
    status        TEXT NOT NULL,
    summary       TEXT,
    created_at    TIMESTAMPTZ NOT NULL,
    resolved_at   TIMESTAMPTZ
);

-- Audit records are never cascaded: they outlive cluster deletion as
-- historical data, so cluster_id carries no foreign key constraint.
CREATE TABLE IF NOT EXISTS audit_events (
    id                UUID PRIMARY KEY,
    cluster_id        UUID NOT NULL,
    occurred_at       TIMESTAMPTZ NOT NULL,
    actor_type        TEXT NOT NULL,
    actor_id          TEXT NOT NULL,
    action_type       TEXT NOT NULL,
    resource_target   TEXT NOT NULL,
    outcome           TEXT NOT NULL,
    details           TEXT
);
CREATE INDEX IF NOT EXISTS audit_events_cluster_idx ON audit_events(cluster_id, occurred_at DESC);

CREATE TABLE IF NOT EXISTS audit_logs (
    id               UUID PRIMARY KEY,
    user_id          UUID NOT NULL,
    action           TEXT NOT NULL,
    target_resource  TEXT NOT NULL,
    target_id        TEXT NOT NULL,
    timestamp        TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS tool_audit_logs (
    id             UUID PRIMARY KEY,
    timestamp      TIMESTAMPTZ NOT NULL,
    incident_id    TEXT NOT NULL,
    agent_name     TEXT NOT NULL,
    tool_name      TEXT NOT NULL,
    tool_args      TEXT NOT NULL,
    status         TEXT NOT NULL,
    result         TEXT,
    error_message  TEXT
);
CREATE INDEX IF NOT EXISTS tool_audit_incident_idx ON tool_audit_logs(incident_id);
"#;

/// Postgres-backed [`Repository`], the relational consistency authority for
/// Organization/Cluster/Job/Incident/AuditEvent (§5).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(MIGRATIONS).execute(&self.pool).await?;
        Ok(())
    }
}

fn cluster_status_str(status: ClusterStatus) -> &'static str {
    match status {
        ClusterStatus::Online => "online",
        ClusterStatus::Offline => "offline",
        ClusterStatus::Maintenance => "maintenance",
    }
}

fn parse_cluster_status(s: &str) -> ClusterStatus {
    match s {
        "online" => ClusterStatus::Online,
        "maintenance" => ClusterStatus::Maintenance,
        _ => ClusterStatus::Offline,
    }
}

fn job_type_str(t: JobType) -> &'static str {
    match t {
        JobType::Investigation => "investigation",
        JobType::Remediation => "remediation",
        JobType::ConfigureCluster => "configure_cluster",
    }
}

fn parse_job_type(s: &str) -> JobType {
    match s {
        "remediation" => JobType::Remediation,
        "configure_cluster" => JobType::ConfigureCluster,
        _ => JobType::Investigation,
    }
}

fn job_status_str(s: JobStatus) -> &'static str {
    match s {
        JobStatus::Pending => "pending",
        JobStatus::Running => "running",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
    }
}

fn parse_job_status(s: &str) -> JobStatus {
    match s {
        "running" => JobStatus::Running,
        "completed" => JobStatus::Completed,
        "failed" => JobStatus::Failed,
        _ => JobStatus::Pending,
    }
}

fn severity_str(s: IncidentSeverity) -> &'static str {
    match s {
        IncidentSeverity::Low => "low",
        IncidentSeverity::Medium => "medium",
        IncidentSeverity::High => "high",
        IncidentSeverity::Critical => "critical",
    }
}

fn parse_severity(s: &str) -> IncidentSeverity {
    match s {
        "high" => IncidentSeverity::High,
        "critical" => IncidentSeverity::Critical,
        "low" => IncidentSeverity::Low,
        _ => IncidentSeverity::Medium,
    }
}

fn incident_status_str(s: IncidentStatus) -> &'static str {
    match s {
        IncidentStatus::Open => "open",
        IncidentStatus::Investigating => "investigating",
        IncidentStatus::Resolved => "resolved",
    }
}

fn parse_incident_status(s: &str) -> IncidentStatus {
    match s {
        "investigating" => IncidentStatus::Investigating,
        "resolved" => IncidentStatus::Resolved,
        _ => IncidentStatus::Open,
    }
}

fn actor_type_str(a: ActorType) -> &'static str {
    match a {
        ActorType::Agent => "AGENT",
        ActorType::User => "USER",
    }
}

fn parse_actor_type(s: &str) -> ActorType {
    if s == "USER" {
        ActorType::User
    } else {
        ActorType::Agent
    }
}

fn outcome_str(o: AuditOutcome) -> &'static str {
    match o {
        AuditOutcome::Success => "SUCCESS",
        AuditOutcome::Failed => "FAILED",
    }
}

fn parse_outcome(s: &str) -> AuditOutcome {
    if s == "SUCCESS" {
        AuditOutcome::Success
    } else {
        AuditOutcome::Failed
    }
}

fn tool_audit_status_str(s: ToolAuditStatus) -> &'static str {
    match s {
        ToolAuditStatus::Pending => "PENDING",
        ToolAuditStatus::Success => "SUCCESS",
        ToolAuditStatus::Failure => "FAILURE",
    }
}

fn parse_tool_audit_status(s: &str) -> ToolAuditStatus {
    match s {
        "SUCCESS" => ToolAuditStatus::Success,
        "FAILURE" => ToolAuditStatus::Failure,
        _ => ToolAuditStatus::Pending,
    }
}

fn cluster_from_row(row: &sqlx::postgres::PgRow) -> Cluster {
    Cluster {
        id: ClusterId(row.get("id")),
        name: row.get("name"),
        org_id: OrgId(row.get("org_id")),
        token: row.get("token"),
        status: parse_cluster_status(row.get::<String, _>("status").as_str()),
        last_heartbeat: row.get::<Option<DateTime<Utc>>, _>("last_heartbeat"),
        created_at: row.get("created_at"),
    }
}

fn job_from_row(row: &sqlx::postgres::PgRow) -> Job {
    Job {
        id: JobId(row.get("id")),
        cluster_id: ClusterId(row.get("cluster_id")),
        job_type: parse_job_type(row.get::<String, _>("job_type").as_str()),
        payload: row.get("payload"),
        status: parse_job_status(row.get::<String, _>("status").as_str()),
        result: row.get("result"),
        logs: row.get("logs"),
        created_at: row.get("created_at"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
    }
}

fn incident_from_row(row: &sqlx::postgres::PgRow) -> Incident {
    Incident {
        id: IncidentId(row.get("id")),
        cluster_id: ClusterId(row.get("cluster_id")),
        title: row.get("title"),
        description: row.get("description"),
        severity: parse_severity(row.get::<String, _>("severity").as_str()),
        status: parse_incident_status(row.get::<String, _>("status").as_str()),
        summary: row.get("summary"),
        created_at: row.get("created_at"),
        resolved_at: row.get("resolved_at"),
    }
}

fn audit_event_from_row(row: &sqlx::postgres::PgRow) -> AuditEvent {
    AuditEvent {
        id: row.get("id"),
        cluster_id: ClusterId(row.get("cluster_id")),
        occurred_at: row.get("occurred_at"),
        actor_type: parse_actor_type(row.get::<String, _>("actor_type").as_str()),
        actor_id: row.get("actor_id"),
        action_type: row.get("action_type"),
        resource_target: row.get("resource_target"),
        outcome: parse_outcome(row.get::<String, _>("outcome").as_str()),
        details: row.get("details"),
    }
}

fn tool_audit_from_row(row: &sqlx::postgres::PgRow) -> ToolAuditLog {
    ToolAuditLog {
        id: row.get("id"),
        timestamp: row.get("timestamp"),
        incident_id: row.get("incident_id"),
        agent_name: row.get("agent_name"),
        tool_name: row.get("tool_name"),
        tool_args: row.get("tool_args"),
        status: parse_tool_audit_status(row.get::<String, _>("status").as_str()),
        result: row.get("result"),
        error_message: row.get("error_message"),
    }
}

#[async_trait::async_trait]
impl Repository for PostgresRepository {
    async fn create_organization(&self, name: &str) -> Result<Organization, StoreError> {
        let org = Organization {
            id: OrgId::new(),
            name: name.to_string(),
            api_key: Uuid::new_v4().simple().to_string(),
            created_at: Utc::now(),
        };
        sqlx::query("INSERT INTO organizations (id, name, api_key, created_at) VALUES ($1, $2, $3, $4)")
            .bind(org.id.0)
            .bind(&org.name)
            .bind(&org.api_key)
            .bind(org.created_at)
            .execute(&self.pool)
            .await?;
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
            id: UserId::new(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            full_name: full_name.map(str::to_string),
            role: UserRole::Admin,
            is_active: true,
            org_id,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO users (id, email, hashed_password, full_name, role, is_active, org_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id.0)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.full_name)
        .bind("admin")
        .bind(user.is_active)
        .bind(user.org_id.0)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| User {
            id: UserId(row.get("id")),
            email: row.get("email"),
            hashed_password: row.get("hashed_password"),
            full_name: row.get("full_name"),
            role: if row.get::<String, _>("role") == "admin" {
                UserRole::Admin
            } else {
                UserRole::Member
            },
            is_active: row.get("is_active"),
            org_id: OrgId(row.get("org_id")),
            created_at: row.get("created_at"),
        }))
    }

    async fn create_cluster(&self, org_id: OrgId, name: &str) -> Result<Cluster, StoreError> {
        let cluster = Cluster {
            id: ClusterId::new(),
            name: name.to_string(),
            org_id,
            token: Uuid::new_v4().simple().to_string(),
            status: ClusterStatus::Offline,
            last_heartbeat: None,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO clusters (id, name, org_id, token, status, last_heartbeat, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(cluster.id.0)
        .bind(&cluster.name)
        .bind(cluster.org_id.0)
        .bind(&cluster.token)
        .bind(cluster_status_str(cluster.status))
        .bind(cluster.last_heartbeat)
        .bind(cluster.created_at)
        .execute(&self.pool)
        .await?;
        Ok(cluster)
    }

    async fn get_cluster(&self, id: ClusterId) -> Result<Option<Cluster>, StoreError> {
        let row = sqlx::query("SELECT * FROM clusters WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(cluster_from_row))
    }

    async fn get_cluster_by_token(&self, token: &str) -> Result<Option<Cluster>, StoreError> {
        let row = sqlx::query("SELECT * FROM clusters WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(cluster_from_row))
    }

    async fn list_clusters_for_org(&self, org_id: OrgId) -> Result<Vec<Cluster>, StoreError> {
        let rows = sqlx::query("SELECT * FROM clusters WHERE org_id = $1")
            .bind(org_id.0)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(cluster_from_row).collect())
    }

    async fn delete_cluster(&self, id: ClusterId, org_id: OrgId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM clusters WHERE id = $1 AND org_id = $2")
            .bind(id.0)
            .bind(org_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch_cluster_heartbeat(&self, id: ClusterId) -> Result<(), StoreError> {
        sqlx::query("UPDATE clusters SET last_heartbeat = $2, status = 'online' WHERE id = $1")
            .bind(id.0)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_job(&self, job: &Job) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO jobs (id, cluster_id, job_type, payload, status, result, logs,
                                created_at, started_at, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(job.id.0)
        .bind(job.cluster_id.0)
        .bind(job_type_str(job.job_type))
        .bind(&job.payload)
        .bind(job_status_str(job.status))
        .bind(&job.result)
        .bind(&job.logs)
        .bind(job.created_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(job_from_row))
    }

    async fn claim_pending(&self, cluster_id: ClusterId) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM jobs WHERE cluster_id = $1 AND status = 'pending'
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(cluster_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(job_from_row))
    }

    async fn update_job_status(
        &self,
        id: JobId,
        status: JobStatus,
        result: Option<&str>,
        logs: Option<&str>,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        match status {
            JobStatus::Running => {
                sqlx::query(
                    "UPDATE jobs SET status = $2, result = COALESCE($3, result),
                        logs = CASE WHEN $4::text IS NULL THEN logs
                                    WHEN logs IS NULL THEN $4
                                    ELSE logs || E'\n' || $4 END,
                        started_at = COALESCE(started_at, $5)
                     WHERE id = $1",
                )
                .bind(id.0)
                .bind(job_status_str(status))
                .bind(result)
                .bind(logs)
                .bind(now)
                .execute(&self.pool)
                .await?;
            }
            JobStatus::Completed | JobStatus::Failed => {
                sqlx::query(
                    "UPDATE jobs SET status = $2, result = COALESCE($3, result),
                        logs = CASE WHEN $4::text IS NULL THEN logs
                                    WHEN logs IS NULL THEN $4
                                    ELSE logs || E'\n' || $4 END,
                        completed_at = $5
                     WHERE id = $1",
                )
                .bind(id.0)
                .bind(job_status_str(status))
                .bind(result)
                .bind(logs)
                .bind(now)
                .execute(&self.pool)
                .await?;
            }
            JobStatus::Pending => {
                sqlx::query("UPDATE jobs SET status = $2 WHERE id = $1")
                    .bind(id.0)
                    .bind(job_status_str(status))
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(())
    }

    async fn append_job_logs(&self, id: JobId, text: &str) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE jobs SET logs = CASE WHEN logs IS NULL THEN $2 ELSE logs || E'\n' || $2 END
             WHERE id = $1",
        )
        .bind(id.0)
        .bind(text)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_jobs_for_cluster(&self, cluster_id: ClusterId) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query("SELECT * FROM jobs WHERE cluster_id = $1 ORDER BY created_at DESC")
            .bind(cluster_id.0)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(job_from_row).collect())
    }

    async fn create_incident(&self, incident: &Incident) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO incidents (id, cluster_id, title, description, severity, status,
                                     summary, created_at, resolved_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(incident.id.0)
        .bind(incident.cluster_id.0)
        .bind(&incident.title)
        .bind(&incident.description)
        .bind(severity_str(incident.severity))
        .bind(incident_status_str(incident.status))
        .bind(&incident.summary)
        .bind(incident.created_at)
        .bind(incident.resolved_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_incident(&self, id: IncidentId) -> Result<Option<Incident>, StoreError> {
        let row = sqlx::query("SELECT * FROM incidents WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(incident_from_row))
    }

    async fn list_incidents_for_cluster(
        &self,
        cluster_id: ClusterId,
    ) -> Result<Vec<Incident>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM incidents WHERE cluster_id = $1 ORDER BY created_at DESC",
        )
        .bind(cluster_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(incident_from_row).collect())
    }

    async fn update_incident_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
        summary: Option<&str>,
    ) -> Result<(), StoreError> {
        let resolved_at = (status == IncidentStatus::Resolved).then(Utc::now);
        sqlx::query(
            "UPDATE incidents SET status = $2, summary = COALESCE($3, summary),
                resolved_at = COALESCE($4, resolved_at)
             WHERE id = $1",
        )
        .bind(id.0)
        .bind(incident_status_str(status))
        .bind(summary)
        .bind(resolved_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_audit_event(&self, event: &AuditEvent) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO audit_events (id, cluster_id, occurred_at, actor_type, actor_id,
                                        action_type, resource_target, outcome, details)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(event.id)
        .bind(event.cluster_id.0)
        .bind(event.occurred_at)
        .bind(actor_type_str(event.actor_type))
        .bind(&event.actor_id)
        .bind(&event.action_type)
        .bind(&event.resource_target)
        .bind(outcome_str(event.outcome))
        .bind(&event.details)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_audit_events(
        &self,
        cluster_id: ClusterId,
        limit: u32,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM audit_events WHERE cluster_id = $1
             ORDER BY occurred_at DESC LIMIT $2",
        )
        .bind(cluster_id.0)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(audit_event_from_row).collect())
    }

    async fn append_audit_log(&self, log: &AuditLog) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO audit_logs (id, user_id, action, target_resource, target_id, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(log.id)
        .bind(log.user_id.0)
        .bind(&log.action)
        .bind(&log.target_resource)
        .bind(&log.target_id)
        .bind(log.timestamp)
        .execute(&self.pool)
        .await?;
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
        sqlx::query(
            "INSERT INTO tool_audit_logs (id, timestamp, incident_id, agent_name, tool_name,
                                           tool_args, status, result, error_message)
             VALUES ($1, $2, $3, $4, $5, $6, 'PENDING', NULL, NULL)",
        )
        .bind(id)
        .bind(Utc::now())
        .bind(incident_id)
        .bind(agent_name)
        .bind(tool_name)
        .bind(tool_args)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn finalize_tool_audit(
        &self,
        id: Uuid,
        status: ToolAuditStatus,
        result: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE tool_audit_logs SET status = $2, result = $3, error_message = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(tool_audit_status_str(status))
        .bind(result)
        .bind(error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_tool_audit_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Vec<ToolAuditLog>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM tool_audit_logs WHERE incident_id = $1 ORDER BY timestamp DESC",
        )
        .bind(incident_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(tool_audit_from_row).collect())
    }
}
