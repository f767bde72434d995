/// Explicit per-call identity for audit logging, threaded as the first
/// argument into every wrapped tool invocation — a context value passed at
/// the call site is simpler to reason about across an async task tree than
/// ambient/task-local state.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub incident_id: String,
    pub agent_name: String,
}

impl InvocationContext {
    pub fn new(incident_id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            incident_id: incident_id.into(),
            agent_name: agent_name.into(),
        }
    }
}
