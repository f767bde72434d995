pub mod agents;
pub mod catalogue;
pub mod engine;
pub mod executor;
pub mod oracle;
pub mod policy;
pub mod prompts;
pub mod state;
pub mod verifier;

pub use catalogue::ToolCatalogue;
pub use engine::{
    incident_status_for, resume_after_approval, run, EngineDeps, Node, Outcome,
};
pub use oracle::{HttpOracle, OracleError, ReasoningOracle, RecordedOracle};
pub use state::{InvestigationState, Trigger};
