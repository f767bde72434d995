mod error;
mod loader;
mod raw;

pub use error::ConfigError;
pub use loader::{load_server_config, load_worker_config, tool_catalogue_from_env};
pub use raw::{ServerConfig, ToolCatalogueConfig, WorkerConfig};
