pub mod error;
pub mod memory_repo;
pub mod memory_session;
pub mod postgres_repo;
pub mod redis_session;
pub mod repo;
pub mod session;
pub mod state;

pub use error::StoreError;
pub use memory_repo::InMemoryRepository;
pub use memory_session::InMemorySessionStore;
pub use postgres_repo::PostgresRepository;
pub use redis_session::RedisSessionStore;
pub use repo::Repository;
pub use session::SessionStore;
pub use state::{ExecutionLog, SessionSnapshot, SessionStatus, VerificationRecord};
