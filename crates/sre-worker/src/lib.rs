pub mod client;
pub mod error;
pub mod worker;

pub use client::JobPollerClient;
pub use error::WorkerError;
pub use worker::start;
