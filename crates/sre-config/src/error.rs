use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {var} has an invalid value {value:?}: {message}")]
    InvalidVar {
        var: &'static str,
        value: String,
        message: String,
    },
}
