use fingerprint_config::ConfigError;
use fingerprint_hal::HalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HAL error: {0}")]
    Hal(#[from] HalError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Open session already exists!")]
    SessionAlreadyOpen,

    #[error("Session is closed")]
    SessionClosed,

    #[error("{0} is not supported by this sensor")]
    Unsupported(&'static str),
}
