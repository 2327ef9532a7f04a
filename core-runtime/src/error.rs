use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Task scope is shut down")]
    ScopeClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
