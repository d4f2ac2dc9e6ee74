use crate::answer::ResultCode;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid domain name at position {position}: {reason}")]
    InvalidDomainName { position: usize, reason: String },

    #[error("Invalid record data: {0}")]
    InvalidRecordData(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Malformed DNS message: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("DNS lookup failed: {0}")]
    Dns(ResultCode),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    pub fn invalid_name(position: usize, reason: impl Into<String>) -> Self {
        DomainError::InvalidDomainName {
            position,
            reason: reason.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(Arc::new(err))
    }
}
