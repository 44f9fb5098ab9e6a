use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// The device store answered with a non-success status or could not be reached.
    #[error("Remote store error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Remote {
        status: Option<u16>,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid device record: {0}")]
    InvalidRecord(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// A paired write stopped halfway; the store now holds only one side of the pair.
    #[error("Partial write at {location}: only the {written} record was stored ({message})")]
    PartialWrite {
        location: String,
        written: String,
        message: String,
    },
}

impl DomainError {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            status: None,
            message: message.into(),
        }
    }

    pub fn remote_status(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Remote failures are retried by the next poll tick; everything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = DomainError::remote_status(503, "Service Unavailable");
        assert_eq!(
            err.to_string(),
            "Remote store error (503): Service Unavailable"
        );

        let err = DomainError::remote("connection refused");
        assert_eq!(err.to_string(), "Remote store error: connection refused");
    }

    #[test]
    fn test_only_remote_errors_are_retryable() {
        assert!(DomainError::remote("timeout").is_retryable());
        assert!(!DomainError::NotFound("door".into()).is_retryable());
        assert!(
            !DomainError::PartialWrite {
                location: "A".into(),
                written: "actuador".into(),
                message: "boom".into(),
            }
            .is_retryable()
        );
    }
}
