//! Unified error type for the task scheduler, following the RPC status
//! mapping in spec §7.

use thiserror::Error;

/// The unified error type for scheduler operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Failed precondition: {message}")]
    FailedPrecondition { message: String },

    #[error("Resource exhausted: {message}")]
    ResourceExhausted { message: String },

    #[error("Queue error: {message}")]
    Queue {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Service unavailable: {service}")]
    Unavailable { service: String },

    #[error("Migration error: {message}")]
    Migration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn database(message: impl Into<String>) -> Self {
        Error::Database {
            message: message.into(),
            source: None,
        }
    }

    pub fn database_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Database {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Error::FailedPrecondition {
            message: message.into(),
        }
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Error::ResourceExhausted {
            message: message.into(),
        }
    }

    pub fn queue(message: impl Into<String>) -> Self {
        Error::Queue {
            message: message.into(),
            source: None,
        }
    }

    pub fn queue_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Queue {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    pub fn unavailable(service: impl Into<String>) -> Self {
        Error::Unavailable {
            service: service.into(),
        }
    }

    /// Whether a caller may reasonably retry this error (spec §7: INTERNAL is
    /// retryable, INVALID_ARGUMENT/NOT_FOUND/FAILED_PRECONDITION/
    /// RESOURCE_EXHAUSTED are not).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Database { .. } | Error::Queue { .. } | Error::Unavailable { .. }
        )
    }

    /// RPC-shaped status code, mirroring spec §7's taxonomy.
    pub fn status_code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "NOT_FOUND",
            Error::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Error::FailedPrecondition { .. } => "FAILED_PRECONDITION",
            Error::ResourceExhausted { .. } => "RESOURCE_EXHAUSTED",
            Error::Unavailable { .. } => "UNAVAILABLE",
            Error::Database { .. }
            | Error::Queue { .. }
            | Error::Serialization { .. }
            | Error::Migration { .. }
            | Error::Internal { .. }
            | Error::Other(_) => "INTERNAL",
        }
    }
}

/// Result type alias for scheduler operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_spec_taxonomy() {
        assert_eq!(Error::not_found("Job", "123").status_code(), "NOT_FOUND");
        assert_eq!(
            Error::invalid_argument("bad cron").status_code(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(
            Error::failed_precondition("terminal status").status_code(),
            "FAILED_PRECONDITION"
        );
        assert_eq!(
            Error::resource_exhausted("cpu").status_code(),
            "RESOURCE_EXHAUSTED"
        );
        assert_eq!(Error::unavailable("job-service").status_code(), "UNAVAILABLE");
        assert_eq!(Error::database("conn refused").status_code(), "INTERNAL");
    }

    #[test]
    fn only_infra_errors_are_retryable() {
        assert!(Error::database("conn refused").is_retryable());
        assert!(Error::queue("produce timeout").is_retryable());
        assert!(Error::unavailable("job-service").is_retryable());
        assert!(!Error::not_found("Job", "123").is_retryable());
        assert!(!Error::invalid_argument("bad cron").is_retryable());
    }
}
