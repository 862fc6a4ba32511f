//! Error types for the onboarding service.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Persistence store errors.
///
/// The controller never surfaces these to the user; they are logged and the
/// in-memory state stays authoritative.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Misuse of the onboarding flow by a caller.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Reset is only available from the completion screen (current step {step})")]
    NotAtCompletion { step: i64 },

    #[error("Unknown step id: {0}")]
    UnknownStep(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = StoreError::Unavailable("disk gone".to_string());
        assert_eq!(err.to_string(), "Store unavailable: disk gone");

        let err = StoreError::Serialization("onboarding_answers: key must be a string".to_string());
        assert!(err.to_string().starts_with("Serialization error: onboarding_answers"));

        let err = FlowError::NotAtCompletion { step: 3 };
        assert!(err.to_string().contains("current step 3"));

        let err = ConfigError::InvalidValue {
            key: "ONBOARDING_PORT".to_string(),
            message: "bad".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for ONBOARDING_PORT: bad"
        );
    }
}
