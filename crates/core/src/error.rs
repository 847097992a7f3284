use crate::token::{TokenStatus, Transition};

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid {field}: {reason}")]
    InvalidFormat { field: &'static str, reason: String },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("one-time code does not match")]
    InvalidCode,
    #[error("one-time code has expired")]
    ExpiredCode,
    #[error("biometric confirmation was rejected")]
    BiometricRejected,
    #[error("cannot apply '{requested}' to a token in status '{from}'")]
    InvalidTransition {
        from: TokenStatus,
        requested: Transition,
    },
    #[error("token update abandoned after {retries} conflicting attempts")]
    Contention { retries: u32 },
    #[error("doctor '{doctor_name}' is at capacity ({capacity} open tokens)")]
    CapacityExceeded { doctor_name: String, capacity: u32 },
    #[error("specialization source unavailable: {0}")]
    ResolverUnavailable(String),
    #[error("failed to read directory file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to parse directory file: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type QueueResult<T> = std::result::Result<T, QueueError>;
