// Registry error types and their HTTP classification

use thiserror::Error;
use warp::http::StatusCode;

/// Broad category of a registry failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown identity or unknown task key
    NotFound,
    /// A business precondition was violated by the request
    PreconditionViolated,
    /// Storage or payout backend failed
    Internal,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Mining is already in progress")]
    AlreadyMining,

    #[error("Mining is not in progress")]
    NotMining,

    #[error("Please complete all tasks first (pending: {})", .0.join(", "))]
    TasksIncomplete(Vec<String>),

    #[error("Insufficient points: need {needed}, have {available}")]
    InsufficientPoints { needed: f64, available: f64 },

    #[error("Cost must be a non-negative number, got {0}")]
    InvalidCost(f64),

    #[error("Destination address is required")]
    MissingDestination,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Payout failed: {0}")]
    Payout(anyhow::Error),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::UserNotFound(_) | RegistryError::UnknownTask(_) => ErrorKind::NotFound,
            RegistryError::AlreadyMining
            | RegistryError::NotMining
            | RegistryError::TasksIncomplete(_)
            | RegistryError::InsufficientPoints { .. }
            | RegistryError::InvalidCost(_)
            | RegistryError::MissingDestination => ErrorKind::PreconditionViolated,
            RegistryError::Storage(_) | RegistryError::Payout(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PreconditionViolated => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the client
    pub fn public_message(&self) -> String {
        match self {
            RegistryError::Storage(_) => "Internal server error".to_string(),
            RegistryError::Payout(_) => "Airdrop payout could not be sent".to_string(),
            other => other.to_string(),
        }
    }
}
