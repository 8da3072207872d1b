use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy shared by every component. `Unauthorized` forces a
/// session teardown through the session manager; everything else surfaces to
/// the flow that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("could not reach server: {0}")]
    Unreachable(String),
    #[error("session token rejected by server")]
    Unauthorized,
    #[error("login rejected: {0}")]
    InvalidCredentials(String),
    #[error("invalid partner: {0}")]
    InvalidPartner(String),
    #[error("a pairing is already registered for today")]
    DuplicateForToday,
    #[error("daily pairing uniqueness violated upstream: {0}")]
    ConsistencyViolation(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Rejection body served by the HTTP services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}
