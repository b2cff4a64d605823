use thiserror::Error;

use crate::database::manager::DatabaseError;

/// Errors raised by the restricted-admin engine
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unknown tab: {0}")]
    UnknownTab(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ComplianceError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        ComplianceError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ComplianceError::NotFound(message.into())
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        ComplianceError::InvalidPayload(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ComplianceError::NotFound(_))
    }
}

impl From<sqlx::Error> for ComplianceError {
    fn from(err: sqlx::Error) -> Self {
        ComplianceError::Database(DatabaseError::Sqlx(err))
    }
}
