//! Error types for the agencydesk system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Authentication failed: {reason}")]
    Unauthenticated { reason: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// The record is absent *or* belongs to another agency. The two
    /// causes are never distinguished so existence does not leak
    /// across tenants.
    #[error("{entity} not found or access denied")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrokerError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

pub type BrokerResult<T> = Result<T, BrokerError>;
