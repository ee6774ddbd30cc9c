//! Database-specific error types and conversions.

use agencydesk_core::error::BrokerError;

/// Markers embedded in `THROW` messages of guarded statements. They let
/// a failed statement be mapped back onto the error taxonomy.
pub(crate) const THROW_NOT_FOUND: &str = "[not_found]";
pub(crate) const THROW_INVALID: &str = "[invalid]";
pub(crate) const THROW_DENIED: &str = "[denied]";
pub(crate) const THROW_CONFLICT: &str = "[conflict]";

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Could not decode stored {entity}: {reason}")]
    Decode { entity: &'static str, reason: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid reference: {0}")]
    Invalid(String),

    #[error("Denied: {0}")]
    Denied(String),
}

impl DbError {
    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub(crate) fn decode(entity: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            entity,
            reason: reason.to_string(),
        }
    }

    /// Classify the error of a statement that failed `check()`.
    ///
    /// Guarded statements `THROW` a marker naming the failed
    /// precondition; unique-index violations become conflicts; anything
    /// else is a plain query failure.
    pub(crate) fn from_statement(err: surrealdb::Error, entity: &str, id: impl ToString) -> Self {
        let message = err.to_string();
        if let Some(reason) = thrown(&message, THROW_NOT_FOUND) {
            tracing::debug!(entity, %reason, "guarded statement rejected");
            // The thrown reason names the missing record when there is one.
            let entity = if reason.is_empty() { entity } else { reason.as_str() };
            return Self::not_found(entity, id);
        }
        if let Some(reason) = thrown(&message, THROW_INVALID) {
            return Self::Invalid(reason);
        }
        if let Some(reason) = thrown(&message, THROW_DENIED) {
            return Self::Denied(reason);
        }
        if let Some(reason) = thrown(&message, THROW_CONFLICT) {
            return Self::Conflict(reason);
        }
        if message.contains("already contains") {
            return Self::Conflict(format!("{entity} already exists"));
        }
        Self::Query(message)
    }

    /// Classify a failed transaction. Every statement of a cancelled
    /// transaction reports an error; the one carrying a marker or an
    /// index violation is the cause.
    pub(crate) fn from_transaction(
        errors: impl IntoIterator<Item = (usize, surrealdb::Error)>,
        entity: &str,
        id: impl ToString,
    ) -> Option<Self> {
        let id = id.to_string();
        let mut errors: Vec<_> = errors.into_iter().collect();
        errors.sort_by_key(|(index, _)| *index);

        let mut fallback = None;
        for (_, err) in errors {
            match Self::from_statement(err, entity, &id) {
                Self::Query(message) => {
                    fallback.get_or_insert(Self::Query(message));
                }
                classified => return Some(classified),
            }
        }
        fallback
    }
}

fn thrown(message: &str, marker: &str) -> Option<String> {
    let start = message.find(marker)? + marker.len();
    let reason = message[start..]
        .trim()
        .trim_end_matches(['"', '\'', '`'])
        .to_string();
    Some(reason)
}

impl From<DbError> for BrokerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => BrokerError::NotFound { entity, id },
            DbError::Conflict(message) => BrokerError::Conflict { message },
            DbError::Invalid(message) => BrokerError::Validation { message },
            DbError::Denied(reason) => BrokerError::Forbidden { reason },
            other => BrokerError::Database(other.to_string()),
        }
    }
}
