//! SurrealDB implementations of [`SessionRepository`] and
//! [`PasswordResetRepository`]. Only token hashes are ever stored.

use agencydesk_core::error::BrokerResult;
use agencydesk_core::models::session::{
    CreatePasswordReset, CreateSession, PasswordReset, Session,
};
use agencydesk_core::repository::{PasswordResetRepository, SessionRepository};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{count, parse_id};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    record_id: String,
    user_id: String,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session, DbError> {
        Ok(Session {
            id: parse_id("session", &self.record_id)?,
            user_id: parse_id("session", &self.user_id)?,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ResetRow {
    record_id: String,
    user_id: String,
    token_hash: String,
    used: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl ResetRow {
    fn try_into_reset(self) -> Result<PasswordReset, DbError> {
        Ok(PasswordReset {
            id: parse_id("password reset", &self.record_id)?,
            user_id: parse_id("password reset", &self.user_id)?,
            token_hash: self.token_hash,
            used: self.used,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> BrokerResult<Session> {
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 user_id = $user_id, \
                 token_hash = $token_hash, \
                 expires_at = $expires_at \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "session", &id_str))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("session", &id_str))?;

        Ok(row.try_into_session()?)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> BrokerResult<Session> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE token_hash = $token_hash AND expires_at > time::now()",
            )
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("session", "token"))?;

        Ok(row.try_into_session()?)
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> BrokerResult<()> {
        self.db
            .query("DELETE session WHERE token_hash = $token_hash")
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete_expired(&self) -> BrokerResult<u64> {
        // Count expired sessions first, then delete.
        let total = count(&self.db, "session", "expires_at < time::now()", Vec::new()).await?;

        self.db
            .query("DELETE session WHERE expires_at < time::now()")
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}

/// SurrealDB implementation of the PasswordReset repository.
#[derive(Clone)]
pub struct SurrealPasswordResetRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPasswordResetRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PasswordResetRepository for SurrealPasswordResetRepository<C> {
    async fn create(&self, input: CreatePasswordReset) -> BrokerResult<PasswordReset> {
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('password_reset', $id) SET \
                 user_id = $user_id, token_hash = $token_hash, \
                 used = false, expires_at = $expires_at \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "password reset", &id_str))?;

        let rows: Vec<ResetRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("password reset", &id_str))?;

        Ok(row.try_into_reset()?)
    }

    async fn consume(&self, token_hash: &str) -> BrokerResult<PasswordReset> {
        // Single conditional update: two concurrent consumers cannot both
        // see the record unused.
        let mut result = self
            .db
            .query(
                "UPDATE password_reset SET used = true \
                 WHERE token_hash = $token_hash AND used = false \
                 AND expires_at > time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResetRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("password reset", "token"))?;

        Ok(row.try_into_reset()?)
    }
}
