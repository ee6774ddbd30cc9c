//! Authentication service: login, logout, bearer verification and
//! password reset.

use agencydesk_core::error::{BrokerError, BrokerResult};
use agencydesk_core::models::role::Role;
use agencydesk_core::models::session::{CreatePasswordReset, CreateSession};
use agencydesk_core::models::user::User;
use agencydesk_core::repository::{PasswordResetRepository, SessionRepository, UserRepository};
use chrono::{Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    /// Signed bearer token.
    pub token: String,
    /// The authenticated identity.
    pub user: User,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Result of a verified bearer token with a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential {
    pub user_id: Uuid,
    pub role: Role,
}

/// A freshly issued reset token. Delivering it is the caller's concern.
#[derive(Debug)]
pub struct ResetIssued {
    pub user_id: Uuid,
    pub token: String,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U, S, R> {
    user_repo: U,
    session_repo: S,
    reset_repo: R,
    config: AuthConfig,
}

impl<U, S, R> AuthService<U, S, R>
where
    U: UserRepository,
    S: SessionRepository,
    R: PasswordResetRepository,
{
    pub fn new(user_repo: U, session_repo: S, reset_repo: R, config: AuthConfig) -> Self {
        Self {
            user_repo,
            session_repo,
            reset_repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Check email and password, record a session and issue a token.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, input: LoginInput) -> BrokerResult<LoginOutput> {
        let user = match self.user_repo.get_by_email(&input.email).await {
            Ok(user) => user,
            Err(BrokerError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            debug!(user_id = %user.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = token::issue_access_token(user.id, user.role, &self.config)?;
        let lifetime = self.config.access_token_lifetime_secs;
        self.session_repo
            .create(CreateSession {
                user_id: user.id,
                token_hash: token::hash_token(&token),
                expires_at: Utc::now() + Duration::seconds(lifetime as i64),
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok(LoginOutput {
            token,
            user,
            expires_in: lifetime,
        })
    }

    /// Verify a bearer token: signature, expiry, purpose, and that its
    /// session has not been ended by logout.
    pub async fn verify(&self, bearer: &str) -> BrokerResult<Credential> {
        let (user_id, role) = token::validate_access_token(bearer, &self.config)?;

        match self
            .session_repo
            .get_by_token_hash(&token::hash_token(bearer))
            .await
        {
            Ok(session) if session.user_id == user_id => Ok(Credential { user_id, role }),
            Ok(_) | Err(BrokerError::NotFound { .. }) => {
                Err(AuthError::TokenInvalid("session has ended".into()).into())
            }
            Err(e) => Err(e),
        }
    }

    /// End the session behind `bearer`.
    pub async fn logout(&self, bearer: &str) -> BrokerResult<()> {
        self.session_repo
            .delete_by_token_hash(&token::hash_token(bearer))
            .await?;
        info!("session ended");
        Ok(())
    }

    /// Drop sessions whose lifetime has passed. Returns how many went.
    pub async fn purge_expired_sessions(&self) -> BrokerResult<u64> {
        let purged = self.session_repo.delete_expired().await?;
        if purged > 0 {
            info!(purged, "expired sessions removed");
        }
        Ok(purged)
    }

    /// Issue a single-use reset token for the identity with `email`.
    pub async fn request_password_reset(&self, email: &str) -> BrokerResult<ResetIssued> {
        let user = self.user_repo.get_by_email(email).await?;

        let token = token::issue_reset_token(user.id, &self.config)?;
        let lifetime = self.config.reset_token_lifetime_secs;
        self.reset_repo
            .create(CreatePasswordReset {
                user_id: user.id,
                token_hash: token::hash_token(&token),
                expires_at: Utc::now() + Duration::seconds(lifetime as i64),
            })
            .await?;

        info!(user_id = %user.id, "password reset issued");
        Ok(ResetIssued {
            user_id: user.id,
            token,
        })
    }

    /// Redeem a reset token and store the new password.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: String,
    ) -> BrokerResult<()> {
        let user_id = token::validate_reset_token(reset_token, &self.config)?;
        // Checked before the token is consumed so a rejected password
        // leaves it usable.
        password::ensure_password_policy(&new_password, self.config.min_password_length)?;

        let record = match self
            .reset_repo
            .consume(&token::hash_token(reset_token))
            .await
        {
            Ok(record) => record,
            Err(BrokerError::NotFound { .. }) => {
                return Err(AuthError::TokenInvalid("reset token already used".into()).into());
            }
            Err(e) => return Err(e),
        };
        if record.user_id != user_id {
            return Err(AuthError::TokenInvalid("reset token subject mismatch".into()).into());
        }

        self.user_repo.set_password(user_id, new_password).await?;
        info!(user_id = %user_id, "password reset completed");
        Ok(())
    }
}
