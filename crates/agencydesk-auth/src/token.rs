//! HS256 bearer tokens.
//!
//! Access tokens carry the identity's role. Password-reset tokens are
//! signed with the same key but carry the [`RESET_ROLE`] marker instead,
//! and each validator accepts only its own kind.

use agencydesk_core::models::role::Role;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Role claim value of password-reset tokens. Never a real [`Role`].
pub const RESET_ROLE: &str = "reset";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: identity ID (UUID string).
    pub sub: String,
    /// Role name, or [`RESET_ROLE`].
    pub role: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token ID, so two tokens issued in the same second differ.
    pub jti: String,
}

impl TokenClaims {
    pub fn subject(&self) -> Result<Uuid, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::TokenInvalid("malformed subject".into()))
    }
}

fn sign(
    sub: Uuid,
    role: &str,
    lifetime_secs: u64,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    if config.jwt_secret.is_empty() {
        return Err(AuthError::Crypto("signing secret is not configured".into()));
    }

    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: sub.to_string(),
        role: role.to_string(),
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + lifetime_secs as i64,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Issue an access token valid for the configured session lifetime.
pub fn issue_access_token(
    user_id: Uuid,
    role: Role,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    sign(user_id, role.as_str(), config.access_token_lifetime_secs, config)
}

/// Issue a password-reset token for `user_id`.
pub fn issue_reset_token(user_id: Uuid, config: &AuthConfig) -> Result<String, AuthError> {
    sign(user_id, RESET_ROLE, config.reset_token_lifetime_secs, config)
}

/// Verify signature, issuer and expiry without looking at the role.
pub fn decode_token(token: &str, config: &AuthConfig) -> Result<TokenClaims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
    validation.leeway = 0;

    jsonwebtoken::decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Validate an access token and return its subject and role.
/// Reset tokens are refused.
pub fn validate_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<(Uuid, Role), AuthError> {
    let claims = decode_token(token, config)?;
    if claims.role == RESET_ROLE {
        return Err(AuthError::WrongTokenPurpose);
    }
    let role = claims
        .role
        .parse::<Role>()
        .map_err(|_| AuthError::TokenInvalid("unknown role".into()))?;
    Ok((claims.subject()?, role))
}

/// Validate a reset token and return its subject. Access tokens are
/// refused.
pub fn validate_reset_token(token: &str, config: &AuthConfig) -> Result<Uuid, AuthError> {
    let claims = decode_token(token, config)?;
    if claims.role != RESET_ROLE {
        return Err(AuthError::WrongTokenPurpose);
    }
    claims.subject()
}

/// SHA-256 of a raw token, hex-encoded. Stored instead of the token.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
