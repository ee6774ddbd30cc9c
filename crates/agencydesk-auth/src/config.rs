//! Authentication configuration.

use agencydesk_core::models::user::DEFAULT_MIN_PASSWORD_LENGTH;

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret. Injected at startup, never a process global.
    pub jwt_secret: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Access token and session lifetime in seconds (default: 86_400 = 24 hours).
    pub access_token_lifetime_secs: u64,
    /// Password-reset token lifetime in seconds (default: 3_600 = 1 hour).
    pub reset_token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id verification.
    pub pepper: Option<String>,
    /// Minimum password length accepted on reset and identity creation.
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "agencydesk".into(),
            access_token_lifetime_secs: 86_400,
            reset_token_lifetime_secs: 3_600,
            pepper: None,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}
