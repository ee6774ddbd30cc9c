//! Authentication error types.

use agencydesk_core::error::BrokerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("token was not issued for this purpose")]
    WrongTokenPurpose,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for BrokerError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Crypto(msg) => BrokerError::Crypto(msg),
            other => BrokerError::Unauthenticated {
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_are_unauthenticated() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::TokenExpired,
            AuthError::TokenInvalid("bad signature".into()),
            AuthError::WrongTokenPurpose,
        ] {
            assert!(matches!(
                BrokerError::from(err),
                BrokerError::Unauthenticated { .. }
            ));
        }
    }

    #[test]
    fn crypto_failure_is_not_an_auth_failure() {
        let err = BrokerError::from(AuthError::Crypto("bad key".into()));
        assert!(matches!(err, BrokerError::Crypto(_)));
    }
}
