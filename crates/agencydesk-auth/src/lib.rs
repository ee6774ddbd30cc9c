//! agencydesk auth: password verification, HS256 bearer tokens, login
//! sessions and password reset.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, Credential, LoginInput, LoginOutput, ResetIssued};
pub use token::TokenClaims;
