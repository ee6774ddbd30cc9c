//! Server configuration from command-line flags and the environment.

use std::net::SocketAddr;

use agencydesk_auth::AuthConfig;
use agencydesk_core::models::user::DEFAULT_MIN_PASSWORD_LENGTH;
use agencydesk_db::DbConfig;
use clap::Parser;

/// agencydesk brokerage back office.
///
/// Every flag can also be supplied through the environment variable
/// named next to it.
#[derive(Debug, Clone, Parser)]
#[command(name = "agencydesk", version, about)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[arg(long, env = "AGENCYDESK_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// SurrealDB endpoint (`ws://host:port`, or `mem://` for an
    /// in-process store).
    #[arg(long, env = "AGENCYDESK_DB_URL", default_value = "ws://127.0.0.1:8000")]
    pub db_url: String,

    #[arg(long, env = "AGENCYDESK_DB_NAMESPACE", default_value = "agencydesk")]
    pub db_namespace: String,

    #[arg(long, env = "AGENCYDESK_DB_DATABASE", default_value = "main")]
    pub db_database: String,

    #[arg(long, env = "AGENCYDESK_DB_USER", default_value = "root")]
    pub db_user: String,

    #[arg(
        long,
        env = "AGENCYDESK_DB_PASSWORD",
        default_value = "root",
        hide_env_values = true
    )]
    pub db_password: String,

    /// HS256 signing secret for bearer tokens.
    #[arg(long, env = "AGENCYDESK_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "AGENCYDESK_JWT_ISSUER", default_value = "agencydesk")]
    pub jwt_issuer: String,

    /// Optional server-side pepper mixed into password hashes.
    #[arg(long, env = "AGENCYDESK_PASSWORD_PEPPER", hide_env_values = true)]
    pub password_pepper: Option<String>,

    /// Shortest password accepted on identity creation and reset.
    #[arg(
        long,
        env = "AGENCYDESK_MIN_PASSWORD_LENGTH",
        default_value_t = DEFAULT_MIN_PASSWORD_LENGTH
    )]
    pub min_password_length: usize,

    /// Email of the MasterAdmin created when none exists.
    #[arg(long, env = "ADMIN_EMAIL", default_value = "admin@agencydesk.local")]
    pub admin_email: String,

    /// Password of the seeded MasterAdmin. Without it no seeding happens.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    #[arg(long, env = "ADMIN_FIRST_NAME", default_value = "Master")]
    pub admin_first_name: String,

    #[arg(long, env = "ADMIN_LAST_NAME", default_value = "Admin")]
    pub admin_last_name: String,
}

/// Identity of the MasterAdmin created on an empty store.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl ServerConfig {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_user.clone(),
            password: self.db_password.clone(),
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            jwt_issuer: self.jwt_issuer.clone(),
            pepper: self.password_pepper.clone(),
            min_password_length: self.min_password_length,
            ..AuthConfig::default()
        }
    }

    pub fn admin_seed(&self) -> Option<AdminSeed> {
        let password = self.admin_password.clone()?;
        Some(AdminSeed {
            email: self.admin_email.clone(),
            password,
            first_name: self.admin_first_name.clone(),
            last_name: self.admin_last_name.clone(),
        })
    }
}
