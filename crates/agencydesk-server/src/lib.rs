//! agencydesk HTTP server: configuration, the axum router and the
//! glue that turns bearer tokens into tenant-scoped callers.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{AdminSeed, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
