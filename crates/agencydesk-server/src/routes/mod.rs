//! HTTP routes.
//!
//! Each role group is nested under `/api/<group>` and guarded twice:
//! [`authenticate`] rejects a missing or invalid bearer token with 401,
//! then [`require_roles`] rejects callers outside the group with 403.

pub mod agency_admin;
pub mod agent;
pub mod auth;
pub mod catalog;
pub mod identity;
pub mod master_admin;
pub mod report;

use agencydesk_core::models::role::Role;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::middleware::{authenticate, require_roles};
use crate::state::AppState;

const MASTER: &[Role] = &[Role::MasterAdmin];
const AGENCY_ADMINS: &[Role] = &[Role::AgencyAdmin, Role::LocationAdmin];
const AGENTS: &[Role] = &[Role::Agent];

/// Routes every role group carries.
fn shared() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/profiles/users", get(identity::list_users))
        .route("/profiles/user/{id}", get(identity::get_user))
        .route("/reports/quotes", get(report::quote_report))
        .route("/reports/policies", get(report::policy_report))
}

fn group(state: &AppState, routes: Router<AppState>, roles: &'static [Role]) -> Router<AppState> {
    routes
        .merge(shared())
        .route_layer(from_fn_with_state(roles, require_roles))
        .route_layer(from_fn_with_state(state.clone(), authenticate))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    let profile = Router::new()
        .route("/me", get(identity::me))
        .route("/user/{id}", get(identity::get_user))
        .route("/users", get(identity::list_users))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/reset-password", post(auth::request_reset))
        .route("/api/auth/reset-password/{token}", put(auth::reset_password))
        .nest(
            "/api/master-admin",
            group(&state, master_admin::routes(), MASTER),
        )
        .nest(
            "/api/agency-admin",
            group(&state, agency_admin::routes(), AGENCY_ADMINS),
        )
        .nest("/api/agent", group(&state, agent::routes(), AGENTS))
        .nest("/api/profile", profile)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
