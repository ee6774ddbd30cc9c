//! Authentication and role-group guards.
//!
//! [`authenticate`] turns the bearer token into a [`Caller`] (via the
//! credential verifier and the tenant resolver) and stores it in the
//! request extensions. [`require_roles`] then rejects callers outside a
//! route group with 403. Finer rules live in the workflow services.

use agencydesk_core::authz::Caller;
use agencydesk_core::error::BrokerError;
use agencydesk_core::models::role::Role;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// The raw bearer token of the current request, kept for logout.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

fn unauthenticated(reason: &str) -> ApiError {
    ApiError(BrokerError::Unauthenticated {
        reason: reason.into(),
    })
}

fn bearer(request: &Request) -> Result<String, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthenticated("missing bearer token"))?;
    let value = header
        .to_str()
        .map_err(|_| unauthenticated("malformed authorization header"))?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(token.trim().to_string())
        }
        _ => Err(unauthenticated("expected a bearer token")),
    }
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer(&request)?;
    let credential = state.auth.verify(&token).await?;
    let caller = state
        .tenants
        .caller(credential.user_id, credential.role)
        .await?;

    request.extensions_mut().insert(caller);
    request.extensions_mut().insert(BearerToken(token));
    Ok(next.run(request).await)
}

/// Admit only callers whose role is in `roles`.
pub async fn require_roles(
    State(roles): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = request
        .extensions()
        .get::<Caller>()
        .copied()
        .ok_or_else(|| unauthenticated("missing caller"))?;
    if !roles.contains(&caller.role) {
        debug!(
            caller = %caller.user_id,
            role = %caller.role,
            "route group denied"
        );
        return Err(ApiError(BrokerError::forbidden(format!(
            "{} may not use this endpoint",
            caller.role
        ))));
    }
    Ok(next.run(request).await)
}

/// Extractor for the authenticated caller.
pub struct Authenticated(pub Caller);

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .copied()
            .map(Authenticated)
            .ok_or_else(|| unauthenticated("missing caller"))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<BearerToken>()
            .cloned()
            .ok_or_else(|| unauthenticated("missing bearer token"))
    }
}
