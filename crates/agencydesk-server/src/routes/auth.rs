//! Login, logout and password reset.

use agencydesk_auth::LoginInput;
use agencydesk_core::models::user::User;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::BearerToken;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub profile: User,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NewPasswordRequest {
    #[serde(rename = "newPassword", alias = "new_password")]
    pub new_password: String,
}

pub(crate) fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let output = state
        .auth
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(Json(LoginResponse {
        token: output.token,
        expires_in: output.expires_in,
        profile: output.user,
    }))
}

/// Issue a reset token. Delivering it (mail, SMS) happens elsewhere.
pub async fn request_reset(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetRequest>,
) -> ApiResult<Json<Value>> {
    state.auth.request_password_reset(&body.email).await?;
    Ok(message("password reset issued"))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
    ApiJson(body): ApiJson<NewPasswordRequest>,
) -> ApiResult<Json<Value>> {
    state
        .auth
        .reset_password(&token, body.new_password)
        .await?;
    Ok(message("password updated"))
}

pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<Value>> {
    state.auth.logout(&token).await?;
    Ok(message("logged out"))
}
