//! Aggregate reports.

use agencydesk_core::models::report::{AgentReport, PolicyReport, QuoteReport};
use axum::Json;
use axum::extract::State;

use crate::error::ApiResult;
use crate::middleware::Authenticated;
use crate::state::AppState;

pub async fn quote_report(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<QuoteReport>> {
    Ok(Json(state.reports.quotes(&caller).await?))
}

pub async fn policy_report(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<PolicyReport>> {
    Ok(Json(state.reports.policies(&caller).await?))
}

pub async fn agent_report(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<AgentReport>> {
    Ok(Json(state.reports.agent_summary(&caller).await?))
}
