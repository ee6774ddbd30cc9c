//! Read-only catalogue handlers: providers and coverages.

use agencydesk_core::models::provider::{Coverage, Provider};
use agencydesk_core::repository::PaginatedResult;
use axum::Json;
use axum::extract::State;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{ApiPath, ApiQuery, PageQuery};
use crate::middleware::Authenticated;
use crate::state::AppState;

pub async fn list_providers(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Provider>>> {
    let providers = state
        .catalog
        .list_providers(&caller, page.pagination())
        .await?;
    Ok(Json(providers))
}

pub async fn get_provider(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Provider>> {
    Ok(Json(state.catalog.get_provider(&caller, id).await?))
}

pub async fn list_coverages(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Coverage>>> {
    let coverages = state
        .catalog
        .list_coverages(&caller, page.pagination())
        .await?;
    Ok(Json(coverages))
}
