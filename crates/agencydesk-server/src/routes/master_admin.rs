//! `/api/master-admin`: agencies, providers, grants, identities and
//! coverages across every tenant.

use agencydesk_core::models::agency::{Agency, CreateAgency, UpdateAgency};
use agencydesk_core::models::provider::{
    Coverage, CreateCoverage, CreateProvider, Provider, ProviderGrant, UpdateProvider,
};
use agencydesk_core::repository::PaginatedResult;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::Value;
use uuid::Uuid;

use super::auth::message;
use super::{catalog, identity};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, PageQuery};
use crate::middleware::Authenticated;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/agencies", get(list_agencies).post(create_agency))
        .route(
            "/agencies/{id}",
            get(get_agency).put(update_agency).delete(delete_agency),
        )
        .route("/agencies/{id}/providers", get(granted_providers))
        .route(
            "/agencies/{id}/providers/{provider_id}",
            put(grant_provider).delete(revoke_provider),
        )
        .route(
            "/providers",
            get(catalog::list_providers).post(create_provider),
        )
        .route(
            "/providers/{id}",
            get(catalog::get_provider)
                .put(update_provider)
                .delete(delete_provider),
        )
        .route(
            "/users",
            get(identity::list_users).post(identity::create_user),
        )
        .route(
            "/users/{id}",
            get(identity::get_user)
                .put(identity::update_user)
                .delete(identity::delete_user),
        )
        .route(
            "/coverages",
            get(catalog::list_coverages).post(create_coverage),
        )
}

// -- agencies ---------------------------------------------------------------

async fn list_agencies(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Agency>>> {
    let agencies = state
        .organizations
        .list_agencies(&caller, page.pagination())
        .await?;
    Ok(Json(agencies))
}

async fn create_agency(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<CreateAgency>,
) -> ApiResult<(StatusCode, Json<Agency>)> {
    let agency = state.organizations.create_agency(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(agency)))
}

async fn get_agency(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Agency>> {
    Ok(Json(state.organizations.get_agency(&caller, id).await?))
}

async fn update_agency(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateAgency>,
) -> ApiResult<Json<Agency>> {
    Ok(Json(
        state.organizations.update_agency(&caller, id, body).await?,
    ))
}

async fn delete_agency(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    state.organizations.delete_agency(&caller, id).await?;
    Ok(message("agency deleted"))
}

// -- grants -----------------------------------------------------------------

async fn granted_providers(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(agency_id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Provider>>> {
    let providers = state
        .catalog
        .granted_to(&caller, agency_id, page.pagination())
        .await?;
    Ok(Json(providers))
}

async fn grant_provider(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath((agency_id, provider_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<ProviderGrant>> {
    let grant = state.catalog.grant(&caller, agency_id, provider_id).await?;
    Ok(Json(grant))
}

async fn revoke_provider(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath((agency_id, provider_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    state.catalog.revoke(&caller, agency_id, provider_id).await?;
    Ok(message("provider access revoked"))
}

// -- providers --------------------------------------------------------------

async fn create_provider(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<CreateProvider>,
) -> ApiResult<(StatusCode, Json<Provider>)> {
    let provider = state.catalog.create_provider(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(provider)))
}

async fn update_provider(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateProvider>,
) -> ApiResult<Json<Provider>> {
    Ok(Json(state.catalog.update_provider(&caller, id, body).await?))
}

async fn delete_provider(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    state.catalog.delete_provider(&caller, id).await?;
    Ok(message("provider deleted"))
}

// -- coverages --------------------------------------------------------------

async fn create_coverage(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<CreateCoverage>,
) -> ApiResult<(StatusCode, Json<Coverage>)> {
    let coverage = state.catalog.create_coverage(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(coverage)))
}
