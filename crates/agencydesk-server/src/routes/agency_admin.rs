//! `/api/agency-admin`: locations, agents and identities inside the
//! caller's own agency.

use agencydesk_core::models::agency::{CreateLocation, Location, UpdateLocation};
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
        .route("/locations", get(list_locations).post(create_location))
        .route(
            "/locations/{id}",
            get(get_location)
                .put(update_location)
                .delete(delete_location),
        )
        .route(
            "/agents",
            get(identity::list_agents).post(identity::create_agent),
        )
        .route(
            "/agents/{id}",
            get(identity::get_agent)
                .put(identity::update_agent)
                .delete(identity::delete_agent),
        )
        .route(
            "/users",
            get(identity::list_users).post(identity::create_user),
        )
        .route("/users/{id}", put(identity::update_user))
        .route("/providers", get(catalog::list_providers))
}

async fn list_locations(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Location>>> {
    let locations = state
        .organizations
        .list_locations(&caller, page.pagination())
        .await?;
    Ok(Json(locations))
}

async fn create_location(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<CreateLocation>,
) -> ApiResult<(StatusCode, Json<Location>)> {
    let location = state.organizations.create_location(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

async fn get_location(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Location>> {
    Ok(Json(state.organizations.get_location(&caller, id).await?))
}

async fn update_location(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateLocation>,
) -> ApiResult<Json<Location>> {
    Ok(Json(
        state.organizations.update_location(&caller, id, body).await?,
    ))
}

async fn delete_location(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    state.organizations.delete_location(&caller, id).await?;
    Ok(message("location deleted"))
}
