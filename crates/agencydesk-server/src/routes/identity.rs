//! Identity handlers.
//!
//! The generic `/users` handlers take the role from the payload or the
//! query. The `/agents` and `/customers` collections pin it: an id that
//! resolves to an identity of another role is reported as not found.

use agencydesk_core::authz::Caller;
use agencydesk_core::error::BrokerError;
use agencydesk_core::models::role::Role;
use agencydesk_core::models::user::{NewIdentity, UpdateUser, User};
use agencydesk_core::repository::{PaginatedResult, Pagination};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::auth::message;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery, PageQuery};
use crate::middleware::Authenticated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateIdentityRequest {
    pub role: Role,
    /// Target agency; only MasterAdmins choose it.
    pub agency_id: Option<Uuid>,
    #[serde(flatten)]
    pub identity: NewIdentity,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub role: Option<Role>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl UsersQuery {
    pub fn pagination(&self) -> Pagination {
        PageQuery {
            offset: self.offset,
            limit: self.limit,
        }
        .pagination()
    }
}

pub async fn me(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<Json<User>> {
    Ok(Json(state.identities.me(&caller).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.identities.get(&caller, id).await?))
}

pub async fn list_users(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(query): ApiQuery<UsersQuery>,
) -> ApiResult<Json<PaginatedResult<User>>> {
    let users = state
        .identities
        .list(&caller, query.role, query.pagination())
        .await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<CreateIdentityRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state
        .identities
        .create(&caller, body.role, body.agency_id, body.identity)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateUser>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.identities.update(&caller, id, body).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    state.identities.delete(&caller, id).await?;
    Ok(message("user deleted"))
}

// -- role-pinned collections --------------------------------------------------

async fn of_role(state: &AppState, caller: &Caller, id: Uuid, role: Role) -> ApiResult<User> {
    let user = state.identities.get(caller, id).await?;
    if user.role != role {
        return Err(ApiError(BrokerError::not_found("user", id)));
    }
    Ok(user)
}

async fn list_role(
    state: &AppState,
    caller: &Caller,
    role: Role,
    page: &PageQuery,
) -> ApiResult<Json<PaginatedResult<User>>> {
    let users = state
        .identities
        .list(caller, Some(role), page.pagination())
        .await?;
    Ok(Json(users))
}

async fn create_role(
    state: &AppState,
    caller: &Caller,
    role: Role,
    identity: NewIdentity,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.identities.create(caller, role, None, identity).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_role(
    state: &AppState,
    caller: &Caller,
    id: Uuid,
    role: Role,
    body: UpdateUser,
) -> ApiResult<Json<User>> {
    of_role(state, caller, id, role).await?;
    Ok(Json(state.identities.update(caller, id, body).await?))
}

async fn delete_role(
    state: &AppState,
    caller: &Caller,
    id: Uuid,
    role: Role,
) -> ApiResult<Json<Value>> {
    of_role(state, caller, id, role).await?;
    state.identities.delete(caller, id).await?;
    Ok(message("user deleted"))
}

pub async fn list_agents(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<PaginatedResult<User>>> {
    list_role(&state, &caller, Role::Agent, &page).await
}

pub async fn create_agent(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<NewIdentity>,
) -> ApiResult<(StatusCode, Json<User>)> {
    create_role(&state, &caller, Role::Agent, body).await
}

pub async fn get_agent(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(of_role(&state, &caller, id, Role::Agent).await?))
}

pub async fn update_agent(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateUser>,
) -> ApiResult<Json<User>> {
    update_role(&state, &caller, id, Role::Agent, body).await
}

pub async fn delete_agent(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    delete_role(&state, &caller, id, Role::Agent).await
}

pub async fn list_customers(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<PaginatedResult<User>>> {
    list_role(&state, &caller, Role::Customer, &page).await
}

pub async fn create_customer(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<NewIdentity>,
) -> ApiResult<(StatusCode, Json<User>)> {
    create_role(&state, &caller, Role::Customer, body).await
}

pub async fn get_customer(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(of_role(&state, &caller, id, Role::Customer).await?))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateUser>,
) -> ApiResult<Json<User>> {
    update_role(&state, &caller, id, Role::Customer, body).await
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    delete_role(&state, &caller, id, Role::Customer).await
}
