//! `/api/agent`: customers, their vehicles and histories, quotes and
//! policies. Everything is confined to the caller's agency, and quotes
//! to the caller's own book.

use agencydesk_core::models::policy::{BindQuote, Policy};
use agencydesk_core::models::quote::{
    CreateLineItem, CreateQuote, Quote, QuoteLineItem, UpdateQuote,
};
use agencydesk_core::models::vehicle::{
    AddDrivingHistory, AddInsuranceHistory, AssignDriver, CreateVehicle, DrivingHistory,
    InsuranceHistory, UpdateVehicle, Vehicle, VehicleDriver,
};
use agencydesk_core::repository::{PaginatedResult, Pagination};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::{catalog, identity, report};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, PageQuery};
use crate::middleware::Authenticated;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/customers",
            get(identity::list_customers).post(identity::create_customer),
        )
        .route(
            "/customers/{id}",
            get(identity::get_customer)
                .put(identity::update_customer)
                .delete(identity::delete_customer),
        )
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/{id}", get(get_vehicle).put(update_vehicle))
        .route("/drivers", get(list_drivers).post(assign_driver))
        .route(
            "/driving-history",
            get(list_driving_history).post(add_driving_history),
        )
        .route(
            "/insurance-history",
            get(list_insurance_history).post(add_insurance_history),
        )
        .route("/quotes", get(list_quotes).post(create_quote))
        .route("/quotes/{id}", get(get_quote).put(update_quote))
        .route(
            "/quotes/{id}/line-items",
            get(quote_line_items).post(add_line_item),
        )
        .route("/quotes/{id}/policy", get(quote_policy))
        .route(
            "/quote-line-items",
            get(list_line_items).post(add_line_item_to_quote),
        )
        .route("/providers", get(catalog::list_providers))
        .route("/providers/{id}", get(catalog::get_provider))
        .route("/coverages", get(catalog::list_coverages))
        .route("/policies", get(list_policies).post(bind_quote))
        .route("/policies/{id}", get(get_policy))
        .route("/reports", get(report::agent_report))
}

fn page(offset: Option<u64>, limit: Option<u64>) -> Pagination {
    PageQuery { offset, limit }.pagination()
}

#[derive(Debug, Default, Deserialize)]
struct VehiclesQuery {
    customer_id: Option<Uuid>,
    offset: Option<u64>,
    limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DriversQuery {
    vehicle_id: Option<Uuid>,
    offset: Option<u64>,
    limit: Option<u64>,
}

/// Driving and insurance history are both keyed by the driver.
#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    user_id: Option<Uuid>,
    offset: Option<u64>,
    limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LineItemsQuery {
    quote_id: Option<Uuid>,
    offset: Option<u64>,
    limit: Option<u64>,
}

/// Line item body for the flat collection; names its quote inline.
#[derive(Debug, Deserialize)]
struct QuoteLineItemBody {
    quote_id: Uuid,
    #[serde(flatten)]
    item: CreateLineItem,
}

// -- vehicles ---------------------------------------------------------------

async fn list_vehicles(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(query): ApiQuery<VehiclesQuery>,
) -> ApiResult<Json<PaginatedResult<Vehicle>>> {
    let vehicles = state
        .records
        .list_vehicles(&caller, query.customer_id, page(query.offset, query.limit))
        .await?;
    Ok(Json(vehicles))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<CreateVehicle>,
) -> ApiResult<(StatusCode, Json<Vehicle>)> {
    let vehicle = state.records.create_vehicle(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vehicle>> {
    Ok(Json(state.records.get_vehicle(&caller, id).await?))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateVehicle>,
) -> ApiResult<Json<Vehicle>> {
    Ok(Json(state.records.update_vehicle(&caller, id, body).await?))
}

// -- drivers and histories --------------------------------------------------

async fn list_drivers(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(query): ApiQuery<DriversQuery>,
) -> ApiResult<Json<PaginatedResult<VehicleDriver>>> {
    let drivers = state
        .records
        .list_drivers(&caller, query.vehicle_id, page(query.offset, query.limit))
        .await?;
    Ok(Json(drivers))
}

async fn assign_driver(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<AssignDriver>,
) -> ApiResult<(StatusCode, Json<VehicleDriver>)> {
    let driver = state.records.assign_driver(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

async fn list_driving_history(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<PaginatedResult<DrivingHistory>>> {
    let history = state
        .records
        .list_driving_history(&caller, query.user_id, page(query.offset, query.limit))
        .await?;
    Ok(Json(history))
}

async fn add_driving_history(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<AddDrivingHistory>,
) -> ApiResult<(StatusCode, Json<DrivingHistory>)> {
    let entry = state.records.add_driving_history(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn list_insurance_history(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<PaginatedResult<InsuranceHistory>>> {
    let history = state
        .records
        .list_insurance_history(&caller, query.user_id, page(query.offset, query.limit))
        .await?;
    Ok(Json(history))
}

async fn add_insurance_history(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<AddInsuranceHistory>,
) -> ApiResult<(StatusCode, Json<InsuranceHistory>)> {
    let entry = state.records.add_insurance_history(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// -- quotes -----------------------------------------------------------------

async fn list_quotes(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Quote>>> {
    Ok(Json(state.quotes.list(&caller, page.pagination()).await?))
}

async fn create_quote(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<CreateQuote>,
) -> ApiResult<(StatusCode, Json<Quote>)> {
    let quote = state.quotes.create(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

async fn get_quote(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Quote>> {
    Ok(Json(state.quotes.get(&caller, id).await?))
}

async fn update_quote(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateQuote>,
) -> ApiResult<Json<Quote>> {
    Ok(Json(state.quotes.update(&caller, id, body).await?))
}

async fn quote_line_items(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<PaginatedResult<QuoteLineItem>>> {
    let items = state
        .quotes
        .list_line_items(&caller, Some(id), page.pagination())
        .await?;
    Ok(Json(items))
}

async fn list_line_items(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(query): ApiQuery<LineItemsQuery>,
) -> ApiResult<Json<PaginatedResult<QuoteLineItem>>> {
    let items = state
        .quotes
        .list_line_items(&caller, query.quote_id, page(query.offset, query.limit))
        .await?;
    Ok(Json(items))
}

async fn add_line_item(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CreateLineItem>,
) -> ApiResult<(StatusCode, Json<QuoteLineItem>)> {
    let item = state.quotes.add_line_item(&caller, id, body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn add_line_item_to_quote(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<QuoteLineItemBody>,
) -> ApiResult<(StatusCode, Json<QuoteLineItem>)> {
    let item = state
        .quotes
        .add_line_item(&caller, body.quote_id, body.item)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// The policy a quote was bound into, or `null` while it is unbound.
async fn quote_policy(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Option<Policy>>> {
    Ok(Json(state.quotes.policy_for_quote(&caller, id).await?))
}

// -- policies ---------------------------------------------------------------

async fn list_policies(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Policy>>> {
    let policies = state
        .quotes
        .list_policies(&caller, page.pagination())
        .await?;
    Ok(Json(policies))
}

async fn bind_quote(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(body): ApiJson<BindQuote>,
) -> ApiResult<(StatusCode, Json<Policy>)> {
    let policy = state.quotes.bind(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(policy)))
}

async fn get_policy(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Policy>> {
    Ok(Json(state.quotes.get_policy(&caller, id).await?))
}
