//! Batch lifecycle HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{BatchEvent, CropBatch, InspectionReport, TransportLeg, TransportRequest};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::lifecycle::{
    CreateBatchInput, InspectionInput, ListingOutcome, SaleResult, SplitBatchInput, SplitOutcome,
    TransportOutcome,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RequestTransportBody {
    /// Receiving distributor or retailer profile
    pub to_party: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct MarginBody {
    pub margin: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ListBatchBody {
    pub retailer_margin: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct SellBatchBody {
    #[serde(default)]
    pub sold_quantity: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SuspendBatchBody {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveTransportQuery {
    pub leg: TransportLeg,
}

#[derive(Debug, Serialize)]
pub struct TransportFeesResponse {
    pub batch_id: Uuid,
    pub transport_fees_per_unit: Decimal,
}

/// Create a new batch
pub async fn create_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateBatchInput>,
) -> AppResult<(StatusCode, Json<CropBatch>)> {
    let actor = state.actor(&user).await?;
    let batch = state.lifecycle().create_batch(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

pub async fn get_batch(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<CropBatch>> {
    Ok(Json(state.lifecycle().get_batch(batch_id).await?))
}

/// Event history, newest first
pub async fn get_batch_history(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<Vec<BatchEvent>>> {
    Ok(Json(state.lifecycle().batch_history(batch_id).await?))
}

pub async fn list_batch_transports(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<Vec<TransportRequest>>> {
    Ok(Json(state.lifecycle().transport_requests(batch_id).await?))
}

/// Latest request for one leg, or null when the leg was never requested
pub async fn get_active_transport(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(batch_id): Path<Uuid>,
    Query(query): Query<ActiveTransportQuery>,
) -> AppResult<Json<Option<TransportRequest>>> {
    Ok(Json(
        state
            .lifecycle()
            .active_transport(batch_id, query.leg)
            .await?,
    ))
}

pub async fn get_transport_fees(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<TransportFeesResponse>> {
    let fees = state.lifecycle().transport_fees(batch_id).await?;
    Ok(Json(TransportFeesResponse {
        batch_id,
        transport_fees_per_unit: fees,
    }))
}

/// Request transport to a distributor or retailer
pub async fn request_transport(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(body): Json<RequestTransportBody>,
) -> AppResult<(StatusCode, Json<TransportOutcome>)> {
    let actor = state.actor(&user).await?;
    let outcome = state
        .lifecycle()
        .request_transport(&actor, batch_id, body.to_party)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Request transport from distributor storage to a retailer
pub async fn request_transport_to_retailer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(body): Json<RequestTransportBody>,
) -> AppResult<(StatusCode, Json<TransportOutcome>)> {
    let actor = state.actor(&user).await?;
    let outcome = state
        .lifecycle()
        .request_transport_to_retailer(&actor, batch_id, body.to_party)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn store_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<CropBatch>> {
    let actor = state.actor(&user).await?;
    Ok(Json(state.lifecycle().store_batch(&actor, batch_id).await?))
}

pub async fn set_distributor_margin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(body): Json<MarginBody>,
) -> AppResult<Json<CropBatch>> {
    let actor = state.actor(&user).await?;
    let batch = state
        .lifecycle()
        .set_distributor_margin(&actor, batch_id, body.margin)
        .await?;
    Ok(Json(batch))
}

pub async fn split_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<SplitBatchInput>,
) -> AppResult<(StatusCode, Json<SplitOutcome>)> {
    let actor = state.actor(&user).await?;
    let outcome = state.lifecycle().split_batch(&actor, batch_id, input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn list_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(body): Json<ListBatchBody>,
) -> AppResult<(StatusCode, Json<ListingOutcome>)> {
    let actor = state.actor(&user).await?;
    let outcome = state
        .lifecycle()
        .list_batch(&actor, batch_id, body.retailer_margin)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn sell_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(body): Json<SellBatchBody>,
) -> AppResult<Json<SaleResult>> {
    let actor = state.actor(&user).await?;
    let result = state
        .lifecycle()
        .sell_batch(&actor, batch_id, body.sold_quantity)
        .await?;
    Ok(Json(result))
}

pub async fn suspend_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(body): Json<SuspendBatchBody>,
) -> AppResult<Json<CropBatch>> {
    let actor = state.actor(&user).await?;
    let batch = state
        .lifecycle()
        .suspend_batch(&actor, batch_id, body.reason)
        .await?;
    Ok(Json(batch))
}

pub async fn record_inspection(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<InspectionInput>,
) -> AppResult<(StatusCode, Json<InspectionReport>)> {
    let actor = state.actor(&user).await?;
    let report = state
        .lifecycle()
        .record_inspection(&actor, batch_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}
