//! Transport request HTTP handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::lifecycle::{AcceptTransportInput, TransportOutcome};
use crate::AppState;

pub async fn accept_transport(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(input): Json<AcceptTransportInput>,
) -> AppResult<Json<TransportOutcome>> {
    let actor = state.actor(&user).await?;
    let outcome = state
        .lifecycle()
        .accept_transport(&actor, request_id, input)
        .await?;
    Ok(Json(outcome))
}

pub async fn reject_transport(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<TransportOutcome>> {
    let actor = state.actor(&user).await?;
    Ok(Json(
        state.lifecycle().reject_transport(&actor, request_id).await?,
    ))
}

/// Transporter reports arrival
pub async fn mark_arrival(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<TransportOutcome>> {
    let actor = state.actor(&user).await?;
    Ok(Json(state.lifecycle().mark_arrival(&actor, request_id).await?))
}

/// Receiver confirms arrival
pub async fn confirm_arrival(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<TransportOutcome>> {
    let actor = state.actor(&user).await?;
    Ok(Json(
        state.lifecycle().confirm_arrival(&actor, request_id).await?,
    ))
}

/// Transporter finalizes delivery; custody moves to the receiver
pub async fn deliver_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<TransportOutcome>> {
    let actor = state.actor(&user).await?;
    Ok(Json(state.lifecycle().deliver_batch(&actor, request_id).await?))
}
