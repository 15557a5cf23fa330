//! HTTP handlers for public batch traceability endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{error::AppResult, services::traceability::TraceabilityView, AppState};

/// Get public traceability view for a batch by its public id
/// This endpoint is unauthenticated - accessible via QR code scan
pub async fn get_traceability_view(
    State(state): State<AppState>,
    Path(public_batch_id): Path<Uuid>,
) -> AppResult<Json<TraceabilityView>> {
    let view = state.traceability().trace(public_batch_id).await?;
    Ok(Json(view))
}
