//! Stakeholder profile HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{StakeholderProfile, StakeholderRole};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::profile::RegisterProfileInput;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterProfileRequest {
    pub username: String,
    pub role: StakeholderRole,
    #[serde(default)]
    pub organization: String,
}

/// Register the profile of the authenticated account
pub async fn register_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<RegisterProfileRequest>,
) -> AppResult<(StatusCode, Json<StakeholderProfile>)> {
    let profile = state
        .profiles()
        .register(RegisterProfileInput {
            user_id: user.user_id,
            username: body.username,
            role: body.role,
            organization: body.organization,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Profile of the authenticated account
pub async fn get_my_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<StakeholderProfile>> {
    let profile = state.profiles().resolve_actor(user.user_id).await?;
    Ok(Json(profile))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> AppResult<Json<StakeholderProfile>> {
    let profile = state.profiles().get(profile_id).await?;
    Ok(Json(profile))
}
