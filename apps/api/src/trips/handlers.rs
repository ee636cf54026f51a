//! Axum route handlers for `/api/trips`. Every handler is scoped to the caller.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::plan::GeneratedPlan;
use crate::models::trip::{NewTrip, Trip, TripPatch};
use crate::state::AppState;
use crate::trips::query::{ListParams, ListQuery};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub custom_instruction: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub msg: String,
    pub ai_plan: GeneratedPlan,
    pub trip: Trip,
}

/// POST /api/trips
pub async fn handle_create_trip(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewTrip>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }

    let trip = state.trips.create(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

/// GET /api/trips?page&limit&search&sort
pub async fn handle_list_trips(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Trip>>, AppError> {
    let query = ListQuery::try_from(params)?;
    Ok(Json(state.trips.list(user.id, &query).await?))
}

/// GET /api/trips/:id
pub async fn handle_get_trip(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    state
        .trips
        .get(id, user.id)
        .await?
        .map(Json)
        .ok_or_else(AppError::trip_not_found)
}

/// PUT /api/trips/:id
pub async fn handle_update_trip(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<TripPatch>,
) -> Result<Json<Trip>, AppError> {
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }

    state
        .trips
        .update(id, user.id, patch)
        .await?
        .map(Json)
        .ok_or_else(AppError::trip_not_found)
}

/// DELETE /api/trips/:id
pub async fn handle_delete_trip(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.trips.delete(id, user.id).await? {
        return Err(AppError::trip_not_found());
    }
    Ok(Json(MessageResponse {
        msg: "Trip deleted successfully".to_string(),
    }))
}

/// POST /api/trips/:id/generate
///
/// Body is optional; `{"customInstruction": "..."}` is appended to the prompt.
pub async fn handle_generate_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<GenerateRequest>>,
) -> Result<Json<GenerateResponse>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let outcome = state
        .planner
        .generate_plan(id, user.id, req.custom_instruction.as_deref())
        .await?;

    Ok(Json(GenerateResponse {
        msg: "AI trip plan generated successfully".to_string(),
        ai_plan: outcome.plan,
        trip: outcome.trip,
    }))
}
