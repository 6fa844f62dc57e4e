use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use super::service;
use crate::app_state::AppState;
use crate::db::models::{AvailabilitySlotResponse, SlotBatch, UpdateAvailabilitySlot};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

pub async fn create_availability(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(batch): Json<SlotBatch>,
) -> AppResult<impl IntoResponse> {
    let created = service::create_slots(&state, &actor, batch.into_items()).await?;
    let count = created.len();
    let slots: Vec<AvailabilitySlotResponse> =
        created.into_iter().map(AvailabilitySlotResponse::from).collect();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("{count} availability slot(s) created successfully"),
            "data": slots,
        })),
    ))
}

pub async fn get_my_availability(
    State(state): State<AppState>,
    actor: AuthUser,
) -> AppResult<impl IntoResponse> {
    let slots = service::list_my_slots(&state, &actor).await?;
    let slots: Vec<AvailabilitySlotResponse> =
        slots.into_iter().map(AvailabilitySlotResponse::from).collect();

    Ok(Json(json!({
        "success": true,
        "message": "your availability retrieved successfully",
        "data": slots,
    })))
}

pub async fn get_provider_availability(
    State(state): State<AppState>,
    _actor: AuthUser,
    Path(provider_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let (provider, slots) = service::provider_availability(&state, provider_id).await?;
    let slots: Vec<AvailabilitySlotResponse> =
        slots.into_iter().map(AvailabilitySlotResponse::from).collect();

    Ok(Json(json!({
        "success": true,
        "message": "provider availability retrieved successfully",
        "data": {
            "provider": provider,
            "availabilities": slots,
        },
    })))
}

pub async fn update_availability(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(slot_id): Path<Uuid>,
    Json(patch): Json<UpdateAvailabilitySlot>,
) -> AppResult<impl IntoResponse> {
    let updated = service::update_slot(&state, &actor, slot_id, patch).await?;

    Ok(Json(json!({
        "success": true,
        "message": "availability updated successfully",
        "data": AvailabilitySlotResponse::from(updated),
    })))
}

pub async fn delete_availability(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(slot_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    service::delete_slot(&state, &actor, slot_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "availability deleted successfully",
        "data": null,
    })))
}
