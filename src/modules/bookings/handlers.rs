use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use super::service;
use crate::app_state::AppState;
use crate::db::models::{
    AdminBookingQuery, BookingFilter, CancelBooking, InboxQuery, NewBooking, UpdateBookingStatus,
};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

pub async fn create_booking(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(payload): Json<NewBooking>,
) -> AppResult<impl IntoResponse> {
    let booking = service::create_booking(&state, &actor, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "booking created successfully",
            "data": booking,
        })),
    ))
}

pub async fn get_student_bookings(
    State(state): State<AppState>,
    actor: AuthUser,
    Query(filter): Query<BookingFilter>,
) -> AppResult<impl IntoResponse> {
    let bookings = service::student_bookings(&state, &actor, &filter).await?;

    Ok(Json(json!({
        "success": true,
        "message": "bookings retrieved successfully",
        "data": bookings,
    })))
}

pub async fn get_provider_bookings(
    State(state): State<AppState>,
    actor: AuthUser,
    Query(filter): Query<BookingFilter>,
) -> AppResult<impl IntoResponse> {
    let bookings = service::provider_bookings(&state, &actor, &filter).await?;

    Ok(Json(json!({
        "success": true,
        "message": "bookings retrieved successfully",
        "data": bookings,
    })))
}

pub async fn get_booking_by_id(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let booking = service::get_booking(&state, &actor, booking_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "booking retrieved successfully",
        "data": booking,
    })))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(booking_id): Path<Uuid>,
    payload: Option<Json<CancelBooking>>,
) -> AppResult<impl IntoResponse> {
    let payload = payload.map(|Json(body)| body).unwrap_or_default();
    let booking = service::cancel_booking(&state, &actor, booking_id, payload).await?;

    Ok(Json(json!({
        "success": true,
        "message": "booking cancelled successfully",
        "data": booking,
    })))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateBookingStatus>,
) -> AppResult<impl IntoResponse> {
    let booking =
        service::update_booking_status(&state, &actor, booking_id, &payload.status).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("booking marked as {}", payload.status),
        "data": booking,
    })))
}

pub async fn get_pending_requests(
    State(state): State<AppState>,
    actor: AuthUser,
    Query(query): Query<InboxQuery>,
) -> AppResult<impl IntoResponse> {
    let requests = service::pending_requests(&state, &actor, query.provider_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "pending session requests retrieved successfully",
        "data": requests,
    })))
}

pub async fn get_all_requests(
    State(state): State<AppState>,
    actor: AuthUser,
    Query(query): Query<InboxQuery>,
) -> AppResult<impl IntoResponse> {
    let requests =
        service::all_requests(&state, &actor, query.provider_id, query.status).await?;

    Ok(Json(json!({
        "success": true,
        "message": "session requests retrieved successfully",
        "data": requests,
    })))
}

pub async fn get_all_bookings_admin(
    State(state): State<AppState>,
    actor: AuthUser,
    Query(params): Query<AdminBookingQuery>,
) -> AppResult<impl IntoResponse> {
    let (bookings, pagination) = service::admin_bookings(&state, &actor, params).await?;

    Ok(Json(json!({
        "success": true,
        "message": "bookings retrieved successfully",
        "data": {
            "bookings": bookings,
            "pagination": pagination,
        },
    })))
}
