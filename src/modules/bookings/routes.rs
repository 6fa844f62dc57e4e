use axum::{
    routing::{get, patch, post, put},
    Router,
};

use super::handlers::{
    cancel_booking, create_booking, get_all_bookings_admin, get_all_requests, get_booking_by_id,
    get_pending_requests, get_provider_bookings, get_student_bookings, update_booking_status,
};
use crate::app_state::AppState;

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/my", get(get_student_bookings))
        .route("/provider", get(get_provider_bookings))
        .route("/requests/pending", get(get_pending_requests))
        .route("/requests/all", get(get_all_requests))
        .route("/admin/all", get(get_all_bookings_admin))
        .route("/:id", get(get_booking_by_id))
        .route("/:id/cancel", put(cancel_booking))
        .route("/:id/status", patch(update_booking_status))
}
