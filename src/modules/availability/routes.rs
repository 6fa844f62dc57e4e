use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    create_availability, delete_availability, get_my_availability, get_provider_availability,
    update_availability,
};
use crate::app_state::AppState;

pub fn availability_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_availability))
        .route("/my", get(get_my_availability))
        .route("/provider/:provider_id", get(get_provider_availability))
        .route("/:id", put(update_availability).delete(delete_availability))
}
