use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use super::service;
use crate::app_state::AppState;
use crate::db::models::NotificationQuery;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

pub async fn get_notifications(
    State(state): State<AppState>,
    actor: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(20);
    let offset = query.offset.unwrap_or(0);
    let (notifications, total) =
        service::list_for_user(&state, &actor, limit, offset, query.unread_only).await?;

    Ok(Json(json!({
        "success": true,
        "message": "notifications retrieved successfully",
        "data": {
            "notifications": notifications,
            "total": total,
        },
    })))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let notification = service::mark_read(&state, &actor, notification_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "notification marked as read",
        "data": notification,
    })))
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    actor: AuthUser,
) -> AppResult<impl IntoResponse> {
    let updated = service::mark_all_read(&state, &actor).await?;

    Ok(Json(json!({
        "success": true,
        "message": "all notifications marked as read",
        "data": { "updated": updated },
    })))
}
