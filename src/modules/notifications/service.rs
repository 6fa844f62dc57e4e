use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::{Booking, NewNotification, Notification, NotificationKind};
use crate::db::repositories::NotificationRepository;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// Which side of the booking receives the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Student,
    Provider,
}

fn compose(booking: &Booking, kind: NotificationKind, recipient: Recipient) -> (String, String) {
    let counterparty = match recipient {
        Recipient::Student => booking.provider_name.as_str(),
        Recipient::Provider => booking.student_name.as_str(),
    };

    match kind {
        NotificationKind::BookingCreated => (
            "New Session Request".to_string(),
            format!("{counterparty} has requested a session with you"),
        ),
        NotificationKind::BookingConfirmed => (
            "Booking Confirmed".to_string(),
            format!("your booking with {counterparty} has been confirmed"),
        ),
        NotificationKind::BookingCancelled => (
            "Booking Cancelled".to_string(),
            format!("your booking with {counterparty} has been cancelled"),
        ),
        NotificationKind::BookingCompleted => (
            "Booking Completed".to_string(),
            format!("your booking with {counterparty} has been marked completed"),
        ),
    }
}

/// Best-effort dispatch of a booking event to one party: persists an
/// in-app notification row and publishes the event for the external
/// real-time delivery layer. Runs after the state-changing transaction
/// has committed and never fails the caller; errors are logged and
/// swallowed.
pub fn dispatch_booking_event_to(
    state: &AppState,
    booking: &Booking,
    kind: NotificationKind,
    recipient: Recipient,
) {
    let user_id = match recipient {
        Recipient::Student => booking.student_id,
        Recipient::Provider => booking.provider_id,
    };
    let (title, message) = compose(booking, kind, recipient);

    let notification = NewNotification {
        user_id,
        kind,
        title,
        message,
        booking_id: Some(booking.id),
    };

    let db = state.db.clone();
    let events_tx = state.events_tx.clone();
    tokio::spawn(async move {
        match NotificationRepository::insert(&db, &notification).await {
            Ok(stored) => {
                debug!(user_id = %stored.user_id, kind = ?stored.kind, "notification stored");
                let event = json!({
                    "event": "notification:new",
                    "user_id": stored.user_id,
                    "notification": stored,
                })
                .to_string();
                // No subscribers is fine; delivery is someone else's job.
                let _ = events_tx.send(event);
            }
            Err(err) => {
                warn!(error = %err, user_id = %notification.user_id, "failed to dispatch notification");
            }
        }
    });
}

pub async fn list_for_user(
    state: &AppState,
    actor: &AuthUser,
    limit: i64,
    offset: i64,
    unread_only: bool,
) -> AppResult<(Vec<Notification>, i64)> {
    let result = NotificationRepository::list_for_user(
        &state.db,
        actor.id,
        limit.clamp(1, 100),
        offset.max(0),
        unread_only,
    )
    .await?;
    Ok(result)
}

pub async fn mark_read(
    state: &AppState,
    actor: &AuthUser,
    notification_id: Uuid,
) -> AppResult<Notification> {
    NotificationRepository::mark_read(&state.db, notification_id, actor.id)
        .await?
        .ok_or_else(|| crate::error::AppError::NotFound("notification not found".to_string()))
}

pub async fn mark_all_read(state: &AppState, actor: &AuthUser) -> AppResult<u64> {
    let updated = NotificationRepository::mark_all_read(&state.db, actor.id).await?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{BookingStatus, SessionType, UserRole};
    use time::macros::datetime;

    fn booking() -> Booking {
        Booking {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            availability_id: None,
            start_time: datetime!(2024-01-08 09:00 UTC),
            end_time: datetime!(2024-01-08 10:00 UTC),
            day_of_week: 1,
            status: BookingStatus::Pending,
            session_type: SessionType::Virtual,
            notes: String::new(),
            cancellation_reason: None,
            student_name: "Ana Osei".to_string(),
            provider_name: "Dana Velez".to_string(),
            provider_role: UserRole::Tutor,
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn messages_name_the_counterparty() {
        let b = booking();
        let (_, to_student) = compose(&b, NotificationKind::BookingConfirmed, Recipient::Student);
        assert!(to_student.contains("Dana Velez"));

        let (_, to_provider) = compose(&b, NotificationKind::BookingCreated, Recipient::Provider);
        assert!(to_provider.contains("Ana Osei"));
    }
}
