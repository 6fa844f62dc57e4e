use time::{Duration, OffsetDateTime};
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::models::{
    AdminBookingQuery, Booking, BookingFilter, BookingStatus, CancelBooking, NewBooking,
    NotificationKind, Pagination, User,
};
use crate::db::repositories::{
    AvailabilityRepository, BookingRepository, UserRepository,
};
use crate::db::DatabaseError;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::modules::notifications::service::{
    dispatch_booking_event_to, Recipient,
};
use crate::scheduling::lifecycle::{authorize_transition, Actor};
use crate::scheduling::slots::find_covering_slot;
use crate::scheduling::time::{day_of_week, minute_of_day};

const CONFLICT_MESSAGE: &str = "the provider already has a booking during this time";

fn cancellation_lead(state: &AppState) -> Duration {
    Duration::hours(state.env.booking.cancellation_lead_hours)
}

/// Resolves a requested window against the provider's availability and
/// existing bookings, then creates the booking in `pending`.
///
/// The slot match, conflict check and insert run in one transaction under
/// a per-provider advisory lock, so concurrent requests for the same
/// provider serialize instead of double-booking.
pub async fn create_booking(
    state: &AppState,
    actor: &AuthUser,
    payload: NewBooking,
) -> AppResult<Booking> {
    payload.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    if payload.end_time <= payload.start_time {
        return Err(AppError::Validation("end time must be after start time".to_string()));
    }

    let student = require_profile(state, actor.id).await?;
    let booking_day = day_of_week(payload.start_time);

    let mut tx = state.db.begin().await.map_err(DatabaseError::from)?;

    BookingRepository::lock_provider(&mut tx, payload.provider_id).await?;

    let provider = UserRepository::find_provider_tx(&mut tx, payload.provider_id)
        .await?
        .ok_or_else(|| AppError::NotFound("provider not found".to_string()))?;

    let slot = match payload.availability_id {
        Some(slot_id) => AvailabilityRepository::find_active_for_provider(
            &mut tx,
            slot_id,
            payload.provider_id,
        )
        .await?
        .ok_or_else(|| {
            AppError::NotFound(
                "the selected availability slot does not exist or is not available".to_string(),
            )
        })?,
        None => {
            let slots = AvailabilityRepository::list_active_tx(&mut tx, payload.provider_id).await?;
            find_covering_slot(
                &slots,
                booking_day,
                minute_of_day(payload.start_time),
                minute_of_day(payload.end_time),
            )
            .ok_or_else(|| {
                AppError::Validation(
                    "provider is not available at the requested time".to_string(),
                )
            })?
            .clone()
        }
    };

    if BookingRepository::find_conflicting(
        &mut tx,
        payload.provider_id,
        payload.start_time,
        payload.end_time,
    )
    .await?
    .is_some()
    {
        return Err(AppError::Conflict(CONFLICT_MESSAGE.to_string()));
    }

    let booking = BookingRepository::insert(
        &mut tx,
        &student,
        &provider,
        slot.id,
        &payload,
        booking_day,
    )
    .await
    .map_err(|err| match err {
        // The exclusion constraint fired under a race the lock did not
        // cover (e.g. a parallel deployment without advisory locks).
        DatabaseError::Duplicate => AppError::Conflict(CONFLICT_MESSAGE.to_string()),
        other => AppError::Database(other),
    })?;

    tx.commit().await.map_err(DatabaseError::from)?;

    dispatch_booking_event_to(state, &booking, NotificationKind::BookingCreated, Recipient::Provider);

    Ok(booking)
}

pub async fn get_booking(state: &AppState, actor: &AuthUser, booking_id: Uuid) -> AppResult<Booking> {
    let booking = BookingRepository::find_by_id(&state.db, booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    if Actor::classify(actor.id, actor.role, &booking).is_none() {
        return Err(AppError::Authorization(
            "you are not authorized to view this booking".to_string(),
        ));
    }

    Ok(booking)
}

pub async fn student_bookings(
    state: &AppState,
    actor: &AuthUser,
    filter: &BookingFilter,
) -> AppResult<Vec<Booking>> {
    let bookings = BookingRepository::list_for_student(&state.db, actor.id, filter).await?;
    Ok(bookings)
}

pub async fn provider_bookings(
    state: &AppState,
    actor: &AuthUser,
    filter: &BookingFilter,
) -> AppResult<Vec<Booking>> {
    actor.require_provider("view their bookings")?;
    let bookings = BookingRepository::list_for_provider(&state.db, actor.id, filter).await?;
    Ok(bookings)
}

/// Cancels a booking on behalf of any authorized party. Students are held
/// to the cancellation window; providers and admins are not.
pub async fn cancel_booking(
    state: &AppState,
    actor: &AuthUser,
    booking_id: Uuid,
    payload: CancelBooking,
) -> AppResult<Booking> {
    let booking = BookingRepository::find_by_id(&state.db, booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    let relation = Actor::classify(actor.id, actor.role, &booking).ok_or_else(|| {
        AppError::Authorization("you are not authorized to cancel this booking".to_string())
    })?;

    let reason = payload.cancellation_reason.unwrap_or_else(|| {
        match relation {
            Actor::Student => "Cancelled by student".to_string(),
            Actor::Provider | Actor::Admin => "Cancelled by provider".to_string(),
        }
    });

    let updated = transition(
        state,
        booking,
        BookingStatus::Cancelled,
        relation,
        Some(reason),
    )
    .await?;

    let recipient = match relation {
        Actor::Student => Recipient::Provider,
        Actor::Provider | Actor::Admin => Recipient::Student,
    };
    dispatch_booking_event_to(state, &updated, NotificationKind::BookingCancelled, recipient);

    Ok(updated)
}

/// Confirms or completes a booking; cancellation goes through
/// [`cancel_booking`].
pub async fn update_booking_status(
    state: &AppState,
    actor: &AuthUser,
    booking_id: Uuid,
    status: &str,
) -> AppResult<Booking> {
    let target = match status.parse::<BookingStatus>() {
        Ok(BookingStatus::Confirmed) => BookingStatus::Confirmed,
        Ok(BookingStatus::Completed) => BookingStatus::Completed,
        _ => {
            return Err(AppError::Validation(
                "invalid status: status must be 'confirmed' or 'completed'".to_string(),
            ));
        }
    };

    let booking = BookingRepository::find_by_id(&state.db, booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    let relation = Actor::classify(actor.id, actor.role, &booking).ok_or_else(|| {
        AppError::Authorization(
            "only the provider or an admin can update booking status".to_string(),
        )
    })?;

    let updated = transition(state, booking, target, relation, None).await?;

    let kind = match target {
        BookingStatus::Confirmed => NotificationKind::BookingConfirmed,
        _ => NotificationKind::BookingCompleted,
    };
    dispatch_booking_event_to(state, &updated, kind, Recipient::Student);

    Ok(updated)
}

/// Authorizes and applies a status change with a compare-and-set write.
/// If the row moves under our feet the authorization is re-run against
/// the fresh status, so the caller sees the error the new state implies.
async fn transition(
    state: &AppState,
    mut booking: Booking,
    target: BookingStatus,
    relation: Actor,
    cancellation_reason: Option<String>,
) -> AppResult<Booking> {
    let lead = cancellation_lead(state);

    for _ in 0..2 {
        authorize_transition(
            booking.status,
            target,
            relation,
            OffsetDateTime::now_utc(),
            booking.start_time,
            lead,
        )?;

        match BookingRepository::update_status_if(
            &state.db,
            booking.id,
            booking.status,
            target,
            cancellation_reason.as_deref(),
        )
        .await?
        {
            Some(updated) => return Ok(updated),
            None => {
                // Lost a race with a concurrent transition; re-read and
                // re-authorize from the current status.
                booking = BookingRepository::find_by_id(&state.db, booking.id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;
            }
        }
    }

    Err(AppError::Conflict("booking was modified concurrently, please retry".to_string()))
}

/// Scopes an inbox request: providers see their own inbox; admins may
/// inspect any provider's by id after the role is verified.
async fn resolve_inbox_provider(
    state: &AppState,
    actor: &AuthUser,
    requested: Option<Uuid>,
) -> AppResult<Uuid> {
    if actor.role.is_admin() {
        if let Some(provider_id) = requested {
            UserRepository::find_provider(&state.db, provider_id)
                .await?
                .ok_or_else(|| AppError::NotFound("tutor not found".to_string()))?;
            return Ok(provider_id);
        }
        return Ok(actor.id);
    }

    if !actor.role.is_provider() {
        return Err(AppError::Authorization(
            "only tutors and counselors can view session requests".to_string(),
        ));
    }

    // Non-admins always get their own inbox, whatever they asked for.
    Ok(actor.id)
}

pub async fn pending_requests(
    state: &AppState,
    actor: &AuthUser,
    requested_provider: Option<Uuid>,
) -> AppResult<Vec<Booking>> {
    let provider_id = resolve_inbox_provider(state, actor, requested_provider).await?;
    let bookings = BookingRepository::list_pending_for_provider(&state.db, provider_id).await?;
    Ok(bookings)
}

pub async fn all_requests(
    state: &AppState,
    actor: &AuthUser,
    requested_provider: Option<Uuid>,
    status: Option<String>,
) -> AppResult<Vec<Booking>> {
    let provider_id = resolve_inbox_provider(state, actor, requested_provider).await?;

    let status = match status {
        Some(raw) => Some(raw.parse::<BookingStatus>().map_err(AppError::Validation)?),
        None => None,
    };

    let bookings =
        BookingRepository::list_requests_for_provider(&state.db, provider_id, status).await?;
    Ok(bookings)
}

pub async fn admin_bookings(
    state: &AppState,
    actor: &AuthUser,
    params: AdminBookingQuery,
) -> AppResult<(Vec<Booking>, Pagination)> {
    actor.require_admin()?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let (bookings, total) = BookingRepository::admin_list(&state.db, &params, page, limit).await?;

    let total_pages = (total + limit - 1) / limit;
    Ok((bookings, Pagination { total, page, limit, total_pages }))
}

async fn require_profile(state: &AppState, user_id: Uuid) -> AppResult<User> {
    UserRepository::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("authenticated user has no profile row".to_string()))
}
