use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::models::{
    AvailabilitySlot, NewAvailabilitySlot, ProviderSummary, SlotInsert, UpdateAvailabilitySlot,
    User,
};
use crate::db::repositories::{AvailabilityRepository, UserRepository};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::scheduling::slots::{
    ensure_batch_consistent, ensure_no_overlap, validate_slot_times, CandidateSlot,
};

fn candidate(item: &SlotInsert) -> CandidateSlot {
    CandidateSlot {
        day_of_week: item.day_of_week,
        start_minute: item.start_minute,
        end_minute: item.end_minute,
        is_active: item.is_active,
    }
}

/// Validates and persists a batch of slots, all-or-nothing. The overlap
/// re-check runs inside the insert transaction so it sees a stable
/// snapshot of the provider's existing slots.
pub async fn create_slots(
    state: &AppState,
    actor: &AuthUser,
    items: Vec<NewAvailabilitySlot>,
) -> AppResult<Vec<AvailabilitySlot>> {
    actor.require_provider("set availability")?;

    if items.is_empty() {
        return Err(AppError::Validation("no availability slots provided".to_string()));
    }

    let mut inserts = Vec::with_capacity(items.len());
    for item in &items {
        item.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let (start_minute, end_minute) =
            validate_slot_times(item.day_of_week, &item.start_time, &item.end_time)?;
        inserts.push(SlotInsert {
            day_of_week: item.day_of_week,
            start_minute,
            end_minute,
            is_active: item.is_available,
            recurrence: item.recurrence,
        });
    }

    let candidates: Vec<CandidateSlot> = inserts.iter().map(candidate).collect();
    ensure_batch_consistent(&candidates)?;

    let provider = require_profile(state, actor.id).await?;

    let mut tx = state.db.begin().await.map_err(crate::db::DatabaseError::from)?;

    let existing = AvailabilityRepository::list_active_tx(&mut tx, actor.id).await?;
    let existing_refs: Vec<&AvailabilitySlot> = existing.iter().collect();
    for item in &candidates {
        ensure_no_overlap(item, &existing_refs)?;
    }

    let created = AvailabilityRepository::insert_batch(&mut tx, &provider, &inserts).await?;
    tx.commit().await.map_err(crate::db::DatabaseError::from)?;

    Ok(created)
}

/// Partial update of an owned slot. Unlike the historical behavior this
/// re-runs the overlap check against the provider's other active slots,
/// so an update cannot manufacture an overlapping pair.
pub async fn update_slot(
    state: &AppState,
    actor: &AuthUser,
    slot_id: Uuid,
    patch: UpdateAvailabilitySlot,
) -> AppResult<AvailabilitySlot> {
    actor.require_provider("update availability")?;

    let slot = AvailabilityRepository::find_by_id(&state.db, slot_id)
        .await?
        .ok_or_else(|| AppError::NotFound("availability slot not found".to_string()))?;

    if slot.provider_id != actor.id {
        return Err(AppError::Authorization(
            "you can only update your own availability slots".to_string(),
        ));
    }

    let day_of_week = patch.day_of_week.unwrap_or(slot.day_of_week);
    // Merge the stored value for whichever endpoint the patch leaves out,
    // then re-validate the pair as a whole.
    let start_time = match &patch.start_time {
        Some(value) => value.clone(),
        None => crate::scheduling::time::format_minutes(slot.start_minute),
    };
    let end_time = match &patch.end_time {
        Some(value) => value.clone(),
        None => crate::scheduling::time::format_minutes(slot.end_minute),
    };
    let (start_minute, end_minute) = validate_slot_times(day_of_week, &start_time, &end_time)?;

    let is_active = patch.is_available.unwrap_or(slot.is_active);
    let recurrence = patch.recurrence.unwrap_or(slot.recurrence);

    let siblings = AvailabilityRepository::list_for_provider(&state.db, actor.id, true).await?;
    let sibling_refs: Vec<&AvailabilitySlot> =
        siblings.iter().filter(|s| s.id != slot.id).collect();
    ensure_no_overlap(
        &CandidateSlot { day_of_week, start_minute, end_minute, is_active },
        &sibling_refs,
    )?;

    let updated = AvailabilityRepository::update(
        &state.db,
        slot.id,
        day_of_week,
        start_minute,
        end_minute,
        is_active,
        recurrence,
    )
    .await?;

    Ok(updated)
}

/// Ownership-checked hard delete. Bookings that referenced the slot keep
/// their time data; the foreign key is nulled by the schema.
pub async fn delete_slot(state: &AppState, actor: &AuthUser, slot_id: Uuid) -> AppResult<()> {
    actor.require_provider("delete availability")?;

    let slot = AvailabilityRepository::find_by_id(&state.db, slot_id)
        .await?
        .ok_or_else(|| AppError::NotFound("availability slot not found".to_string()))?;

    if slot.provider_id != actor.id {
        return Err(AppError::Authorization(
            "you can only delete your own availability slots".to_string(),
        ));
    }

    let deleted = AvailabilityRepository::delete(&state.db, slot.id).await?;
    if !deleted {
        return Err(AppError::NotFound("availability slot not found".to_string()));
    }

    Ok(())
}

/// The calling provider's own slots, active and inactive.
pub async fn list_my_slots(state: &AppState, actor: &AuthUser) -> AppResult<Vec<AvailabilitySlot>> {
    actor.require_provider("view their availability")?;
    let slots = AvailabilityRepository::list_for_provider(&state.db, actor.id, false).await?;
    Ok(slots)
}

/// A provider's active slots for anyone browsing the platform.
pub async fn provider_availability(
    state: &AppState,
    provider_id: Uuid,
) -> AppResult<(ProviderSummary, Vec<AvailabilitySlot>)> {
    let provider = UserRepository::find_provider(&state.db, provider_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("provider not found or is not a tutor/counselor".to_string())
        })?;

    let slots = AvailabilityRepository::list_for_provider(&state.db, provider_id, true).await?;
    Ok((ProviderSummary::from(&provider), slots))
}

async fn require_profile(state: &AppState, user_id: Uuid) -> AppResult<User> {
    UserRepository::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("authenticated user has no profile row".to_string()))
}
