//! Overlap and containment checks over a provider's weekly slots.

use crate::db::models::{day_name, AvailabilitySlot};
use crate::error::AppError;
use crate::scheduling::time::{contains, format_minutes, overlaps, to_minutes};

/// A slot candidate that has passed field validation but not yet the
/// overlap checks.
#[derive(Debug, Clone)]
pub struct CandidateSlot {
    pub day_of_week: i16,
    pub start_minute: i16,
    pub end_minute: i16,
    pub is_active: bool,
}

/// Validates one batch item: day range, time format, start < end.
pub fn validate_slot_times(
    day_of_week: i16,
    start_time: &str,
    end_time: &str,
) -> Result<(i16, i16), AppError> {
    if !(0..=6).contains(&day_of_week) {
        return Err(AppError::Validation(format!(
            "valid day of week (0-6) is required for slot {start_time}-{end_time}"
        )));
    }

    let start_minute = to_minutes(start_time)?;
    let end_minute = to_minutes(end_time)?;

    if end_minute <= start_minute {
        return Err(AppError::Validation(format!(
            "end time must be after start time for slot {start_time}-{end_time}"
        )));
    }

    Ok((start_minute, end_minute))
}

/// Rejects a candidate that overlaps any *active* slot of the same day in
/// `existing`. Inactive rows and other days never conflict. The error
/// message identifies both the candidate and the slot it collides with.
pub fn ensure_no_overlap(
    candidate: &CandidateSlot,
    existing: &[&AvailabilitySlot],
) -> Result<(), AppError> {
    if !candidate.is_active {
        return Ok(());
    }

    for slot in existing {
        if !slot.is_active || slot.day_of_week != candidate.day_of_week {
            continue;
        }
        if overlaps(
            candidate.start_minute,
            candidate.end_minute,
            slot.start_minute,
            slot.end_minute,
        ) {
            return Err(AppError::Conflict(format!(
                "cannot create overlapping availability slot on {} at {}-{}: you already have a slot from {} to {}",
                day_name(candidate.day_of_week),
                format_minutes(candidate.start_minute),
                format_minutes(candidate.end_minute),
                format_minutes(slot.start_minute),
                format_minutes(slot.end_minute),
            )));
        }
    }

    Ok(())
}

/// Pairwise overlap check within a single batch, so an all-or-nothing
/// insert cannot smuggle in a self-overlapping pair.
pub fn ensure_batch_consistent(candidates: &[CandidateSlot]) -> Result<(), AppError> {
    for (index, candidate) in candidates.iter().enumerate() {
        if !candidate.is_active {
            continue;
        }
        for earlier in &candidates[..index] {
            if !earlier.is_active || earlier.day_of_week != candidate.day_of_week {
                continue;
            }
            if overlaps(
                candidate.start_minute,
                candidate.end_minute,
                earlier.start_minute,
                earlier.end_minute,
            ) {
                return Err(AppError::Conflict(format!(
                    "availability slots on {} at {}-{} and {}-{} overlap each other",
                    day_name(candidate.day_of_week),
                    format_minutes(earlier.start_minute),
                    format_minutes(earlier.end_minute),
                    format_minutes(candidate.start_minute),
                    format_minutes(candidate.end_minute),
                )));
            }
        }
    }

    Ok(())
}

/// First active slot that fully contains the requested window on the given
/// day. First match wins; slots are expected in (day, start) order.
pub fn find_covering_slot<'a>(
    slots: &'a [AvailabilitySlot],
    day_of_week: i16,
    start_minute: i16,
    end_minute: i16,
) -> Option<&'a AvailabilitySlot> {
    slots.iter().find(|slot| {
        slot.is_active
            && slot.day_of_week == day_of_week
            && contains(slot.start_minute, slot.end_minute, start_minute, end_minute)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Recurrence, UserRole};
    use sqlx::types::Uuid;
    use time::macros::datetime;

    fn slot(day: i16, start: i16, end: i16, active: bool) -> AvailabilitySlot {
        AvailabilitySlot {
            id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            provider_name: "Dana Velez".to_string(),
            provider_role: UserRole::Tutor,
            day_of_week: day,
            start_minute: start,
            end_minute: end,
            is_active: active,
            recurrence: Recurrence::Weekly,
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    fn candidate(day: i16, start: i16, end: i16) -> CandidateSlot {
        CandidateSlot { day_of_week: day, start_minute: start, end_minute: end, is_active: true }
    }

    #[test]
    fn validates_day_range() {
        assert!(validate_slot_times(7, "09:00", "10:00").is_err());
        assert!(validate_slot_times(-1, "09:00", "10:00").is_err());
        assert_eq!(validate_slot_times(1, "09:00", "10:00").unwrap(), (540, 600));
    }

    #[test]
    fn rejects_inverted_and_empty_windows() {
        assert!(validate_slot_times(1, "10:00", "09:00").is_err());
        assert!(validate_slot_times(1, "09:00", "09:00").is_err());
    }

    #[test]
    fn overlapping_candidate_conflicts() {
        let existing = slot(1, 540, 600, true);
        let err = ensure_no_overlap(&candidate(1, 570, 630), &[&existing]).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.to_string().contains("Monday"));
        assert!(err.to_string().contains("09:00 to 10:00"));
    }

    #[test]
    fn adjacent_candidate_is_allowed() {
        let existing = slot(1, 540, 600, true);
        assert!(ensure_no_overlap(&candidate(1, 600, 660), &[&existing]).is_ok());
    }

    #[test]
    fn duplicate_candidate_conflicts() {
        let existing = slot(1, 540, 600, true);
        assert!(ensure_no_overlap(&candidate(1, 540, 600), &[&existing]).is_err());
    }

    #[test]
    fn inactive_rows_and_other_days_do_not_conflict() {
        let inactive = slot(1, 540, 600, false);
        let tuesday = slot(2, 540, 600, true);
        assert!(ensure_no_overlap(&candidate(1, 540, 600), &[&inactive, &tuesday]).is_ok());
    }

    #[test]
    fn batch_self_overlap_is_caught() {
        let batch = vec![candidate(1, 540, 600), candidate(1, 570, 630)];
        assert!(ensure_batch_consistent(&batch).is_err());

        let fine = vec![candidate(1, 540, 600), candidate(1, 600, 660), candidate(2, 540, 600)];
        assert!(ensure_batch_consistent(&fine).is_ok());
    }

    #[test]
    fn covering_slot_requires_containment_and_day_match() {
        let slots = vec![slot(1, 540, 600, true), slot(1, 720, 780, true)];

        // 09:15-09:45 inside the 09:00-10:00 Monday slot.
        let hit = find_covering_slot(&slots, 1, 555, 585).unwrap();
        assert_eq!(hit.start_minute, 540);

        // Window poking out of every slot.
        assert!(find_covering_slot(&slots, 1, 585, 615).is_none());
        // Right times, wrong day.
        assert!(find_covering_slot(&slots, 2, 555, 585).is_none());
    }

    #[test]
    fn covering_slot_ignores_inactive_slots() {
        let slots = vec![slot(1, 540, 600, false)];
        assert!(find_covering_slot(&slots, 1, 555, 585).is_none());
    }

    #[test]
    fn first_covering_slot_wins() {
        let wide = slot(1, 480, 720, true);
        let narrow = slot(1, 540, 600, true);
        let slots = vec![wide, narrow];
        let hit = find_covering_slot(&slots, 1, 555, 585).unwrap();
        assert_eq!(hit.start_minute, 480);
    }
}
