use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

use super::UserRole;
use crate::scheduling::time::format_minutes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "recurrence_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    OneTime,
    Weekly,
    Biweekly,
    Monthly,
}

/// A recurring weekly availability window. Times are stored as minutes
/// since midnight; the API speaks "HH:MM".
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub provider_role: UserRole,
    pub day_of_week: i16,
    pub start_minute: i16,
    pub end_minute: i16,
    pub is_active: bool,
    pub recurrence: Recurrence,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One item of a batch-create request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAvailabilitySlot {
    pub day_of_week: i16,
    #[validate(length(min = 1, message = "start time is required"))]
    pub start_time: String,
    #[validate(length(min = 1, message = "end time is required"))]
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default = "default_recurrence")]
    pub recurrence: Recurrence,
}

fn default_true() -> bool {
    true
}

fn default_recurrence() -> Recurrence {
    Recurrence::Weekly
}

/// The create endpoint accepts a single slot object or an array of them;
/// a single item is treated as a batch of one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SlotBatch {
    One(NewAvailabilitySlot),
    Many(Vec<NewAvailabilitySlot>),
}

impl SlotBatch {
    pub fn into_items(self) -> Vec<NewAvailabilitySlot> {
        match self {
            SlotBatch::One(item) => vec![item],
            SlotBatch::Many(items) => items,
        }
    }
}

/// A batch item after parsing and validation, ready for insert.
#[derive(Debug, Clone)]
pub struct SlotInsert {
    pub day_of_week: i16,
    pub start_minute: i16,
    pub end_minute: i16,
    pub is_active: bool,
    pub recurrence: Recurrence,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAvailabilitySlot {
    pub day_of_week: Option<i16>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_available: Option<bool>,
    pub recurrence: Option<Recurrence>,
}

/// Response projection of a slot with the stored minutes rendered back to
/// wall-clock strings. Built fresh from the row, never patched onto it.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilitySlotResponse {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub provider_role: UserRole,
    pub day_of_week: i16,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
    pub recurrence: Recurrence,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<AvailabilitySlot> for AvailabilitySlotResponse {
    fn from(slot: AvailabilitySlot) -> Self {
        AvailabilitySlotResponse {
            id: slot.id,
            provider_id: slot.provider_id,
            provider_name: slot.provider_name,
            provider_role: slot.provider_role,
            day_of_week: slot.day_of_week,
            start_time: format_minutes(slot.start_minute),
            end_time: format_minutes(slot.end_minute),
            is_available: slot.is_active,
            recurrence: slot.recurrence,
            created_at: slot.created_at,
            updated_at: slot.updated_at,
        }
    }
}

pub fn day_name(day_of_week: i16) -> &'static str {
    match day_of_week {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_slot_defaults() {
        let slot: NewAvailabilitySlot = serde_json::from_str(
            r#"{"day_of_week": 1, "start_time": "09:00", "end_time": "10:00"}"#,
        )
        .unwrap();
        assert!(slot.is_available);
        assert_eq!(slot.recurrence, Recurrence::Weekly);
    }

    #[test]
    fn recurrence_wire_format() {
        assert_eq!(
            serde_json::to_string(&Recurrence::OneTime).unwrap(),
            "\"one_time\""
        );
        let parsed: Recurrence = serde_json::from_str("\"biweekly\"").unwrap();
        assert_eq!(parsed, Recurrence::Biweekly);
    }

    #[test]
    fn batch_accepts_single_object_or_array() {
        let single: SlotBatch = serde_json::from_str(
            r#"{"day_of_week": 1, "start_time": "09:00", "end_time": "10:00"}"#,
        )
        .unwrap();
        assert_eq!(single.into_items().len(), 1);

        let many: SlotBatch = serde_json::from_str(
            r#"[{"day_of_week": 1, "start_time": "09:00", "end_time": "10:00"},
                {"day_of_week": 2, "start_time": "13:00", "end_time": "15:30"}]"#,
        )
        .unwrap();
        assert_eq!(many.into_items().len(), 2);
    }

    #[test]
    fn day_names_cover_the_week() {
        assert_eq!(day_name(0), "Sunday");
        assert_eq!(day_name(6), "Saturday");
        assert_eq!(day_name(7), "Unknown");
    }
}
