//! Booking status transitions: who may move a booking where, and when.

use time::{Duration, OffsetDateTime};

use crate::db::models::{Booking, BookingStatus, UserRole};
use crate::error::AppError;
use sqlx::types::Uuid;

/// The caller's relationship to a booking. Admin wins over the party
/// relations, so an admin who also happens to be a party is never subject
/// to the student cancellation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Student,
    Provider,
    Admin,
}

impl Actor {
    /// Classifies a caller against a booking; `None` means the caller is
    /// neither a party to the booking nor an admin.
    pub fn classify(user_id: Uuid, role: UserRole, booking: &Booking) -> Option<Actor> {
        if role.is_admin() {
            Some(Actor::Admin)
        } else if booking.provider_id == user_id {
            Some(Actor::Provider)
        } else if booking.student_id == user_id {
            Some(Actor::Student)
        } else {
            None
        }
    }
}

/// Checks a single transition against the lifecycle table.
///
/// `min_cancel_lead` is the student cancellation window (24h in
/// production); students may cancel only while `now < start - lead`.
pub fn authorize_transition(
    current: BookingStatus,
    target: BookingStatus,
    actor: Actor,
    now: OffsetDateTime,
    start_time: OffsetDateTime,
    min_cancel_lead: Duration,
) -> Result<(), AppError> {
    match current {
        BookingStatus::Cancelled => {
            return Err(AppError::InvalidState("booking is already cancelled".to_string()));
        }
        BookingStatus::Completed => {
            return Err(AppError::InvalidState(
                "cannot modify a completed booking".to_string(),
            ));
        }
        BookingStatus::Pending | BookingStatus::Confirmed => {}
    }

    match (current, target) {
        (BookingStatus::Pending, BookingStatus::Confirmed) => match actor {
            Actor::Provider | Actor::Admin => Ok(()),
            Actor::Student => Err(AppError::Authorization(
                "only the provider or an admin can confirm a booking".to_string(),
            )),
        },
        (BookingStatus::Confirmed, BookingStatus::Completed) => match actor {
            Actor::Provider | Actor::Admin => Ok(()),
            Actor::Student => Err(AppError::Authorization(
                "only the provider or an admin can complete a booking".to_string(),
            )),
        },
        (BookingStatus::Pending | BookingStatus::Confirmed, BookingStatus::Cancelled) => {
            match actor {
                Actor::Provider | Actor::Admin => Ok(()),
                Actor::Student => {
                    if now < start_time - min_cancel_lead {
                        Ok(())
                    } else {
                        Err(AppError::Validation(
                            "bookings can only be cancelled at least 24 hours in advance"
                                .to_string(),
                        ))
                    }
                }
            }
        }
        (BookingStatus::Pending, BookingStatus::Completed) => Err(AppError::InvalidState(
            "only a confirmed booking can be completed".to_string(),
        )),
        (BookingStatus::Confirmed, BookingStatus::Confirmed) => Err(AppError::InvalidState(
            "booking is already confirmed".to_string(),
        )),
        (_, BookingStatus::Pending) => Err(AppError::InvalidState(
            "a booking cannot be moved back to pending".to_string(),
        )),
        // Terminal source states were rejected before the table; this arm
        // only exists to keep the match exhaustive.
        (BookingStatus::Cancelled, _) => {
            Err(AppError::InvalidState("booking is already cancelled".to_string()))
        }
        (BookingStatus::Completed, _) => {
            Err(AppError::InvalidState("cannot modify a completed booking".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{SessionType, UserRole};
    use time::macros::datetime;

    const LEAD: Duration = Duration::hours(24);

    fn booking(student: Uuid, provider: Uuid) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            student_id: student,
            provider_id: provider,
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
    fn classify_prefers_admin() {
        let student = Uuid::new_v4();
        let provider = Uuid::new_v4();
        let b = booking(student, provider);

        assert_eq!(Actor::classify(student, UserRole::Student, &b), Some(Actor::Student));
        assert_eq!(Actor::classify(provider, UserRole::Tutor, &b), Some(Actor::Provider));
        assert_eq!(Actor::classify(student, UserRole::Admin, &b), Some(Actor::Admin));
        assert_eq!(Actor::classify(Uuid::new_v4(), UserRole::Student, &b), None);
    }

    #[test]
    fn provider_confirms_pending() {
        let start = datetime!(2024-01-08 09:00 UTC);
        let now = datetime!(2024-01-08 08:00 UTC);
        for actor in [Actor::Provider, Actor::Admin] {
            assert!(authorize_transition(
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                actor,
                now,
                start,
                LEAD,
            )
            .is_ok());
        }

        let err = authorize_transition(
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            Actor::Student,
            now,
            start,
            LEAD,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[test]
    fn student_cancel_requires_24h_lead() {
        let start = datetime!(2024-01-08 09:00 UTC);

        // 10 hours before start: too late.
        let err = authorize_transition(
            BookingStatus::Pending,
            BookingStatus::Cancelled,
            Actor::Student,
            datetime!(2024-01-07 23:00 UTC),
            start,
            LEAD,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // 48 hours before start: fine.
        assert!(authorize_transition(
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            Actor::Student,
            datetime!(2024-01-06 09:00 UTC),
            start,
            LEAD,
        )
        .is_ok());

        // Exactly 24 hours before start: the window is strict.
        assert!(authorize_transition(
            BookingStatus::Pending,
            BookingStatus::Cancelled,
            Actor::Student,
            datetime!(2024-01-07 09:00 UTC),
            start,
            LEAD,
        )
        .is_err());
    }

    #[test]
    fn provider_cancels_regardless_of_lead_time() {
        let start = datetime!(2024-01-08 09:00 UTC);
        let now = datetime!(2024-01-08 08:59 UTC);
        for actor in [Actor::Provider, Actor::Admin] {
            assert!(authorize_transition(
                BookingStatus::Confirmed,
                BookingStatus::Cancelled,
                actor,
                now,
                start,
                LEAD,
            )
            .is_ok());
        }
    }

    #[test]
    fn completed_is_terminal_for_every_actor() {
        let start = datetime!(2024-01-08 09:00 UTC);
        let now = datetime!(2024-01-01 00:00 UTC);
        for actor in [Actor::Student, Actor::Provider, Actor::Admin] {
            for target in
                [BookingStatus::Cancelled, BookingStatus::Confirmed, BookingStatus::Pending]
            {
                let err = authorize_transition(
                    BookingStatus::Completed,
                    target,
                    actor,
                    now,
                    start,
                    LEAD,
                )
                .unwrap_err();
                assert!(matches!(err, AppError::InvalidState(_)));
            }
        }
    }

    #[test]
    fn cancelled_is_terminal() {
        let start = datetime!(2024-01-08 09:00 UTC);
        let now = datetime!(2024-01-01 00:00 UTC);
        let err = authorize_transition(
            BookingStatus::Cancelled,
            BookingStatus::Cancelled,
            Actor::Admin,
            now,
            start,
            LEAD,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert!(err.to_string().contains("already cancelled"));
    }

    #[test]
    fn pending_cannot_jump_to_completed() {
        let err = authorize_transition(
            BookingStatus::Pending,
            BookingStatus::Completed,
            Actor::Provider,
            datetime!(2024-01-01 00:00 UTC),
            datetime!(2024-01-08 09:00 UTC),
            LEAD,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn confirmed_completes_by_provider_only() {
        let start = datetime!(2024-01-08 09:00 UTC);
        let now = datetime!(2024-01-08 10:30 UTC);
        assert!(authorize_transition(
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            Actor::Provider,
            now,
            start,
            LEAD,
        )
        .is_ok());
        assert!(authorize_transition(
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            Actor::Student,
            now,
            start,
            LEAD,
        )
        .is_err());
    }
}
