//! crates/counsel_core/src/lifecycle.rs
//!
//! Booking lifecycle rules. Pure functions: given a booking, an actor and a
//! request, decide whether it is allowed and which single-document write it becomes.
//!
//! ```text
//! pending ──▶ confirmed ──▶ completed
//!    │            │
//!    └──────▶ cancelled ◀┘
//! ```

use chrono::{DateTime, Utc};

use crate::domain::{Actor, Booking, BookingStatus, BookingUpdate, MoodEntry, MoodLabel, Role};
use crate::error::{BookingError, BookingResult};

impl BookingStatus {
    /// Validates that `to` is directly reachable from this status.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::InvalidTransition` for terminal sources, self
    /// transitions and any edge outside the lifecycle graph.
    pub fn validate_transition(&self, to: Self) -> BookingResult<()> {
        let valid = match self {
            Self::Pending => matches!(to, Self::Confirmed | Self::Cancelled),
            Self::Confirmed => matches!(to, Self::Cancelled | Self::Completed),
            Self::Cancelled | Self::Completed => false,
        };
        if valid {
            Ok(())
        } else {
            Err(BookingError::InvalidTransition { from: *self, to })
        }
    }
}

/// Checks whether `actor` may request `target` on `booking`, ignoring the
/// current status. Clients may only cancel their own bookings; admins may
/// request anything.
pub fn authorize_status_change(
    booking: &Booking,
    target: BookingStatus,
    actor: &Actor,
) -> BookingResult<()> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Client if target != BookingStatus::Cancelled => Err(BookingError::unauthorized(
            match target {
                BookingStatus::Confirmed => "confirm a booking",
                BookingStatus::Completed => "complete a booking",
                _ => "change a booking to this status",
            },
            actor.role,
        )),
        Role::Client if booking.client_id != actor.user_id => Err(BookingError::unauthorized(
            "cancel another client's booking",
            actor.role,
        )),
        Role::Client => Ok(()),
        Role::Counsellor => Err(BookingError::unauthorized(
            "change a booking's status",
            actor.role,
        )),
    }
}

/// Plans a status write. Authorization is checked before reachability.
pub fn plan_status_change(
    booking: &Booking,
    target: BookingStatus,
    actor: &Actor,
) -> BookingResult<BookingUpdate> {
    authorize_status_change(booking, target, actor)?;
    booking.status.validate_transition(target)?;
    Ok(BookingUpdate::Status {
        expected: booking.status,
        status: target,
    })
}

/// Plans a mood write. Admin only.
///
/// On a confirmed booking this completes the session. On a completed booking
/// it revises the mood fields and leaves the status where it is.
pub fn plan_mood(
    booking: &Booking,
    label: MoodLabel,
    note: Option<&str>,
    actor: &Actor,
    now: DateTime<Utc>,
) -> BookingResult<BookingUpdate> {
    if actor.role != Role::Admin {
        return Err(BookingError::unauthorized("record a session mood", actor.role));
    }
    match booking.status {
        BookingStatus::Confirmed | BookingStatus::Completed => Ok(BookingUpdate::Mood {
            expected: booking.status,
            mood: MoodEntry {
                label,
                note: normalize_note(note),
                updated_at: now,
            },
        }),
        from => Err(BookingError::InvalidTransition {
            from,
            to: BookingStatus::Completed,
        }),
    }
}

fn normalize_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewBooking, Slot};
    use uuid::Uuid;

    fn booking_owned_by(client_id: Uuid, status: BookingStatus) -> Booking {
        let mut booking = NewBooking {
            client_id,
            client_name: "Ada".to_string(),
            client_email: "ada@example.com".to_string(),
            counsellor_id: Uuid::new_v4(),
            counsellor_name: "Dr. Reyes".to_string(),
            slot: Slot::new("Monday", "09:00", "10:00"),
            created_at: Utc::now(),
        }
        .into_booking(Uuid::new_v4());
        booking.status = status;
        booking
    }

    fn admin() -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_lifecycle_graph() {
        use BookingStatus::*;
        let allowed = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Cancelled),
            (Confirmed, Completed),
        ];
        for from in BookingStatus::ALL {
            for to in BookingStatus::ALL {
                let result = from.validate_transition(to);
                if allowed.contains(&(from, to)) {
                    assert!(result.is_ok(), "{from} -> {to} should be allowed");
                } else {
                    assert_eq!(result, Err(BookingError::InvalidTransition { from, to }));
                }
            }
        }
    }

    #[test]
    fn test_client_cannot_confirm_in_any_state() {
        let client = Uuid::new_v4();
        let actor = Actor {
            user_id: client,
            role: Role::Client,
        };
        for status in BookingStatus::ALL {
            let booking = booking_owned_by(client, status);
            let result = plan_status_change(&booking, BookingStatus::Confirmed, &actor);
            assert!(
                matches!(result, Err(BookingError::Authorization { .. })),
                "status {status}: {result:?}"
            );
        }
    }

    #[test]
    fn test_client_cancels_only_own_booking() {
        let owner = Uuid::new_v4();
        let booking = booking_owned_by(owner, BookingStatus::Confirmed);

        let stranger = Actor {
            user_id: Uuid::new_v4(),
            role: Role::Client,
        };
        assert!(matches!(
            plan_status_change(&booking, BookingStatus::Cancelled, &stranger),
            Err(BookingError::Authorization { .. })
        ));

        let owner = Actor {
            user_id: owner,
            role: Role::Client,
        };
        assert_eq!(
            plan_status_change(&booking, BookingStatus::Cancelled, &owner),
            Ok(BookingUpdate::Status {
                expected: BookingStatus::Confirmed,
                status: BookingStatus::Cancelled,
            })
        );
    }

    #[test]
    fn test_owner_cannot_cancel_completed_booking() {
        let owner = Uuid::new_v4();
        let booking = booking_owned_by(owner, BookingStatus::Completed);
        let actor = Actor {
            user_id: owner,
            role: Role::Client,
        };
        assert_eq!(
            plan_status_change(&booking, BookingStatus::Cancelled, &actor),
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Completed,
                to: BookingStatus::Cancelled,
            })
        );
    }

    #[test]
    fn test_counsellor_role_cannot_change_status() {
        let booking = booking_owned_by(Uuid::new_v4(), BookingStatus::Pending);
        let actor = Actor {
            user_id: Uuid::new_v4(),
            role: Role::Counsellor,
        };
        assert!(matches!(
            plan_status_change(&booking, BookingStatus::Confirmed, &actor),
            Err(BookingError::Authorization { .. })
        ));
    }

    #[test]
    fn test_admin_confirming_twice_is_invalid() {
        let booking = booking_owned_by(Uuid::new_v4(), BookingStatus::Confirmed);
        assert_eq!(
            plan_status_change(&booking, BookingStatus::Confirmed, &admin()),
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Confirmed,
            })
        );
    }

    #[test]
    fn test_mood_on_confirmed_completes() {
        let booking = booking_owned_by(Uuid::new_v4(), BookingStatus::Confirmed);
        let now = Utc::now();
        let update = plan_mood(&booking, MoodLabel::Good, Some("  Made progress "), &admin(), now);
        assert_eq!(
            update,
            Ok(BookingUpdate::Mood {
                expected: BookingStatus::Confirmed,
                mood: MoodEntry {
                    label: MoodLabel::Good,
                    note: Some("Made progress".to_string()),
                    updated_at: now,
                },
            })
        );
    }

    #[test]
    fn test_mood_on_completed_revises_fields_only() {
        let booking = booking_owned_by(Uuid::new_v4(), BookingStatus::Completed);
        let update = plan_mood(&booking, MoodLabel::Low, Some(""), &admin(), Utc::now());
        match update {
            Ok(BookingUpdate::Mood { expected, mood }) => {
                assert_eq!(expected, BookingStatus::Completed);
                assert_eq!(mood.note, None);
            }
            other => panic!("Expected a mood revision, got: {other:?}"),
        }
    }

    #[test]
    fn test_mood_rejected_before_confirmation_and_after_cancellation() {
        for status in [BookingStatus::Pending, BookingStatus::Cancelled] {
            let booking = booking_owned_by(Uuid::new_v4(), status);
            assert_eq!(
                plan_mood(&booking, MoodLabel::Neutral, None, &admin(), Utc::now()),
                Err(BookingError::InvalidTransition {
                    from: status,
                    to: BookingStatus::Completed,
                })
            );
        }
    }

    #[test]
    fn test_mood_requires_admin() {
        let owner = Uuid::new_v4();
        let booking = booking_owned_by(owner, BookingStatus::Confirmed);
        let actor = Actor {
            user_id: owner,
            role: Role::Client,
        };
        assert!(matches!(
            plan_mood(&booking, MoodLabel::Good, None, &actor, Utc::now()),
            Err(BookingError::Authorization { .. })
        ));
    }
}
