//! Booking service behaviour against the in-memory store.

use uuid::Uuid;

use super::helpers::{monday_nine, setup, user};
use crate::domain::{
    BookingFilter, BookingStatus, BookingUpdate, CounsellorUpdate, MoodLabel, Role, Slot,
};
use crate::error::BookingError;
use crate::ports::{BookingStore, CounsellorStore};

// ============================================================================
// createBooking
// ============================================================================

#[tokio::test]
async fn test_create_booking_starts_pending_with_denormalized_names() {
    let fx = setup().await;

    let booking = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.mood, None);
    assert_eq!(booking.client_id, fx.client.user_id);
    assert_eq!(booking.client_name, "Ada");
    assert_eq!(booking.client_email, "ada@example.com");
    assert_eq!(booking.counsellor_name, "Dr. Reyes");
    assert_eq!(booking.slot, monday_nine());
}

#[tokio::test]
async fn test_create_booking_without_slot_is_validation_error() {
    let fx = setup().await;
    let result = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, None)
        .await;
    assert!(matches!(result, Err(BookingError::Validation(_))));
}

#[tokio::test]
async fn test_create_booking_rejects_unadvertised_slot() {
    let fx = setup().await;
    let result = fx
        .service
        .create_booking(
            &fx.client,
            fx.counsellor_id,
            Some(Slot::new("Sunday", "09:00", "10:00")),
        )
        .await;
    assert!(matches!(result, Err(BookingError::Validation(_))));
}

#[tokio::test]
async fn test_create_booking_unknown_counsellor() {
    let fx = setup().await;
    let result = fx
        .service
        .create_booking(&fx.client, Uuid::new_v4(), Some(monday_nine()))
        .await;
    assert!(matches!(result, Err(BookingError::NotFound(_))));
}

#[tokio::test]
async fn test_admin_cannot_request_booking() {
    let fx = setup().await;
    let result = fx
        .service
        .create_booking(&fx.admin, fx.counsellor_id, Some(monday_nine()))
        .await;
    assert!(matches!(result, Err(BookingError::Authorization { .. })));
}

#[tokio::test]
async fn test_duplicate_requests_are_accepted() {
    let fx = setup().await;
    for _ in 0..2 {
        fx.service
            .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
            .await
            .expect("Failed to create booking");
    }
    let mine = fx
        .service
        .list_bookings(&fx.client.actor(), BookingFilter::default())
        .await
        .expect("Failed to list bookings");
    assert_eq!(mine.len(), 2);
}

#[tokio::test]
async fn test_availability_edit_does_not_touch_existing_booking() {
    let fx = setup().await;
    let booking = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");

    fx.store
        .update_counsellor(
            fx.counsellor_id,
            CounsellorUpdate {
                availability: Some(vec![Slot::new("Friday", "08:00", "09:00")]),
                ..CounsellorUpdate::default()
            },
        )
        .await
        .expect("Failed to update counsellor");

    let stored = fx
        .store
        .get_booking(booking.id)
        .await
        .expect("Failed to load booking");
    assert_eq!(stored.slot, monday_nine());

    let again = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await;
    assert!(matches!(again, Err(BookingError::Validation(_))));
}

// ============================================================================
// updateStatus
// ============================================================================

#[tokio::test]
async fn test_admin_confirms_then_confirm_again_is_invalid() {
    let fx = setup().await;
    let admin = fx.admin.actor();
    let booking = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");

    let confirmed = fx
        .service
        .update_status(booking.id, BookingStatus::Confirmed, &admin)
        .await
        .expect("Failed to confirm");
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let again = fx
        .service
        .update_status(booking.id, BookingStatus::Confirmed, &admin)
        .await;
    assert_eq!(
        again,
        Err(BookingError::InvalidTransition {
            from: BookingStatus::Confirmed,
            to: BookingStatus::Confirmed,
        })
    );
}

#[tokio::test]
async fn test_client_confirm_is_unauthorized() {
    let fx = setup().await;
    let booking = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");

    let result = fx
        .service
        .update_status(booking.id, BookingStatus::Confirmed, &fx.client.actor())
        .await;
    assert!(matches!(result, Err(BookingError::Authorization { .. })));

    let stored = fx.store.get_booking(booking.id).await.expect("Failed to load booking");
    assert_eq!(stored.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_client_cannot_cancel_someone_elses_booking() {
    let fx = setup().await;
    let booking = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");

    let other = user(Role::Client, "Mallory");
    let result = fx
        .service
        .update_status(booking.id, BookingStatus::Cancelled, &other.actor())
        .await;
    assert!(matches!(result, Err(BookingError::Authorization { .. })));
}

#[tokio::test]
async fn test_owner_cancels_confirmed_booking() {
    let fx = setup().await;
    let booking = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");
    fx.service
        .update_status(booking.id, BookingStatus::Confirmed, &fx.admin.actor())
        .await
        .expect("Failed to confirm");

    let cancelled = fx
        .service
        .update_status(booking.id, BookingStatus::Cancelled, &fx.client.actor())
        .await
        .expect("Failed to cancel");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_terminal_states_accept_nothing() {
    let fx = setup().await;
    let admin = fx.admin.actor();

    let cancelled = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");
    fx.service
        .update_status(cancelled.id, BookingStatus::Cancelled, &admin)
        .await
        .expect("Failed to reject");

    let completed = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");
    fx.service
        .update_status(completed.id, BookingStatus::Confirmed, &admin)
        .await
        .expect("Failed to confirm");
    fx.service
        .record_mood(completed.id, MoodLabel::Good, None, &admin)
        .await
        .expect("Failed to record mood");

    for id in [cancelled.id, completed.id] {
        for target in BookingStatus::ALL {
            let result = fx.service.update_status(id, target, &admin).await;
            assert!(
                matches!(result, Err(BookingError::InvalidTransition { .. })),
                "{target}: {result:?}"
            );
        }
    }
}

#[tokio::test]
async fn test_status_change_leaves_identity_fields_alone() {
    let fx = setup().await;
    let before = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");

    let after = fx
        .service
        .update_status(before.id, BookingStatus::Confirmed, &fx.admin.actor())
        .await
        .expect("Failed to confirm");

    assert_eq!(after.client_id, before.client_id);
    assert_eq!(after.counsellor_id, before.counsellor_id);
    assert_eq!(after.slot, before.slot);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.mood, None);
}

#[tokio::test]
async fn test_stale_write_is_a_conflict() {
    let fx = setup().await;
    let booking = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");

    fx.service
        .update_status(booking.id, BookingStatus::Cancelled, &fx.admin.actor())
        .await
        .expect("Failed to reject");

    // A second admin acting on the pending snapshot loses the race.
    let stale = BookingUpdate::Status {
        expected: BookingStatus::Pending,
        status: BookingStatus::Confirmed,
    };
    let result = fx.store.apply_booking_update(booking.id, &stale).await;
    assert!(matches!(result, Err(crate::ports::PortError::Conflict(_))));

    let stored = fx.store.get_booking(booking.id).await.expect("Failed to load booking");
    assert_eq!(stored.status, BookingStatus::Cancelled);
}

// ============================================================================
// recordMood
// ============================================================================

#[tokio::test]
async fn test_record_mood_completes_confirmed_booking() {
    let fx = setup().await;
    let admin = fx.admin.actor();
    let before = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");
    fx.service
        .update_status(before.id, BookingStatus::Confirmed, &admin)
        .await
        .expect("Failed to confirm");

    let after = fx
        .service
        .record_mood(before.id, MoodLabel::Good, Some("Made progress"), &admin)
        .await
        .expect("Failed to record mood");

    assert_eq!(after.status, BookingStatus::Completed);
    let mood = after.mood.expect("Mood missing");
    assert_eq!(mood.label, MoodLabel::Good);
    assert_eq!(mood.note.as_deref(), Some("Made progress"));
    assert!(mood.updated_at >= before.created_at);
    assert_eq!(after.slot, before.slot);
    assert_eq!(after.client_id, before.client_id);
}

#[tokio::test]
async fn test_record_mood_on_pending_changes_nothing() {
    let fx = setup().await;
    let booking = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");

    let result = fx
        .service
        .record_mood(booking.id, MoodLabel::Low, Some("n/a"), &fx.admin.actor())
        .await;
    assert!(matches!(result, Err(BookingError::InvalidTransition { .. })));

    let stored = fx.store.get_booking(booking.id).await.expect("Failed to load booking");
    assert_eq!(stored, booking);
}

#[tokio::test]
async fn test_revising_mood_keeps_booking_completed() {
    let fx = setup().await;
    let admin = fx.admin.actor();
    let booking = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");
    fx.service
        .update_status(booking.id, BookingStatus::Confirmed, &admin)
        .await
        .expect("Failed to confirm");
    fx.service
        .record_mood(booking.id, MoodLabel::Neutral, None, &admin)
        .await
        .expect("Failed to record mood");

    let revised = fx
        .service
        .record_mood(booking.id, MoodLabel::Excellent, Some("Follow-up note"), &admin)
        .await
        .expect("Failed to revise mood");
    assert_eq!(revised.status, BookingStatus::Completed);
    assert_eq!(revised.mood.map(|m| m.label), Some(MoodLabel::Excellent));
}

#[tokio::test]
async fn test_client_cannot_record_mood() {
    let fx = setup().await;
    let booking = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");
    fx.service
        .update_status(booking.id, BookingStatus::Confirmed, &fx.admin.actor())
        .await
        .expect("Failed to confirm");

    let result = fx
        .service
        .record_mood(booking.id, MoodLabel::Good, None, &fx.client.actor())
        .await;
    assert!(matches!(result, Err(BookingError::Authorization { .. })));
}

#[tokio::test]
async fn test_no_booking_has_mood_without_completion() {
    let fx = setup().await;
    let admin = fx.admin.actor();
    for i in 0..4 {
        let booking = fx
            .service
            .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
            .await
            .expect("Failed to create booking");
        if i > 0 {
            let _ = fx
                .service
                .update_status(booking.id, BookingStatus::Confirmed, &admin)
                .await;
        }
        let _ = fx
            .service
            .record_mood(booking.id, MoodLabel::Low, Some("note"), &admin)
            .await;
        if i == 3 {
            let _ = fx
                .service
                .update_status(booking.id, BookingStatus::Cancelled, &admin)
                .await;
        }
    }

    let all = fx
        .service
        .list_bookings(&admin, BookingFilter::default())
        .await
        .expect("Failed to list bookings");
    for booking in all {
        if booking.mood.is_some() {
            assert_eq!(booking.status, BookingStatus::Completed);
        }
    }
}

// ============================================================================
// listBookings / getBooking
// ============================================================================

#[tokio::test]
async fn test_client_listing_is_scoped_to_self() {
    let fx = setup().await;
    let other = user(Role::Client, "Bob");
    fx.service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");
    fx.service
        .create_booking(&other, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");

    // Asking for another client's bookings still yields only your own.
    let spoofed = BookingFilter::for_client(other.user_id);
    let mine = fx
        .service
        .list_bookings(&fx.client.actor(), spoofed)
        .await
        .expect("Failed to list bookings");
    assert_eq!(mine.len(), 1);
    assert!(mine.iter().all(|b| b.client_id == fx.client.user_id));

    let all = fx
        .service
        .list_bookings(&fx.admin.actor(), BookingFilter::default())
        .await
        .expect("Failed to list bookings");
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_repeated_listing_is_identical() {
    let fx = setup().await;
    for _ in 0..5 {
        fx.service
            .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
            .await
            .expect("Failed to create booking");
    }
    let admin = fx.admin.actor();
    let filter = BookingFilter {
        status: Some(BookingStatus::Pending),
        ..BookingFilter::default()
    };
    let first = fx
        .service
        .list_bookings(&admin, filter.clone())
        .await
        .expect("Failed to list bookings");
    let second = fx
        .service
        .list_bookings(&admin, filter)
        .await
        .expect("Failed to list bookings");
    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_counsellor_role_cannot_list_bookings() {
    let fx = setup().await;
    let counsellor = user(Role::Counsellor, "Carl");
    let result = fx
        .service
        .list_bookings(&counsellor.actor(), BookingFilter::default())
        .await;
    assert!(matches!(result, Err(BookingError::Authorization { .. })));
}

#[tokio::test]
async fn test_get_booking_hides_other_clients_bookings() {
    let fx = setup().await;
    let booking = fx
        .service
        .create_booking(&fx.client, fx.counsellor_id, Some(monday_nine()))
        .await
        .expect("Failed to create booking");

    let other = user(Role::Client, "Eve");
    assert!(matches!(
        fx.service.get_booking(booking.id, &other.actor()).await,
        Err(BookingError::Authorization { .. })
    ));
    assert!(fx.service.get_booking(booking.id, &fx.client.actor()).await.is_ok());
    assert!(fx.service.get_booking(booking.id, &fx.admin.actor()).await.is_ok());
    assert!(matches!(
        fx.service.get_booking(Uuid::new_v4(), &fx.admin.actor()).await,
        Err(BookingError::NotFound(_))
    ));
}
