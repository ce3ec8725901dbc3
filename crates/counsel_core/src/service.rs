//! crates/counsel_core/src/service.rs
//!
//! The booking service: runs the lifecycle rules against the storage ports.
//! Each operation reads the booking, plans a write with `lifecycle`, and hands
//! that single write to the store. Nothing is written when planning fails.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Actor, Booking, BookingChange, BookingFilter, BookingStatus, MoodLabel, NewBooking, Role,
    Slot, User,
};
use crate::error::{BookingError, BookingResult};
use crate::feed::Subscription;
use crate::lifecycle;
use crate::ports::{BookingStore, CounsellorStore};

pub struct BookingService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for BookingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> BookingService<S>
where
    S: BookingStore + CounsellorStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Books `slot` with a counsellor on behalf of `client`.
    ///
    /// The slot must be one the counsellor currently advertises. Client and
    /// counsellor names are copied onto the booking. Duplicate requests for the
    /// same slot are not detected.
    pub async fn create_booking(
        &self,
        client: &User,
        counsellor_id: Uuid,
        slot: Option<Slot>,
    ) -> BookingResult<Booking> {
        if client.role != Role::Client {
            return Err(BookingError::unauthorized("request a booking", client.role));
        }
        let slot = slot.ok_or_else(|| {
            BookingError::Validation("Please select a time slot".to_string())
        })?;
        let counsellor = self.store.get_counsellor(counsellor_id).await?;
        if !counsellor.offers(&slot) {
            warn!(
                counsellor_id = %counsellor_id,
                slot = %slot,
                "Rejected booking for a slot the counsellor does not offer"
            );
            return Err(BookingError::Validation(format!(
                "{} is not available on {}",
                counsellor.name, slot
            )));
        }

        let booking = self
            .store
            .create_booking(NewBooking {
                client_id: client.user_id,
                client_name: client.name.clone(),
                client_email: client.email.clone(),
                counsellor_id: counsellor.id,
                counsellor_name: counsellor.name,
                slot,
                created_at: Utc::now(),
            })
            .await?;
        info!(booking_id = %booking.id, client_id = %client.user_id, "Booking requested");
        Ok(booking)
    }

    /// Fetches one booking. Clients only see their own.
    pub async fn get_booking(&self, booking_id: Uuid, actor: &Actor) -> BookingResult<Booking> {
        let booking = self.store.get_booking(booking_id).await?;
        match actor.role {
            Role::Admin => Ok(booking),
            Role::Client if booking.client_id == actor.user_id => Ok(booking),
            role => Err(BookingError::unauthorized("view this booking", role)),
        }
    }

    /// Moves a booking to `new_status`. Only the status field is written.
    pub async fn update_status(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
        actor: &Actor,
    ) -> BookingResult<Booking> {
        let booking = self.store.get_booking(booking_id).await?;
        let update = lifecycle::plan_status_change(&booking, new_status, actor).map_err(|e| {
            warn!(booking_id = %booking_id, actor = %actor.user_id, error = %e, "Status change rejected");
            e
        })?;
        let updated = self.store.apply_booking_update(booking_id, &update).await?;
        info!(
            booking_id = %booking_id,
            from = %booking.status,
            to = %updated.status,
            actor = %actor.user_id,
            "Booking status changed"
        );
        Ok(updated)
    }

    /// Records how a session went. Completes a confirmed booking; on an
    /// already completed booking only the mood fields change.
    pub async fn record_mood(
        &self,
        booking_id: Uuid,
        label: MoodLabel,
        note: Option<&str>,
        actor: &Actor,
    ) -> BookingResult<Booking> {
        let booking = self.store.get_booking(booking_id).await?;
        let update = lifecycle::plan_mood(&booking, label, note, actor, Utc::now()).map_err(|e| {
            warn!(booking_id = %booking_id, actor = %actor.user_id, error = %e, "Mood recording rejected");
            e
        })?;
        let updated = self.store.apply_booking_update(booking_id, &update).await?;
        info!(
            booking_id = %booking_id,
            mood = label.as_str(),
            revised = booking.status == BookingStatus::Completed,
            "Session mood recorded"
        );
        Ok(updated)
    }

    /// Lists bookings visible to `actor`. A client's filter is always narrowed to
    /// their own bookings.
    pub async fn list_bookings(
        &self,
        actor: &Actor,
        filter: BookingFilter,
    ) -> BookingResult<Vec<Booking>> {
        let filter = scope_filter(actor, filter)?;
        Ok(self.store.query_bookings(&filter).await?)
    }

    /// Opens a live view: the current matching bookings plus a subscription to
    /// later changes. The subscription is opened first so no write between the
    /// two steps is lost.
    pub async fn watch_bookings(
        &self,
        actor: &Actor,
        filter: BookingFilter,
    ) -> BookingResult<(Vec<Booking>, Subscription<BookingChange>)> {
        let filter = scope_filter(actor, filter)?;
        let subscription = self.store.subscribe_bookings(filter.clone())?;
        let snapshot = self.store.query_bookings(&filter).await?;
        Ok((snapshot, subscription))
    }
}

fn scope_filter(actor: &Actor, filter: BookingFilter) -> BookingResult<BookingFilter> {
    match actor.role {
        Role::Admin => Ok(filter),
        Role::Client => Ok(BookingFilter {
            client_id: Some(actor.user_id),
            ..filter
        }),
        Role::Counsellor => Err(BookingError::unauthorized("list bookings", actor.role)),
    }
}
