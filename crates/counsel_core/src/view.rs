//! crates/counsel_core/src/view.rs
//!
//! A client-side booking list that shows writes immediately and reconciles
//! them once the store answers.
//!
//! `apply_optimistic` marks a booking as pending and remembers the last
//! server-confirmed copy. `confirm` commits the server's answer; `rollback`
//! puts the remembered copy back. Feed events for a pending booking only
//! refresh the remembered copy, so the optimistic value stays on screen until
//! the write settles.

use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{sort_newest_first, Booking, BookingChange, BookingUpdate};

#[derive(Debug, Default)]
pub struct BookingView {
    bookings: Vec<Booking>,
    baselines: HashMap<Uuid, Booking>,
}

impl BookingView {
    #[must_use]
    pub fn new(mut snapshot: Vec<Booking>) -> Self {
        sort_newest_first(&mut snapshot);
        Self {
            bookings: snapshot,
            baselines: HashMap::new(),
        }
    }

    #[must_use]
    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    #[must_use]
    pub fn get(&self, booking_id: Uuid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == booking_id)
    }

    #[must_use]
    pub fn is_pending(&self, booking_id: Uuid) -> bool {
        self.baselines.contains_key(&booking_id)
    }

    /// Shows `update` right away. Returns false when the booking is unknown or
    /// already has a write in flight.
    pub fn apply_optimistic(&mut self, booking_id: Uuid, update: &BookingUpdate) -> bool {
        if self.is_pending(booking_id) {
            return false;
        }
        let Some(booking) = self.bookings.iter_mut().find(|b| b.id == booking_id) else {
            return false;
        };
        self.baselines.insert(booking_id, booking.clone());
        update.apply_to(booking);
        true
    }

    /// The write succeeded; adopt the stored record.
    pub fn confirm(&mut self, stored: Booking) {
        self.baselines.remove(&stored.id);
        self.upsert(stored);
    }

    /// The write failed; restore the last confirmed record.
    pub fn rollback(&mut self, booking_id: Uuid) {
        if let Some(baseline) = self.baselines.remove(&booking_id) {
            self.upsert(baseline);
        }
    }

    /// Reconciles a pending write with its outcome.
    pub fn settle<E>(&mut self, booking_id: Uuid, outcome: Result<Booking, E>) -> Result<(), E> {
        match outcome {
            Ok(stored) => {
                self.confirm(stored);
                Ok(())
            }
            Err(e) => {
                self.rollback(booking_id);
                Err(e)
            }
        }
    }

    /// Folds a change feed event into the view.
    pub fn apply_change(&mut self, change: BookingChange) {
        let booking = match change {
            BookingChange::Created(b) | BookingChange::Updated(b) => b,
        };
        if let Some(baseline) = self.baselines.get_mut(&booking.id) {
            *baseline = booking;
            return;
        }
        self.upsert(booking);
    }

    fn upsert(&mut self, booking: Booking) {
        match self.bookings.iter_mut().find(|b| b.id == booking.id) {
            Some(existing) => *existing = booking,
            None => {
                self.bookings.push(booking);
                sort_newest_first(&mut self.bookings);
            }
        }
    }
}
