//! crates/counsel_core/src/stats.rs
//!
//! Dashboard figures derived from a booking snapshot.

use std::collections::BTreeMap;

use crate::domain::{Booking, BookingStatus, MoodLabel};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingStats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub completed: usize,
    pub moods: BTreeMap<MoodLabel, usize>,
}

impl BookingStats {
    #[must_use]
    pub fn from_bookings(bookings: &[Booking]) -> Self {
        let mut stats = Self::default();
        for booking in bookings {
            stats.total += 1;
            match booking.status {
                BookingStatus::Pending => stats.pending += 1,
                BookingStatus::Confirmed => stats.confirmed += 1,
                BookingStatus::Cancelled => stats.cancelled += 1,
                BookingStatus::Completed => stats.completed += 1,
            }
            if let Some(mood) = &booking.mood {
                *stats.moods.entry(mood.label).or_insert(0) += 1;
            }
        }
        stats
    }
}
