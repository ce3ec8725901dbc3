//! services/api/src/web/protocol.rs
//!
//! Defines the messages the server pushes over the live bookings WebSocket.
//! The client sends nothing but close frames; filters travel in the upgrade query.

use counsel_core::BookingChange;
use serde::Serialize;

use crate::web::rest::BookingResponse;

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The matching bookings at the moment the view opened, newest first.
    Snapshot { bookings: Vec<BookingResponse> },

    /// A booking was created or changed after the snapshot.
    BookingChanged {
        created: bool,
        booking: BookingResponse,
    },

    /// Reports a fatal error to the client, which should display an error message.
    Error { message: String },
}

impl From<BookingChange> for ServerMessage {
    fn from(change: BookingChange) -> Self {
        let (created, booking) = match change {
            BookingChange::Created(b) => (true, b),
            BookingChange::Updated(b) => (false, b),
        };
        Self::BookingChanged {
            created,
            booking: booking.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use counsel_core::{Booking, BookingStatus, Slot};
    use serde_json::Value;
    use uuid::Uuid;

    fn booking() -> Booking {
        Booking {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            client_name: "Ada".to_string(),
            client_email: "ada@example.com".to_string(),
            counsellor_id: Uuid::new_v4(),
            counsellor_name: "Dr. Reyes".to_string(),
            slot: Slot::new("Monday", "09:00", "10:00"),
            status: BookingStatus::Pending,
            mood: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn change_messages_are_tagged() {
        let message = ServerMessage::from(BookingChange::Updated(booking()));
        let json: Value = serde_json::to_value(&message).expect("Message should serialize");
        assert_eq!(json["type"], "booking_changed");
        assert_eq!(json["created"], false);
        assert_eq!(json["booking"]["status"], "pending");
        assert_eq!(json["booking"]["slot"]["day"], "Monday");
    }

    #[test]
    fn snapshot_carries_the_booking_list() {
        let message = ServerMessage::Snapshot {
            bookings: vec![booking().into()],
        };
        let json: Value = serde_json::to_value(&message).expect("Message should serialize");
        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["bookings"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn errors_carry_a_message() {
        let message = ServerMessage::Error {
            message: "Live updates have stopped.".to_string(),
        };
        let json: Value = serde_json::to_value(&message).expect("Message should serialize");
        assert_eq!(json, serde_json::json!({"type": "error", "message": "Live updates have stopped."}));
    }
}
