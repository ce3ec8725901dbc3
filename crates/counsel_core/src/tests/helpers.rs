//! Shared fixtures for booking service tests.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{NewCounsellor, Role, Slot, User};
use crate::memory::InMemoryStore;
use crate::ports::CounsellorStore;
use crate::service::BookingService;

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub service: BookingService<InMemoryStore>,
    pub counsellor_id: Uuid,
    pub client: User,
    pub admin: User,
}

pub fn monday_nine() -> Slot {
    Slot::new("Monday", "09:00", "10:00")
}

pub fn user(role: Role, name: &str) -> User {
    User {
        user_id: Uuid::new_v4(),
        email: format!("{}@example.com", name.to_lowercase()),
        name: name.to_string(),
        role,
        created_at: Utc::now(),
    }
}

pub async fn setup() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let counsellor = store
        .create_counsellor(NewCounsellor {
            name: "Dr. Reyes".to_string(),
            specialization: "Anxiety".to_string(),
            bio: "Ten years of CBT practice.".to_string(),
            availability: vec![monday_nine(), Slot::new("Thursday", "15:00", "16:00")],
        })
        .await
        .expect("Failed to create counsellor");

    Fixture {
        service: BookingService::new(Arc::clone(&store)),
        store,
        counsellor_id: counsellor.id,
        client: user(Role::Client, "Ada"),
        admin: user(Role::Admin, "Grace"),
    }
}
