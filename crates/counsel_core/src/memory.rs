//! crates/counsel_core/src/memory.rs
//!
//! An in-memory implementation of every storage port. Used when the service runs
//! without a database and as the backing store for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::domain::{
    sort_newest_first, AuthSession, Booking, BookingChange, BookingFilter, BookingUpdate, Counsellor,
    CounsellorUpdate, NewBooking, NewCounsellor, NewResource, Resource, ResourceUpdate, Role,
    User, UserCredentials,
};
use crate::feed::{ChangeFeed, Subscription};
use crate::ports::{
    BookingStore, CounsellorStore, PortError, PortResult, ResourceStore, UserStore,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserCredentials>,
    auth_sessions: HashMap<String, AuthSession>,
    bookings: HashMap<Uuid, Booking>,
    counsellors: HashMap<Uuid, Counsellor>,
    resources: HashMap<Uuid, Resource>,
}

/// Process-local store. Every write happens under one lock, so each
/// booking update is atomic with respect to readers and other writers.
/// Booking changes are published before that lock is released.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    booking_feed: ChangeFeed<BookingChange>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The feed booking writes are published on.
    #[must_use]
    pub fn booking_feed(&self) -> &ChangeFeed<BookingChange> {
        &self.booking_feed
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user_with_email(
        &self,
        email: &str,
        name: &str,
        hashed_password: &str,
        role: Role,
    ) -> PortResult<User> {
        let mut tables = self.write();
        if tables.users.values().any(|c| c.user.email == email) {
            return Err(PortError::Conflict(format!("Email {} is already registered", email)));
        }
        let user = User {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            role,
            created_at: Utc::now(),
        };
        tables.users.insert(
            user.user_id,
            UserCredentials {
                user: user.clone(),
                hashed_password: hashed_password.to_string(),
            },
        );
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.read()
            .users
            .values()
            .find(|c| c.user.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.read()
            .users
            .get(&user_id)
            .map(|c| c.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let mut users: Vec<User> = self.read().users.values().map(|c| c.user.clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.email.cmp(&b.email)));
        Ok(users)
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.write().auth_sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let mut tables = self.write();
        match tables.auth_sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            Some(_) => {
                tables.auth_sessions.remove(session_id);
                Err(PortError::Unauthorized)
            }
            None => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.write().auth_sessions.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn create_booking(&self, booking: NewBooking) -> PortResult<Booking> {
        let booking = booking.into_booking(Uuid::new_v4());
        let mut tables = self.write();
        tables.bookings.insert(booking.id, booking.clone());
        // Published under the write lock so feed order matches write order.
        self.booking_feed
            .publish(&BookingChange::Created(booking.clone()));
        Ok(booking)
    }

    async fn get_booking(&self, booking_id: Uuid) -> PortResult<Booking> {
        self.read()
            .bookings
            .get(&booking_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Booking {} not found", booking_id)))
    }

    async fn apply_booking_update(
        &self,
        booking_id: Uuid,
        update: &BookingUpdate,
    ) -> PortResult<Booking> {
        let mut tables = self.write();
        let booking = tables
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| PortError::NotFound(format!("Booking {} not found", booking_id)))?;
        if booking.status != update.expected() {
            return Err(PortError::Conflict(format!(
                "Booking {} is {}, expected {}",
                booking_id,
                booking.status,
                update.expected()
            )));
        }
        update.apply_to(booking);
        let updated = booking.clone();
        self.booking_feed
            .publish(&BookingChange::Updated(updated.clone()));
        Ok(updated)
    }

    async fn query_bookings(&self, filter: &BookingFilter) -> PortResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .read()
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        sort_newest_first(&mut bookings);
        Ok(bookings)
    }

    fn subscribe_bookings(&self, filter: BookingFilter) -> PortResult<Subscription<BookingChange>> {
        Ok(self
            .booking_feed
            .subscribe(move |change: &BookingChange| filter.matches(change.booking())))
    }
}

#[async_trait]
impl CounsellorStore for InMemoryStore {
    async fn create_counsellor(&self, counsellor: NewCounsellor) -> PortResult<Counsellor> {
        let counsellor = Counsellor {
            id: Uuid::new_v4(),
            name: counsellor.name,
            specialization: counsellor.specialization,
            bio: counsellor.bio,
            availability: counsellor.availability,
            created_at: Utc::now(),
        };
        self.write()
            .counsellors
            .insert(counsellor.id, counsellor.clone());
        Ok(counsellor)
    }

    async fn get_counsellor(&self, counsellor_id: Uuid) -> PortResult<Counsellor> {
        self.read()
            .counsellors
            .get(&counsellor_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Counsellor {} not found", counsellor_id)))
    }

    async fn list_counsellors(&self) -> PortResult<Vec<Counsellor>> {
        let mut counsellors: Vec<Counsellor> = self.read().counsellors.values().cloned().collect();
        counsellors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(counsellors)
    }

    async fn update_counsellor(
        &self,
        counsellor_id: Uuid,
        update: CounsellorUpdate,
    ) -> PortResult<Counsellor> {
        let mut tables = self.write();
        let counsellor = tables
            .counsellors
            .get_mut(&counsellor_id)
            .ok_or_else(|| PortError::NotFound(format!("Counsellor {} not found", counsellor_id)))?;
        update.apply_to(counsellor);
        Ok(counsellor.clone())
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn create_resource(&self, resource: NewResource) -> PortResult<Resource> {
        let resource = Resource {
            id: Uuid::new_v4(),
            title: resource.title,
            kind: resource.kind,
            category: resource.category,
            description: resource.description,
            url: resource.url,
            is_visible: resource.is_visible,
            created_at: Utc::now(),
        };
        self.write().resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn get_resource(&self, resource_id: Uuid) -> PortResult<Resource> {
        self.read()
            .resources
            .get(&resource_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Resource {} not found", resource_id)))
    }

    async fn list_resources(&self, visible_only: bool) -> PortResult<Vec<Resource>> {
        let mut resources: Vec<Resource> = self
            .read()
            .resources
            .values()
            .filter(|r| !visible_only || r.is_visible)
            .cloned()
            .collect();
        resources.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(resources)
    }

    async fn update_resource(
        &self,
        resource_id: Uuid,
        update: ResourceUpdate,
    ) -> PortResult<Resource> {
        let mut tables = self.write();
        let resource = tables
            .resources
            .get_mut(&resource_id)
            .ok_or_else(|| PortError::NotFound(format!("Resource {} not found", resource_id)))?;
        update.apply_to(resource);
        Ok(resource.clone())
    }

    async fn delete_resource(&self, resource_id: Uuid) -> PortResult<()> {
        self.write()
            .resources
            .remove(&resource_id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Resource {} not found", resource_id)))
    }
}
