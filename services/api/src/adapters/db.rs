//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the storage ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Booking writes are published on an in-process change feed after they commit,
//! so live views only see writes made through this process. Writes and their
//! publishes are serialized, so subscribers see changes in commit order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use counsel_core::domain::{
    Booking, BookingChange, BookingFilter, BookingStatus, BookingUpdate, Counsellor,
    CounsellorUpdate, MoodEntry, NewBooking, NewCounsellor, NewResource, Resource,
    ResourceUpdate, Role, Slot, User, UserCredentials,
};
use counsel_core::feed::{ChangeFeed, Subscription};
use counsel_core::ports::{
    BookingStore, CounsellorStore, PortError, PortResult, ResourceStore, UserStore,
};
use sqlx::{types::Json, FromRow, PgPool};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    booking_feed: ChangeFeed<BookingChange>,
    /// Held from a booking write until its change is published.
    booking_writes: Arc<Mutex<()>>,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            booking_feed: ChangeFeed::new(),
            booking_writes: Arc::new(Mutex::new(())),
        }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => unexpected(e),
    }
}

fn corrupt(column: &str, value: &str) -> PortError {
    PortError::Unexpected(format!("Stored {} '{}' is not recognised", column, value))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "user_id, email, name, role, hashed_password, created_at";

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    name: String,
    role: String,
    hashed_password: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<UserCredentials> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|_| corrupt("role", &self.role))?;
        Ok(UserCredentials {
            user: User {
                user_id: self.user_id,
                email: self.email,
                name: self.name,
                role,
                created_at: self.created_at,
            },
            hashed_password: self.hashed_password,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, client_id, client_name, client_email, counsellor_id, \
    counsellor_name, slot_day, slot_from, slot_to, status, mood_label, mood_note, \
    mood_updated_at, created_at";

#[derive(FromRow)]
struct BookingRecord {
    id: Uuid,
    client_id: Uuid,
    client_name: String,
    client_email: String,
    counsellor_id: Uuid,
    counsellor_name: String,
    slot_day: String,
    slot_from: String,
    slot_to: String,
    status: String,
    mood_label: Option<String>,
    mood_note: Option<String>,
    mood_updated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}
impl BookingRecord {
    fn to_domain(self) -> PortResult<Booking> {
        let status = self
            .status
            .parse::<BookingStatus>()
            .map_err(|_| corrupt("booking status", &self.status))?;
        let mood = match (self.mood_label, self.mood_updated_at) {
            (Some(label), Some(updated_at)) => Some(MoodEntry {
                label: label.parse().map_err(|_| corrupt("mood label", &label))?,
                note: self.mood_note,
                updated_at,
            }),
            _ => None,
        };
        Ok(Booking {
            id: self.id,
            client_id: self.client_id,
            client_name: self.client_name,
            client_email: self.client_email,
            counsellor_id: self.counsellor_id,
            counsellor_name: self.counsellor_name,
            slot: Slot::new(self.slot_day, self.slot_from, self.slot_to),
            status,
            mood,
            created_at: self.created_at,
        })
    }
}

const COUNSELLOR_COLUMNS: &str = "id, name, specialization, bio, availability, created_at";

#[derive(FromRow)]
struct CounsellorRecord {
    id: Uuid,
    name: String,
    specialization: String,
    bio: String,
    availability: Json<Vec<Slot>>,
    created_at: DateTime<Utc>,
}
impl CounsellorRecord {
    fn to_domain(self) -> Counsellor {
        Counsellor {
            id: self.id,
            name: self.name,
            specialization: self.specialization,
            bio: self.bio,
            availability: self.availability.0,
            created_at: self.created_at,
        }
    }
}

const RESOURCE_COLUMNS: &str =
    "id, title, kind, category, description, url, is_visible, created_at";

#[derive(FromRow)]
struct ResourceRecord {
    id: Uuid,
    title: String,
    kind: String,
    category: String,
    description: String,
    url: String,
    is_visible: bool,
    created_at: DateTime<Utc>,
}
impl ResourceRecord {
    fn to_domain(self) -> PortResult<Resource> {
        Ok(Resource {
            kind: self
                .kind
                .parse()
                .map_err(|_| corrupt("resource type", &self.kind))?,
            id: self.id,
            title: self.title,
            category: self.category,
            description: self.description,
            url: self.url,
            is_visible: self.is_visible,
            created_at: self.created_at,
        })
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        name: &str,
        hashed_password: &str,
        role: Role,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (user_id, email, name, role, hashed_password) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(role.as_str())
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::Conflict(format!("Email {} is already registered", email))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain()?.user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User with email {} not found", email)))?
        .to_domain()
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", user_id)))?;
        Ok(record.to_domain()?.user)
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, email ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records
            .into_iter()
            .map(|r| r.to_domain().map(|c| c.user))
            .collect()
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `BookingStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl BookingStore for DbAdapter {
    async fn create_booking(&self, booking: NewBooking) -> PortResult<Booking> {
        let _write = self.booking_writes.lock().await;
        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "INSERT INTO bookings (id, client_id, client_name, client_email, counsellor_id, \
             counsellor_name, slot_day, slot_from, slot_to, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(booking.client_id)
        .bind(&booking.client_name)
        .bind(&booking.client_email)
        .bind(booking.counsellor_id)
        .bind(&booking.counsellor_name)
        .bind(&booking.slot.day)
        .bind(&booking.slot.from)
        .bind(&booking.slot.to)
        .bind(BookingStatus::Pending.as_str())
        .bind(booking.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        let booking = record.to_domain()?;
        self.booking_feed
            .publish(&BookingChange::Created(booking.clone()));
        Ok(booking)
    }

    async fn get_booking(&self, booking_id: Uuid) -> PortResult<Booking> {
        sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Booking {} not found", booking_id)))?
        .to_domain()
    }

    async fn apply_booking_update(
        &self,
        booking_id: Uuid,
        update: &BookingUpdate,
    ) -> PortResult<Booking> {
        let _write = self.booking_writes.lock().await;
        // One statement per write; the status predicate is the precondition.
        let record = match update {
            BookingUpdate::Status { expected, status } => {
                sqlx::query_as::<_, BookingRecord>(&format!(
                    "UPDATE bookings SET status = $3 WHERE id = $1 AND status = $2 \
                     RETURNING {BOOKING_COLUMNS}"
                ))
                .bind(booking_id)
                .bind(expected.as_str())
                .bind(status.as_str())
                .fetch_optional(&self.pool)
                .await
            }
            BookingUpdate::Mood { expected, mood } => {
                sqlx::query_as::<_, BookingRecord>(&format!(
                    "UPDATE bookings SET status = $3, mood_label = $4, mood_note = $5, \
                     mood_updated_at = $6 WHERE id = $1 AND status = $2 \
                     RETURNING {BOOKING_COLUMNS}"
                ))
                .bind(booking_id)
                .bind(expected.as_str())
                .bind(BookingStatus::Completed.as_str())
                .bind(mood.label.as_str())
                .bind(mood.note.as_deref())
                .bind(mood.updated_at)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(unexpected)?;

        let Some(record) = record else {
            let current = self.get_booking(booking_id).await?;
            debug!(booking_id = %booking_id, current = %current.status, "Booking write precondition failed");
            return Err(PortError::Conflict(format!(
                "Booking {} is {}, expected {}",
                booking_id,
                current.status,
                update.expected()
            )));
        };

        let booking = record.to_domain()?;
        self.booking_feed
            .publish(&BookingChange::Updated(booking.clone()));
        Ok(booking)
    }

    async fn query_bookings(&self, filter: &BookingFilter) -> PortResult<Vec<Booking>> {
        let records = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE ($1::uuid IS NULL OR client_id = $1) \
               AND ($2::uuid IS NULL OR counsellor_id = $2) \
               AND ($3::text IS NULL OR status = $3) \
             ORDER BY created_at DESC, id ASC"
        ))
        .bind(filter.client_id)
        .bind(filter.counsellor_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(BookingRecord::to_domain).collect()
    }

    fn subscribe_bookings(&self, filter: BookingFilter) -> PortResult<Subscription<BookingChange>> {
        Ok(self
            .booking_feed
            .subscribe(move |change: &BookingChange| filter.matches(change.booking())))
    }
}

//=========================================================================================
// `CounsellorStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CounsellorStore for DbAdapter {
    async fn create_counsellor(&self, counsellor: NewCounsellor) -> PortResult<Counsellor> {
        let record = sqlx::query_as::<_, CounsellorRecord>(&format!(
            "INSERT INTO counsellors (id, name, specialization, bio, availability) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COUNSELLOR_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&counsellor.name)
        .bind(&counsellor.specialization)
        .bind(&counsellor.bio)
        .bind(Json(&counsellor.availability))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_counsellor(&self, counsellor_id: Uuid) -> PortResult<Counsellor> {
        let record = sqlx::query_as::<_, CounsellorRecord>(&format!(
            "SELECT {COUNSELLOR_COLUMNS} FROM counsellors WHERE id = $1"
        ))
        .bind(counsellor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Counsellor {} not found", counsellor_id)))?;
        Ok(record.to_domain())
    }

    async fn list_counsellors(&self) -> PortResult<Vec<Counsellor>> {
        let records = sqlx::query_as::<_, CounsellorRecord>(&format!(
            "SELECT {COUNSELLOR_COLUMNS} FROM counsellors ORDER BY name ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(CounsellorRecord::to_domain).collect())
    }

    async fn update_counsellor(
        &self,
        counsellor_id: Uuid,
        update: CounsellorUpdate,
    ) -> PortResult<Counsellor> {
        let record = sqlx::query_as::<_, CounsellorRecord>(&format!(
            "UPDATE counsellors SET \
               name = COALESCE($2, name), \
               specialization = COALESCE($3, specialization), \
               bio = COALESCE($4, bio), \
               availability = COALESCE($5, availability) \
             WHERE id = $1 RETURNING {COUNSELLOR_COLUMNS}"
        ))
        .bind(counsellor_id)
        .bind(update.name)
        .bind(update.specialization)
        .bind(update.bio)
        .bind(update.availability.map(Json))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Counsellor {} not found", counsellor_id)))?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// `ResourceStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ResourceStore for DbAdapter {
    async fn create_resource(&self, resource: NewResource) -> PortResult<Resource> {
        sqlx::query_as::<_, ResourceRecord>(&format!(
            "INSERT INTO resources (id, title, kind, category, description, url, is_visible) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&resource.title)
        .bind(resource.kind.as_str())
        .bind(&resource.category)
        .bind(&resource.description)
        .bind(&resource.url)
        .bind(resource.is_visible)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?
        .to_domain()
    }

    async fn get_resource(&self, resource_id: Uuid) -> PortResult<Resource> {
        sqlx::query_as::<_, ResourceRecord>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1"
        ))
        .bind(resource_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Resource {} not found", resource_id)))?
        .to_domain()
    }

    async fn list_resources(&self, visible_only: bool) -> PortResult<Vec<Resource>> {
        let records = sqlx::query_as::<_, ResourceRecord>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources \
             WHERE ($1 = FALSE OR is_visible) ORDER BY created_at DESC, id ASC"
        ))
        .bind(visible_only)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(ResourceRecord::to_domain).collect()
    }

    async fn update_resource(
        &self,
        resource_id: Uuid,
        update: ResourceUpdate,
    ) -> PortResult<Resource> {
        sqlx::query_as::<_, ResourceRecord>(&format!(
            "UPDATE resources SET \
               title = COALESCE($2, title), \
               kind = COALESCE($3, kind), \
               category = COALESCE($4, category), \
               description = COALESCE($5, description), \
               url = COALESCE($6, url), \
               is_visible = COALESCE($7, is_visible) \
             WHERE id = $1 RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(resource_id)
        .bind(update.title)
        .bind(update.kind.map(|k| k.as_str()))
        .bind(update.category)
        .bind(update.description)
        .bind(update.url)
        .bind(update.is_visible)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Resource {} not found", resource_id)))?
        .to_domain()
    }

    async fn delete_resource(&self, resource_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(resource_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Resource {} not found", resource_id)));
        }
        Ok(())
    }
}
