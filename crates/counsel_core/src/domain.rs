//! crates/counsel_core/src/domain.rs
//!
//! Defines the pure, core data structures for the counselling marketplace.
//! These structs are independent of any database or transport format.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Parse Error for Wire Strings
//=========================================================================================

/// Returned when a wire string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

//=========================================================================================
// Identity
//=========================================================================================

/// The role a user is registered with. Assigned at signup and trusted thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Admin,
    /// Modeled for counsellor accounts; not exercised by the booking flow.
    Counsellor,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Admin => "admin",
            Self::Counsellor => "counsellor",
        }
    }

    /// The landing page a user of this role is sent to when they hit a page
    /// reserved for another role.
    #[must_use]
    pub const fn home_path(&self) -> &'static str {
        match self {
            Self::Client => "/dashboard",
            Self::Admin => "/admin",
            Self::Counsellor => "/counsellor",
        }
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "admin" => Ok(Self::Admin),
            "counsellor" => Ok(Self::Counsellor),
            _ => Err(ParseEnumError::new("role", s)),
        }
    }
}

/// Represents a user - used throughout the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The acting identity used for authorization checks.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            role: self.role,
        }
    }
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Who is attempting an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

//=========================================================================================
// Slots
//=========================================================================================

/// A weekly time range, e.g. Monday 09:00-10:00.
///
/// Bookings hold a copy of the slot taken from the counsellor's availability
/// at booking time, so later availability edits never reach existing bookings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub day: String,
    pub from: String,
    pub to: String,
}

impl Slot {
    pub fn new(day: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Checks that the day names a weekday and that `from` is strictly before `to`,
    /// both written as `HH:MM`.
    pub fn validate(&self) -> Result<(), String> {
        self.day
            .parse::<Weekday>()
            .map_err(|_| format!("'{}' is not a weekday", self.day))?;
        let from = parse_time(&self.from)?;
        let to = parse_time(&self.to)?;
        if from >= to {
            return Err(format!(
                "slot on {} must start before it ends ({} - {})",
                self.day, self.from, self.to
            ));
        }
        Ok(())
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| format!("'{}' is not a time of day (HH:MM)", value))
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.day, self.from, self.to)
    }
}

//=========================================================================================
// Bookings
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::Cancelled,
        Self::Completed,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Terminal states accept no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl FromStr for BookingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseEnumError::new("booking status", s)),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the client seemed after a session, as recorded by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MoodLabel {
    Excellent,
    Good,
    Neutral,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl MoodLabel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Neutral => "Neutral",
            Self::Low => "Low",
            Self::VeryLow => "Very Low",
        }
    }
}

impl FromStr for MoodLabel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Excellent" => Ok(Self::Excellent),
            "Good" => Ok(Self::Good),
            "Neutral" => Ok(Self::Neutral),
            "Low" => Ok(Self::Low),
            "Very Low" => Ok(Self::VeryLow),
            _ => Err(ParseEnumError::new("mood label", s)),
        }
    }
}

/// Label, note and timestamp travel together; a booking either has all of them or none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodEntry {
    pub label: MoodLabel,
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// One requested or completed counselling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub counsellor_id: Uuid,
    pub counsellor_name: String,
    pub slot: Slot,
    pub status: BookingStatus,
    pub mood: Option<MoodEntry>,
    pub created_at: DateTime<Utc>,
}

/// Orders bookings newest first, breaking ties by id so repeated queries agree.
pub fn sort_newest_first(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// A booking as submitted by a client, before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub client_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub counsellor_id: Uuid,
    pub counsellor_name: String,
    pub slot: Slot,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    /// Materializes the stored record. New bookings always start out pending.
    #[must_use]
    pub fn into_booking(self, id: Uuid) -> Booking {
        Booking {
            id,
            client_id: self.client_id,
            client_name: self.client_name,
            client_email: self.client_email,
            counsellor_id: self.counsellor_id,
            counsellor_name: self.counsellor_name,
            slot: self.slot,
            status: BookingStatus::Pending,
            mood: None,
            created_at: self.created_at,
        }
    }
}

/// A single-document write against a booking.
///
/// `expected` is the status the write was planned against; stores refuse the
/// write when the stored status has moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingUpdate {
    Status {
        expected: BookingStatus,
        status: BookingStatus,
    },
    /// Writes the mood fields together with `status = completed`.
    Mood {
        expected: BookingStatus,
        mood: MoodEntry,
    },
}

impl BookingUpdate {
    #[must_use]
    pub const fn expected(&self) -> BookingStatus {
        match self {
            Self::Status { expected, .. } | Self::Mood { expected, .. } => *expected,
        }
    }

    #[must_use]
    pub const fn resulting_status(&self) -> BookingStatus {
        match self {
            Self::Status { status, .. } => *status,
            Self::Mood { .. } => BookingStatus::Completed,
        }
    }

    /// Applies the write to an in-memory record. Only `status` and `mood` are touched.
    pub fn apply_to(&self, booking: &mut Booking) {
        match self {
            Self::Status { status, .. } => booking.status = *status,
            Self::Mood { mood, .. } => {
                booking.mood = Some(mood.clone());
                booking.status = BookingStatus::Completed;
            }
        }
    }
}

/// Conjunction of optional predicates over bookings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub client_id: Option<Uuid>,
    pub counsellor_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    #[must_use]
    pub fn for_client(client_id: Uuid) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        self.client_id.map_or(true, |id| booking.client_id == id)
            && self.counsellor_id.map_or(true, |id| booking.counsellor_id == id)
            && self.status.map_or(true, |s| booking.status == s)
    }
}

/// An event on the booking change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingChange {
    Created(Booking),
    Updated(Booking),
}

impl BookingChange {
    #[must_use]
    pub const fn booking(&self) -> &Booking {
        match self {
            Self::Created(b) | Self::Updated(b) => b,
        }
    }
}

//=========================================================================================
// Counsellors
//=========================================================================================

/// A service provider profile with advertised weekly availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counsellor {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub bio: String,
    pub availability: Vec<Slot>,
    pub created_at: DateTime<Utc>,
}

impl Counsellor {
    #[must_use]
    pub fn offers(&self, slot: &Slot) -> bool {
        self.availability.iter().any(|s| s == slot)
    }
}

#[derive(Debug, Clone)]
pub struct NewCounsellor {
    pub name: String,
    pub specialization: String,
    pub bio: String,
    pub availability: Vec<Slot>,
}

/// Partial edit of a counsellor profile; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct CounsellorUpdate {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub availability: Option<Vec<Slot>>,
}

impl CounsellorUpdate {
    pub fn apply_to(self, counsellor: &mut Counsellor) {
        if let Some(name) = self.name {
            counsellor.name = name;
        }
        if let Some(specialization) = self.specialization {
            counsellor.specialization = specialization;
        }
        if let Some(bio) = self.bio {
            counsellor.bio = bio;
        }
        if let Some(availability) = self.availability {
            counsellor.availability = availability;
        }
    }
}

//=========================================================================================
// Resources
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Article,
    Video,
    Pdf,
    Link,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Video => "video",
            Self::Pdf => "pdf",
            Self::Link => "link",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(Self::Article),
            "video" => Ok(Self::Video),
            "pdf" => Ok(Self::Pdf),
            "link" => Ok(Self::Link),
            _ => Err(ParseEnumError::new("resource type", s)),
        }
    }
}

/// A curated content pointer. Clients only see it while `is_visible` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub kind: ResourceKind,
    pub category: String,
    pub description: String,
    pub url: String,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewResource {
    pub title: String,
    pub kind: ResourceKind,
    pub category: String,
    pub description: String,
    pub url: String,
    pub is_visible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceUpdate {
    pub title: Option<String>,
    pub kind: Option<ResourceKind>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub is_visible: Option<bool>,
}

impl ResourceUpdate {
    pub fn apply_to(self, resource: &mut Resource) {
        if let Some(title) = self.title {
            resource.title = title;
        }
        if let Some(kind) = self.kind {
            resource.kind = kind;
        }
        if let Some(category) = self.category {
            resource.category = category;
        }
        if let Some(description) = self.description {
            resource.description = description;
        }
        if let Some(url) = self.url {
            resource.url = url;
        }
        if let Some(is_visible) = self.is_visible {
            resource.is_visible = is_visible;
        }
    }
}
