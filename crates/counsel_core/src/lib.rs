pub mod access;
pub mod domain;
pub mod error;
pub mod feed;
pub mod lifecycle;
pub mod memory;
pub mod ports;
pub mod service;
pub mod stats;
pub mod view;

#[cfg(test)]
mod tests;

pub use access::{check_access, AccessDecision, Identity};
pub use domain::{
    Actor, Booking, BookingChange, BookingFilter, BookingStatus, BookingUpdate, Counsellor,
    CounsellorUpdate, MoodEntry, MoodLabel, NewCounsellor, NewResource, Resource, ResourceKind,
    ResourceUpdate, Role, Slot, User, UserCredentials,
};
pub use error::{BookingError, BookingResult};
pub use feed::{ChangeFeed, Subscription};
pub use memory::InMemoryStore;
pub use ports::{
    BookingStore, CounsellorStore, DatabaseService, PortError, PortResult, ResourceStore,
    UserStore,
};
pub use service::BookingService;
pub use stats::BookingStats;
pub use view::BookingView;
