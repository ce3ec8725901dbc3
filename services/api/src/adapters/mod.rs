//! services/api/src/adapters/mod.rs
//!
//! Concrete implementations of the storage ports.

pub mod db;

pub use db::DbAdapter;
