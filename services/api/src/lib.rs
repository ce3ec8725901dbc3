//! services/api/src/lib.rs
//!
//! The HTTP service around `counsel_core`: configuration, the Postgres adapter,
//! and the axum router.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;

#[cfg(test)]
mod tests;
