//! # Services
//!
//! Read-side business logic sitting between the HTTP handlers and the store.

pub mod unavailability;

pub use unavailability::{UnavailabilityService, UnavailabilityStore};
