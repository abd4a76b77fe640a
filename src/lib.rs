//! # Greenergy Library
//!
//! Ingests ENTSO-E generation unavailability documents into a relational
//! store and serves list, grouped, statistics and export views over them.

pub mod auth;
pub mod capacity;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod extract;
pub mod grouping;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod repositories;
pub mod server;
pub mod services;
pub mod telemetry;
pub mod xml;
pub use migration;
