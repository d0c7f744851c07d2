//! Persistence layer for the fleet policy engine.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - The Postgres-backed policy store and job queue

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
pub mod store;

pub use store::{PgNotifyJobQueue, PgPolicyStore};
