//! Domain layer for the fleet policy engine.
//!
//! This crate contains:
//! - Domain models (policies, assignments, feature settings, maintenance, patch jobs)
//! - The store, job-queue and clock seams the services run against
//! - Resolution, maintenance, patch scheduling and compliance services

pub mod error;
pub mod models;
pub mod services;

pub use error::{ParseEnumError, StoreError};
