//! # Lectio Common Library
//!
//! Shared code for the Lectio services including:
//! - Bible data model (versions, verse records, book descriptors, chapter views)
//! - Database initialization and schema
//! - Sync event types (LectioEvent enum) and the EventBus
//! - Configuration loading and root folder resolution

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
pub use models::BibleVersion;
