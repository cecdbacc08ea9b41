//! HTTP API handlers for lectio-offline

pub mod bible;
pub mod health;
pub mod offline;
pub mod sse;

pub use bible::bible_routes;
pub use health::health_routes;
pub use offline::offline_routes;
pub use sse::offline_event_stream;
