//! Core services: remote client, synchronizer, resolver

pub mod bible_api_client;
pub mod hybrid_resolver;
pub mod reference_parser;
pub mod sync_tracker;
pub mod synchronizer;

pub use bible_api_client::BibleApiClient;
pub use hybrid_resolver::{HybridResolver, QueryOutcome};
pub use reference_parser::{parse_reference, VerseReference};
pub use sync_tracker::{OfflineStatus, SyncTracker};
pub use synchronizer::{SyncSummary, Synchronizer};
