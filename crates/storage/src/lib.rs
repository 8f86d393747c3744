//! Single-file persistence for per-session state.
//!
//! The whole store is one JSON array of [`PersistedState`] records. Reads
//! never fail (a missing or corrupt file is a cold start); writes go through
//! a sibling temp file and a rename so the destination is never half
//! written.
//!
//! [`PersistedState`]: slotwatch_core::PersistedState

pub mod error;
pub mod response;
pub mod store;

pub use error::StorageError;
pub use response::record_response;
pub use store::{load, prune, prune_expired, save};
