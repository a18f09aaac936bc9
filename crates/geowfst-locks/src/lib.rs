//! Persisted WFS-T lock sessions.
//!
//! A locked editing session remembers, across process restarts, which
//! features of a feature type are held under a server lock and what was
//! done to them locally:
//!
//! - **Sessions and buckets**: [`LockSession`] tracks every locked id in
//!   exactly one of `unchanged`, `updated`, `inserted` or `deleted`.
//! - **Persistence**: [`LockSessionStore`] writes sessions into any
//!   [`KeyValueStore`] and maintains a pointer index for cheap listing,
//!   search and expiry checks.
//! - **Expiry**: [`SweepTask`] deletes lapsed sessions on a fixed
//!   interval until shut down.
//!
//! The crate never interprets feature payloads; they are carried as
//! opaque serialized strings.

pub mod error;
pub mod session;
pub mod storage;
pub mod store;
pub mod sweeper;

// Re-export commonly used types
pub use error::{LockError, Result};
pub use session::{EditedFeature, InsertedFeature, LockSession};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use store::{LockPointer, LockQuery, LockQueryResult, LockSessionStore, ObserverHandle};
pub use sweeper::{DEFAULT_SWEEP_PERIOD, SweepTask};
