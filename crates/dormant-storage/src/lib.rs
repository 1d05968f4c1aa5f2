//! # dormant-storage
//!
//! Durable adapters for dormant user tracking: a local filesystem
//! timestamp store, a file-backed account directory with a read cache,
//! in-memory implementations of both, the [`DurableRecordStore`] facade
//! used by the activity cache, and deployment epoch persistence.

pub mod directory;
pub mod epoch;
pub mod local;
pub mod memory;
pub mod store;

pub use directory::FileAccountDirectory;
pub use epoch::EpochStore;
pub use local::LocalTimestampStore;
pub use memory::{MemoryAccountDirectory, MemoryTimestampStore};
pub use store::DurableRecordStore;
