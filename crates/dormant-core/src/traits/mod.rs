//! Collaborator traits defined in `dormant-core` and implemented by other crates.

pub mod clock;
pub mod directory;
pub mod timestamp;

pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::AccountDirectory;
pub use timestamp::TimestampStore;
