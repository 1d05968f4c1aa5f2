//! # dormant-core
//!
//! Core crate for dormant user tracking. Contains the collaborator traits
//! (account directory, timestamp store, clock), configuration schemas and
//! their resolution into runtime settings, typed identifiers, activity
//! events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other workspace crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
