//! Core type definitions used across the workspace.

pub mod account;
pub mod id;

pub use account::Account;
pub use id::*;
