//! Accounts Common
//!
//! Infrastructure shared by the accounts crates and binaries.

pub mod logging;

pub use logging::{init_logging, LogFormat};
