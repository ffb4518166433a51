// ABOUTME: Library root for simplesession — re-exports all modules for integration testing.
// ABOUTME: The binary entry point is in main.rs, which uses this crate as a library.

pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod session;

pub use commands::{Outcome, SessionCommands};
pub use error::SessionError;
