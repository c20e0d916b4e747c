//! Core plumbing shared by every command
//!
//! - **config**: coherence.toml parsing, validation and overrides
//! - **context**: run context built once in main and passed to commands
//! - **error**: error types with contextual help messages and exit codes

pub mod config;
pub mod context;
pub mod error;
