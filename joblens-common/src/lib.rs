//! # JobLens Common Library
//!
//! Shared code for the JobLens service:
//! - Core data model (Record, BatchItem, sheet kinds)
//! - Progress event types published on the session log bus
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
pub use types::{BatchItem, Record, SheetKind};
