//! Shared utilities for rewind.
//!
//! This crate provides common utilities used across the rewind workspace:
//! - ULID-based identifier generation for revisions and changes
//! - Logging setup with tracing
//! - Path utilities
//! - RAII-based timing for operation measurement

pub mod id;
pub mod log;
pub mod path;
pub mod timing;

pub use id::{IdPrefix, Identifier};
pub use timing::TimingGuard;
