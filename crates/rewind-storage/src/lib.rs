//! Storage layer for rewind.
//!
//! This crate provides a small synchronous, file-backed storage used by the
//! history engine. Keys are path segments, e.g. `["chg_01h...", "metadata"]`.
//! Documents are JSON files written atomically; blobs are raw byte sidecars
//! stored next to them.

pub mod error;
pub mod json;

pub use error::{StorageError, StorageResult};
pub use json::JsonStorage;
