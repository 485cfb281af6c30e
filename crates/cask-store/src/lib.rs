//! Atomic content-addressed file writing for Cask
//!
//! This crate provides the content-addressed [`Writer`]: bytes stream into
//! an exclusively-created staging file while a SHA-256 accumulator tracks
//! them, and the staging file is renamed to its final content-addressed
//! name only once the accumulated digest matches that name. The destination
//! never observably passes through a partially-written state.

pub mod writer;

// Re-export main types
pub use writer::{Writer, DEFAULT_SUFFIX};

use cask_core::CaskError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, CaskError>;
