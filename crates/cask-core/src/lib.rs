//! # cask-core
//!
//! Core types shared across the Cask crates.
//!
//! This crate provides:
//! - `Oid` and `OidHasher`: hex-encoded content identifiers and the
//!   streaming digest accumulator behind them
//! - `CaskError`: the unified error type for content-addressed writes
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `oid`: content identifier types and hashing
//! - `error`: error types and result aliases

pub mod error;
pub mod oid;

// Re-export commonly used types
pub use error::{CaskError, CaskResult};
pub use oid::{Oid, OidHasher};
