//! Apvd Common - Shared types, errors, and utilities
//!
//! This crate provides the foundational pieces used across all Apvd components:
//! - Error types and error codes
//! - The `Stats` monoid returned by batched writes
//! - Chunked batch execution with bounded concurrency
//! - Identifier helpers

pub mod batch;
pub mod error;
pub mod stats;
pub mod utils;

// Re-exports for convenience
pub use batch::{BatchOptions, run_chunked, try_map_chunked};
pub use error::{ApvdError, ErrorCode, is_not_found};
pub use stats::{DataValueStats, ErrorMessage, Stats};
pub use utils::{generate_uid, is_blank};

/// Suffix carried by every approval dataset element name
pub const APPROVAL_SUFFIX: &str = "-APVD";

/// Name the platform gives to the default category option combo
pub const DEFAULT_CATEGORY_OPTION_COMBO: &str = "default";

/// Prefix of derived configuration codes
pub const CONFIGURATION_CODE_PREFIX: &str = "DS";
