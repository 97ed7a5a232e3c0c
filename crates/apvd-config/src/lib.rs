//! Apvd Config - Dataset configuration management
//!
//! This crate provides:
//! - Listing configurations visible to the current user
//! - Guarded save and removal (super administrators only)
//! - Joining configurations with their original dataset metadata

pub mod model;
pub mod service;

pub use model::ApprovalConfiguration;
pub use service::DataSetConfigurationService;
