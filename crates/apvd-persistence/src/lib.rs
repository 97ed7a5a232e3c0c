//! Apvd Persistence - Repository contracts and in-memory backend
//!
//! This crate provides:
//! - Repository traits for metadata, data values, configurations, users,
//!   settings, approvals and monitoring
//! - `MemoryStore`, an in-memory backend implementing every trait

pub mod memory;
pub mod traits;

pub use traits::{
    AppSettingsRepository, DataApprovalRepository, DataSetConfigurationRepository,
    DataSetRepository, DataValuesRepository, MonitoringRepository, UserRepository,
};

pub use memory::{ApprovalCall, ApprovalOperation, ApprovalState, MemoryStore, WriteCall, WriteKind};

// Re-export for repository implementors
pub use async_trait::async_trait;
