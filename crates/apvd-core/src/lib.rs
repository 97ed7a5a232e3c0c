//! Apvd Core - Reconciliation and approval workflow engine
//!
//! This crate provides:
//! - `DiffEngine`: discrepancies between an original dataset and its approval copy
//! - `ApprovalReplicator`: writes accepted values into the approval dataset
//! - `ApprovalWorkflow`: permission-gated workflow actions over approval items
//! - `ApproveUseCase`: replication restricted to assigned org units
//! - `MonitoringService`: follow-up flags per dataset, org unit and period

pub mod approve;
pub mod context;
pub mod diff;
pub mod lookup;
pub mod monitoring;
pub mod replicate;
pub mod workflow;

pub use approve::ApproveUseCase;
pub use context::{CoreServices, Repositories};
pub use diff::{DiffEngine, is_valid_approval_data_element};
pub use lookup::DataSetPair;
pub use monitoring::MonitoringService;
pub use replicate::ApprovalReplicator;
pub use workflow::{ApprovalWorkflow, DataSetOutcome, WorkflowReport};
