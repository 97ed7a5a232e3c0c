//! Completion and approval commands
//!
//! The platform records `completed`/`approved` facts; these repositories only
//! issue the commands and report whether the platform accepted them.

use async_trait::async_trait;

use apvd_api::{DataApprovalItemIdentifier, MonitoringValue};

#[async_trait]
pub trait DataApprovalRepository: Send + Sync {
    /// Register completion
    async fn complete(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool>;

    /// Remove completion registration
    async fn incomplete(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool>;

    /// Workflow-level approval
    async fn approve(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool>;

    async fn unapprove(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait MonitoringRepository: Send + Sync {
    async fn get(&self) -> anyhow::Result<Vec<MonitoringValue>>;

    async fn save(&self, values: &[MonitoringValue]) -> anyhow::Result<()>;
}
