//! Dataset configuration storage

use async_trait::async_trait;

use apvd_api::DataSetConfiguration;

/// Configurations keyed by their derived code
#[async_trait]
pub trait DataSetConfigurationRepository: Send + Sync {
    /// `ApvdError::NotFound` when no configuration is stored under `code`
    async fn get_by_code(&self, code: &str) -> anyhow::Result<DataSetConfiguration>;

    async fn get_all(&self) -> anyhow::Result<Vec<DataSetConfiguration>>;

    /// Last write wins; no version check is performed
    async fn save(&self, config: &DataSetConfiguration) -> anyhow::Result<()>;

    async fn remove(&self, id: &str) -> anyhow::Result<()>;
}
