//! Dataset metadata lookups

use async_trait::async_trait;

use apvd_api::DataSet;

#[async_trait]
pub trait DataSetRepository: Send + Sync {
    /// Datasets with the given id, with data elements and org units resolved
    async fn get_by_id(&self, id: &str) -> anyhow::Result<Vec<DataSet>>;

    /// Single dataset whose name or code matches, `ApvdError::NotFound` otherwise
    async fn get_by_name_or_code(&self, name_or_code: &str) -> anyhow::Result<DataSet>;

    /// Datasets matching any of the codes; unknown codes are skipped
    async fn get_by_codes(&self, codes: &[String]) -> anyhow::Result<Vec<DataSet>>;
}
