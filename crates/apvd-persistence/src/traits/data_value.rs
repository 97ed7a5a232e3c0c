//! Data value store

use async_trait::async_trait;

use apvd_api::{DataValue, DataValueToPost, DataValuesSelector};
use apvd_common::Stats;

/// Raw value access
///
/// Writes never fail as a whole: a rejected batch is reported through
/// `Stats::error_messages` so a caller can keep going with the next one.
#[async_trait]
pub trait DataValuesRepository: Send + Sync {
    async fn get(&self, selector: &DataValuesSelector) -> anyhow::Result<Vec<DataValue>>;

    async fn save_all(&self, values: &[DataValueToPost]) -> Stats;

    async fn delete_all(&self, values: &[DataValueToPost]) -> Stats;
}
