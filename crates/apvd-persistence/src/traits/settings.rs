use async_trait::async_trait;

use apvd_api::AppSettings;

#[async_trait]
pub trait AppSettingsRepository: Send + Sync {
    async fn get(&self) -> anyhow::Result<AppSettings>;
}
