use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use apvd_api::{AppSettings, DataSetConfiguration, MonitoringValue};
use apvd_common::ApvdError;
use apvd_persistence::{
    AppSettingsRepository, DataSetConfigurationRepository, MonitoringRepository,
};

use super::{CONFIGURATIONS_KEY, HttpGateway, MONITORING_KEY, SETTINGS_KEY};

type ConfigurationMap = BTreeMap<String, DataSetConfiguration>;

impl HttpGateway {
    /// `None` when the key has never been written
    async fn read_key<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let value = self
            .client
            .get_json_optional(&self.data_store_path(key))
            .await?;
        Ok(value)
    }

    /// Create the key when `exists` is false, replace it otherwise
    async fn write_key<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        exists: bool,
    ) -> anyhow::Result<()> {
        let path = self.data_store_path(key);
        let no_query: [(&str, &str); 0] = [];
        let response = if exists {
            self.client.put_json(&path, value).await?
        } else {
            self.client.post_json(&path, &no_query, value).await?
        };

        if !response.is_success() {
            tracing::error!(key, status = response.status, "data store write rejected");
            return Err(ApvdError::Gateway(format!(
                "data store write of {} failed with status {}: {}",
                key, response.status, response.body
            ))
            .into());
        }
        Ok(())
    }

    async fn read_configurations(&self) -> anyhow::Result<(ConfigurationMap, bool)> {
        Ok(match self.read_key::<ConfigurationMap>(CONFIGURATIONS_KEY).await? {
            Some(map) => (map, true),
            None => (ConfigurationMap::new(), false),
        })
    }
}

#[async_trait]
impl DataSetConfigurationRepository for HttpGateway {
    async fn get_by_code(&self, code: &str) -> anyhow::Result<DataSetConfiguration> {
        let (mut configurations, _) = self.read_configurations().await?;
        configurations
            .remove(code)
            .ok_or_else(|| ApvdError::not_found("DataSetConfiguration", code).into())
    }

    async fn get_all(&self) -> anyhow::Result<Vec<DataSetConfiguration>> {
        let (configurations, _) = self.read_configurations().await?;
        Ok(configurations.into_values().collect())
    }

    async fn save(&self, config: &DataSetConfiguration) -> anyhow::Result<()> {
        let (mut configurations, exists) = self.read_configurations().await?;
        // an edited configuration may have moved to a new code
        configurations.retain(|_, stored| stored.id != config.id);
        configurations.insert(config.code(), config.clone());

        tracing::info!(code = %config.code(), id = %config.id, "saving dataset configuration");
        self.write_key(CONFIGURATIONS_KEY, &configurations, exists)
            .await
    }

    async fn remove(&self, id: &str) -> anyhow::Result<()> {
        let (mut configurations, exists) = self.read_configurations().await?;
        let before = configurations.len();
        configurations.retain(|_, stored| stored.id != id);
        if configurations.len() == before {
            return Err(ApvdError::not_found("DataSetConfiguration", id).into());
        }

        tracing::info!(id, "removing dataset configuration");
        self.write_key(CONFIGURATIONS_KEY, &configurations, exists)
            .await
    }
}

#[async_trait]
impl AppSettingsRepository for HttpGateway {
    async fn get(&self) -> anyhow::Result<AppSettings> {
        Ok(self
            .read_key::<AppSettings>(SETTINGS_KEY)
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl MonitoringRepository for HttpGateway {
    async fn get(&self) -> anyhow::Result<Vec<MonitoringValue>> {
        Ok(self
            .read_key::<Vec<MonitoringValue>>(MONITORING_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, values: &[MonitoringValue]) -> anyhow::Result<()> {
        let exists = self
            .read_key::<serde_json::Value>(MONITORING_KEY)
            .await?
            .is_some();
        self.write_key(MONITORING_KEY, values, exists).await
    }
}
