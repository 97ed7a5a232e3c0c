//! Repository implementations over the platform REST API
//!
//! `HttpGateway` implements every repository trait of `apvd-persistence`.
//! Configurations, settings and monitoring live in the platform data store
//! under the configured namespace; everything else maps to a metadata, value
//! or approval endpoint.

mod approval;
mod data_store;
mod data_value;
mod metadata;
mod user;

use std::sync::Arc;

use apvd_common::BatchOptions;

use crate::error::Result;
use crate::http::{ApvdHttpClient, HttpClientConfig};

/// Data store key of the configuration map
pub const CONFIGURATIONS_KEY: &str = "dataSetConfigurations";

/// Data store key of the application settings
pub const SETTINGS_KEY: &str = "settings";

/// Data store key of the monitoring list
pub const MONITORING_KEY: &str = "monitoring";

#[derive(Clone)]
pub struct HttpGateway {
    client: Arc<ApvdHttpClient>,
    options: BatchOptions,
}

impl HttpGateway {
    pub fn new(client: Arc<ApvdHttpClient>, options: BatchOptions) -> Self {
        Self { client, options }
    }

    pub fn from_config(config: HttpClientConfig, options: BatchOptions) -> Result<Self> {
        Ok(Self::new(Arc::new(ApvdHttpClient::new(config)?), options))
    }

    pub fn client(&self) -> &ApvdHttpClient {
        &self.client
    }

    fn data_store_path(&self, key: &str) -> String {
        format!(
            "/api/dataStore/{}/{}",
            self.client.config().data_store_namespace,
            key
        )
    }
}
