//! Dataset configuration use cases
//!
//! Reads are filtered by the `read` permission of the current user. Writes are
//! reserved to super administrators and are checked in a fixed order: equal
//! dataset codes, caller role, field validation, duplicate code. The store is
//! only touched once every check has passed.

use std::collections::HashMap;
use std::sync::Arc;

use apvd_api::{ConfigAction, DataSet, DataSetConfiguration, validate_configuration};
use apvd_auth::{UserService, can_user_perform};
use apvd_common::batch::{DEFAULT_CONCURRENCY, DEFAULT_METADATA_CHUNK_SIZE};
use apvd_common::error::{
    CONFIGURATION_DUPLICATED, ONLY_SUPER_ADMIN_REMOVE, ONLY_SUPER_ADMIN_SAVE,
    SAME_ORIGIN_AND_DESTINATION,
};
use apvd_common::{ApvdError, BatchOptions, is_not_found, try_map_chunked};
use apvd_persistence::{DataSetConfigurationRepository, DataSetRepository};

use crate::model::ApprovalConfiguration;

#[derive(Clone)]
pub struct DataSetConfigurationService {
    configurations: Arc<dyn DataSetConfigurationRepository>,
    data_sets: Arc<dyn DataSetRepository>,
    users: UserService,
}

impl DataSetConfigurationService {
    pub fn new(
        configurations: Arc<dyn DataSetConfigurationRepository>,
        data_sets: Arc<dyn DataSetRepository>,
        users: UserService,
    ) -> Self {
        Self {
            configurations,
            data_sets,
            users,
        }
    }

    /// Configurations the current user may read; all of them for super administrators
    pub async fn get_accessible(&self) -> anyhow::Result<Vec<DataSetConfiguration>> {
        let user = self.users.get_current().await?;
        let all = self.configurations.get_all().await?;

        if user.is_super_admin {
            return Ok(all);
        }

        Ok(all
            .into_iter()
            .filter(|config| can_user_perform(config, ConfigAction::Read, &user))
            .collect())
    }

    /// A readable configuration by code
    pub async fn get_by_code(&self, code: &str) -> anyhow::Result<DataSetConfiguration> {
        let user = self.users.get_current().await?;
        let config = self.configurations.get_by_code(code).await?;

        if !can_user_perform(&config, ConfigAction::Read, &user) {
            // hidden configurations look the same as missing ones
            return Err(ApvdError::not_found("DataSetConfiguration", code).into());
        }

        Ok(config)
    }

    /// The configuration whose original dataset has this code, ignoring read grants
    pub async fn get_by_data_set_code(
        &self,
        data_set_code: &str,
    ) -> anyhow::Result<Option<DataSetConfiguration>> {
        Ok(self
            .configurations
            .get_all()
            .await?
            .into_iter()
            .find(|config| config.data_set_original_code == data_set_code))
    }

    pub async fn save(&self, config: &DataSetConfiguration) -> anyhow::Result<()> {
        if config.data_set_original_code == config.data_set_destination_code {
            return Err(ApvdError::InvalidArgument(SAME_ORIGIN_AND_DESTINATION.to_string()).into());
        }

        let user = self.users.get_current().await?;
        if !user.is_super_admin {
            tracing::warn!(username = %user.username, "rejected configuration save");
            return Err(ApvdError::PermissionDenied(ONLY_SUPER_ADMIN_SAVE.to_string()).into());
        }

        let failures = validate_configuration(config);
        if !failures.is_empty() {
            return Err(ApvdError::Validation(
                failures
                    .iter()
                    .map(|failure| format!("{}: {}", failure.property, failure.errors.join(", ")))
                    .collect(),
            )
            .into());
        }

        if self.is_duplicated(config).await? {
            return Err(ApvdError::AlreadyExists(CONFIGURATION_DUPLICATED.to_string()).into());
        }

        self.configurations.save(config).await?;
        tracing::info!(code = %config.code(), id = %config.id, "saved dataset configuration");

        Ok(())
    }

    pub async fn remove(&self, id: &str) -> anyhow::Result<()> {
        let user = self.users.get_current().await?;
        if !user.is_super_admin {
            tracing::warn!(username = %user.username, id, "rejected configuration removal");
            return Err(ApvdError::PermissionDenied(ONLY_SUPER_ADMIN_REMOVE.to_string()).into());
        }

        self.configurations.remove(id).await?;
        tracing::info!(id, "removed dataset configuration");

        Ok(())
    }

    /// Accessible configurations joined with their original dataset
    ///
    /// Configurations whose dataset no longer resolves are dropped.
    pub async fn get_approval_configurations(&self) -> anyhow::Result<Vec<ApprovalConfiguration>> {
        let configurations = self.get_accessible().await?;
        if configurations.is_empty() {
            return Ok(vec![]);
        }

        let codes: Vec<String> = configurations
            .iter()
            .map(|config| config.data_set_original_code.clone())
            .collect();
        let data_sets = self.data_sets.clone();
        let resolved = try_map_chunked(
            codes,
            BatchOptions::new(DEFAULT_METADATA_CHUNK_SIZE, DEFAULT_CONCURRENCY),
            |chunk| {
                let data_sets = data_sets.clone();
                async move { data_sets.get_by_codes(&chunk).await }
            },
        )
        .await?;

        let by_code: HashMap<String, DataSet> = resolved
            .into_iter()
            .map(|data_set| (data_set.code.clone(), data_set))
            .collect();

        let joined: Vec<ApprovalConfiguration> = configurations
            .into_iter()
            .filter_map(|configuration| {
                let data_set = by_code.get(&configuration.data_set_original_code)?.clone();
                Some(ApprovalConfiguration {
                    configuration,
                    data_set,
                })
            })
            .collect();

        tracing::debug!(count = joined.len(), "resolved approval configurations");
        Ok(joined)
    }

    /// Another configuration already owns the derived code
    async fn is_duplicated(&self, config: &DataSetConfiguration) -> anyhow::Result<bool> {
        match self.configurations.get_by_code(&config.code()).await {
            Ok(existing) => Ok(existing.id != config.id),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
