//! Dataset resolution shared by the use cases

use apvd_api::{ConfigAction, DataSet, DataSetConfiguration, DataSetSettings, User};
use apvd_auth::require_permission;
use apvd_common::{ApvdError, is_blank};
use apvd_config::DataSetConfigurationService;
use apvd_persistence::{AppSettingsRepository, DataSetRepository};

/// An original dataset, its approval settings and the approval dataset they name
#[derive(Clone, Debug)]
pub struct DataSetPair {
    pub original: DataSet,
    pub settings: DataSetSettings,
    pub approval: DataSet,
}

pub async fn find_data_set(data_sets: &dyn DataSetRepository, id: &str) -> anyhow::Result<DataSet> {
    data_sets
        .get_by_id(id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApvdError::not_found("DataSet", id).into())
}

/// Resolve the approval counterpart of a dataset
///
/// Fails with `NotFound` when the dataset, its settings or the approval
/// dataset cannot be found.
pub async fn resolve_pair(
    data_sets: &dyn DataSetRepository,
    settings: &dyn AppSettingsRepository,
    data_set_id: &str,
) -> anyhow::Result<DataSetPair> {
    let original = find_data_set(data_sets, data_set_id).await?;

    let app_settings = settings.get().await?;
    let settings = app_settings
        .data_set(&original.code)
        .cloned()
        .ok_or_else(|| ApvdError::not_found("DataSetSettings", original.code.clone()))?;

    let approval = data_sets
        .get_by_name_or_code(&settings.approval_data_set_code)
        .await?;

    Ok(DataSetPair {
        original,
        settings,
        approval,
    })
}

/// Resolve a dataset and its configuration, then check that `user` may perform `action`
pub async fn authorize(
    data_sets: &dyn DataSetRepository,
    configurations: &DataSetConfigurationService,
    user: &User,
    data_set_id: &str,
    action: ConfigAction,
) -> anyhow::Result<(DataSet, DataSetConfiguration)> {
    let data_set = find_data_set(data_sets, data_set_id).await?;
    let config = configurations
        .get_by_data_set_code(&data_set.code)
        .await?
        .ok_or_else(|| ApvdError::not_found("DataSetConfiguration", data_set.code.clone()))?;

    require_permission(&config, action, user)?;

    Ok((data_set, config))
}

/// Org unit and period must both be present to address a cell
pub fn check_cell(org_unit: &str, period: &str) -> Result<(), ApvdError> {
    if is_blank(org_unit) {
        return Err(ApvdError::InvalidArgument("org unit is required".to_string()));
    }
    if is_blank(period) {
        return Err(ApvdError::InvalidArgument("period is required".to_string()));
    }
    Ok(())
}
