//! Monitoring flags
//!
//! The whole list is read, patched and written back. Entries are keyed by
//! (org unit, period, dataset); updating an existing key replaces its flag.

use std::sync::Arc;

use apvd_api::{ConfigAction, DataApprovalItemIdentifier, MonitoringValue};
use apvd_auth::UserService;
use apvd_config::DataSetConfigurationService;
use apvd_persistence::{DataSetRepository, MonitoringRepository};

use crate::lookup::{authorize, check_cell};

#[derive(Clone)]
pub struct MonitoringService {
    monitoring: Arc<dyn MonitoringRepository>,
    data_sets: Arc<dyn DataSetRepository>,
    configurations: DataSetConfigurationService,
    users: UserService,
}

impl MonitoringService {
    pub fn new(
        monitoring: Arc<dyn MonitoringRepository>,
        data_sets: Arc<dyn DataSetRepository>,
        configurations: DataSetConfigurationService,
        users: UserService,
    ) -> Self {
        Self {
            monitoring,
            data_sets,
            configurations,
            users,
        }
    }

    pub async fn get(&self) -> anyhow::Result<Vec<MonitoringValue>> {
        self.monitoring.get().await
    }

    pub async fn is_monitored(&self, item: &DataApprovalItemIdentifier) -> anyhow::Result<bool> {
        let key = to_value(item, true);
        Ok(self
            .monitoring
            .get()
            .await?
            .iter()
            .any(|value| value.same_cell(&key) && value.enable))
    }

    pub async fn update_monitoring(
        &self,
        items: &[DataApprovalItemIdentifier],
        enabled: bool,
    ) -> anyhow::Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let user = self.users.get_current().await?;
        let mut checked: Vec<&str> = Vec::new();
        for item in items {
            check_cell(&item.org_unit, &item.period)?;
            if !checked.contains(&item.data_set.as_str()) {
                authorize(
                    self.data_sets.as_ref(),
                    &self.configurations,
                    &user,
                    &item.data_set,
                    ConfigAction::Read,
                )
                .await?;
                checked.push(&item.data_set);
            }
        }

        let mut values = self.monitoring.get().await?;
        for item in items {
            let update = to_value(item, enabled);
            match values.iter_mut().find(|value| value.same_cell(&update)) {
                Some(existing) => existing.enable = enabled,
                None => values.push(update),
            }
        }

        self.monitoring.save(&values).await?;
        tracing::info!(items = items.len(), enabled, total = values.len(), "updated monitoring");

        Ok(())
    }
}

fn to_value(item: &DataApprovalItemIdentifier, enable: bool) -> MonitoringValue {
    MonitoringValue {
        org_unit: item.org_unit.clone(),
        period: item.period.clone(),
        data_set: item.data_set.clone(),
        enable,
    }
}
