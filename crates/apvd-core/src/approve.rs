//! Standalone approve use case
//!
//! Copies selected diff rows into the approval dataset. Rows whose org unit is
//! not assigned to the approval dataset are rejected one by one and excluded
//! from the write.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use apvd_api::{ConfigAction, DataDiffItem};
use apvd_auth::UserService;
use apvd_common::DataValueStats;
use apvd_config::DataSetConfigurationService;
use apvd_persistence::DataSetRepository;

use crate::diff::without_date_elements;
use crate::lookup::authorize;
use crate::replicate::ApprovalReplicator;

#[derive(Clone)]
pub struct ApproveUseCase {
    data_sets: Arc<dyn DataSetRepository>,
    configurations: DataSetConfigurationService,
    users: UserService,
    replicator: ApprovalReplicator,
}

impl ApproveUseCase {
    pub fn new(
        data_sets: Arc<dyn DataSetRepository>,
        configurations: DataSetConfigurationService,
        users: UserService,
        replicator: ApprovalReplicator,
    ) -> Self {
        Self {
            data_sets,
            configurations,
            users,
            replicator,
        }
    }

    pub async fn execute(
        &self,
        data_set_id: &str,
        items: Vec<DataDiffItem>,
    ) -> anyhow::Result<Vec<DataValueStats>> {
        self.execute_on(data_set_id, items, Local::now().date_naive()).await
    }

    /// Replication stats first, when anything was accepted, then one entry per rejected row
    pub async fn execute_on(
        &self,
        data_set_id: &str,
        items: Vec<DataDiffItem>,
        today: NaiveDate,
    ) -> anyhow::Result<Vec<DataValueStats>> {
        let user = self.users.get_current().await?;
        let (_, config) = authorize(
            self.data_sets.as_ref(),
            &self.configurations,
            &user,
            data_set_id,
            ConfigAction::Approve,
        )
        .await?;
        let pair = self.replicator.resolve(data_set_id).await?;

        let (accepted, rejected): (Vec<_>, Vec<_>) =
            without_date_elements(items, &pair.original, &config)
                .into_iter()
                .partition(|item| pair.approval.is_assigned_to(&item.org_unit_uid));

        let rejections = rejected.iter().map(|item| {
            DataValueStats::with_error(
                item.id(),
                format!(
                    "Org unit {} is not assigned to DataSet {}",
                    item.org_unit_uid, pair.approval.code
                ),
            )
        });

        tracing::info!(
            data_set = %pair.original.code,
            accepted = accepted.len(),
            rejected = rejected.len(),
            "approving values"
        );

        let mut results = Vec::with_capacity(rejected.len() + 1);
        if !accepted.is_empty() {
            let mut stats = self.replicator.replicate(&pair, &accepted).await;
            let cells: Vec<(String, String)> = accepted
                .iter()
                .map(|item| (item.org_unit_uid.clone(), item.period.clone()))
                .collect();
            stats += self
                .replicator
                .stamp_date(&pair.approval, &config.approval_date_code, &cells, today)
                .await;
            results.push(stats);
        }
        results.extend(rejections);

        Ok(results)
    }
}
