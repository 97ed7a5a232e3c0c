//! Approval workflow orchestrator
//!
//! Items are partitioned by dataset. Every partition is authorized before any
//! command is issued, so a denied action leaves the platform untouched. Each
//! partition is then executed independently and its outcome recorded; the run
//! succeeds only when every partition does.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};

use apvd_api::{
    DataApprovalItemIdentifier, DataDiffItem, DataSet, DataSetConfiguration, WorkflowAction,
};
use apvd_auth::UserService;
use apvd_common::Stats;
use apvd_config::DataSetConfigurationService;
use apvd_persistence::{DataApprovalRepository, DataSetRepository};

use crate::diff::{DiffEngine, without_date_elements};
use crate::lookup::{authorize, check_cell};
use crate::replicate::ApprovalReplicator;

/// Result of one dataset partition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetOutcome {
    pub data_set_id: String,
    pub success: bool,
    pub stats: Stats,
}

/// Result of one workflow run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReport {
    pub action: Option<WorkflowAction>,
    pub outcomes: Vec<DataSetOutcome>,
}

impl WorkflowReport {
    /// True when every partition succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.success)
    }

    /// Field-wise sum of every partition's stats
    pub fn stats(&self) -> Stats {
        self.outcomes.iter().map(|outcome| outcome.stats.clone()).sum()
    }
}

/// Items of one dataset with the resolved dataset and configuration
struct Partition {
    data_set: DataSet,
    config: DataSetConfiguration,
    items: Vec<DataApprovalItemIdentifier>,
}

impl Partition {
    fn cells(&self) -> Vec<(String, String)> {
        self.items
            .iter()
            .map(|item| (item.org_unit.clone(), item.period.clone()))
            .collect()
    }
}

fn partition_by_data_set(
    items: &[DataApprovalItemIdentifier],
) -> Vec<(String, Vec<DataApprovalItemIdentifier>)> {
    let mut partitions: Vec<(String, Vec<DataApprovalItemIdentifier>)> = Vec::new();
    for item in items {
        match partitions.iter_mut().find(|(id, _)| *id == item.data_set) {
            Some((_, group)) => group.push(item.clone()),
            None => partitions.push((item.data_set.clone(), vec![item.clone()])),
        }
    }
    partitions
}

#[derive(Clone)]
pub struct ApprovalWorkflow {
    data_sets: Arc<dyn DataSetRepository>,
    approvals: Arc<dyn DataApprovalRepository>,
    configurations: DataSetConfigurationService,
    users: UserService,
    diff: DiffEngine,
    replicator: ApprovalReplicator,
}

impl ApprovalWorkflow {
    pub fn new(
        data_sets: Arc<dyn DataSetRepository>,
        approvals: Arc<dyn DataApprovalRepository>,
        configurations: DataSetConfigurationService,
        users: UserService,
        diff: DiffEngine,
        replicator: ApprovalReplicator,
    ) -> Self {
        Self {
            data_sets,
            approvals,
            configurations,
            users,
            diff,
            replicator,
        }
    }

    pub async fn execute(
        &self,
        action: WorkflowAction,
        items: &[DataApprovalItemIdentifier],
    ) -> anyhow::Result<WorkflowReport> {
        self.execute_on(action, items, Local::now().date_naive()).await
    }

    /// Same as `execute` with an explicit stamping date
    pub async fn execute_on(
        &self,
        action: WorkflowAction,
        items: &[DataApprovalItemIdentifier],
        today: NaiveDate,
    ) -> anyhow::Result<WorkflowReport> {
        for item in items {
            check_cell(&item.org_unit, &item.period)?;
        }

        let user = self.users.get_current().await?;
        let mut partitions = Vec::new();
        for (data_set_id, items) in partition_by_data_set(items) {
            let (data_set, config) = authorize(
                self.data_sets.as_ref(),
                &self.configurations,
                &user,
                &data_set_id,
                action.required_permission(),
            )
            .await?;
            partitions.push(Partition {
                data_set,
                config,
                items,
            });
        }

        tracing::info!(
            %action,
            username = %user.username,
            data_sets = partitions.len(),
            items = items.len(),
            "executing workflow action"
        );

        let mut outcomes = Vec::with_capacity(partitions.len());
        for partition in &partitions {
            let outcome = match self.run_partition(action, partition, today).await {
                Ok((success, stats)) => DataSetOutcome {
                    data_set_id: partition.data_set.id.clone(),
                    success,
                    stats,
                },
                Err(err) => {
                    tracing::error!(%action, data_set = %partition.data_set.code, error = %err, "workflow action failed");
                    DataSetOutcome {
                        data_set_id: partition.data_set.id.clone(),
                        success: false,
                        stats: Stats::with_error(partition.data_set.id.clone(), err.to_string()),
                    }
                }
            };

            if !outcome.success {
                tracing::warn!(%action, data_set = %partition.data_set.code, "workflow action unsuccessful");
            }
            outcomes.push(outcome);
        }

        Ok(WorkflowReport {
            action: Some(action),
            outcomes,
        })
    }

    async fn run_partition(
        &self,
        action: WorkflowAction,
        partition: &Partition,
        today: NaiveDate,
    ) -> anyhow::Result<(bool, Stats)> {
        let items = partition.items.as_slice();

        match action {
            WorkflowAction::Complete => Ok((self.approvals.complete(items).await?, Stats::empty())),
            WorkflowAction::Incomplete => {
                Ok((self.approvals.incomplete(items).await?, Stats::empty()))
            }
            WorkflowAction::Submit => self.submit(partition, today).await,
            WorkflowAction::Revoke => self.revoke(partition).await,
            WorkflowAction::Duplicate => self.duplicate(partition, today).await,
        }
    }

    async fn submit(&self, partition: &Partition, today: NaiveDate) -> anyhow::Result<(bool, Stats)> {
        let items = partition.items.as_slice();
        let mut success = self.approvals.approve(items).await?;
        if partition.config.submit_and_complete {
            success &= self.approvals.complete(items).await?;
        }

        if !success {
            return Ok((false, Stats::empty()));
        }

        let stats = self
            .replicator
            .stamp_date(
                &partition.data_set,
                &partition.config.submission_date_code,
                &partition.cells(),
                today,
            )
            .await;
        Ok((true, stats))
    }

    /// Unapprove and, unless disabled, incomplete; both commands are always sent
    async fn revoke(&self, partition: &Partition) -> anyhow::Result<(bool, Stats)> {
        let items = partition.items.as_slice();
        let unapproved = self.approvals.unapprove(items).await?;
        if !partition.config.revoke_and_incomplete {
            return Ok((unapproved, Stats::empty()));
        }

        let incompleted = self.approvals.incomplete(items).await?;
        Ok((unapproved && incompleted, Stats::empty()))
    }

    /// Recompute the diff of every item and copy it into the approval dataset
    async fn duplicate(&self, partition: &Partition, today: NaiveDate) -> anyhow::Result<(bool, Stats)> {
        let pair = self.diff.resolve(&partition.data_set.id).await?;

        let concurrency = self.replicator.options().concurrency.max(1);
        let diffs: Vec<Vec<DataDiffItem>> = stream::iter(&partition.items)
            .map(|item| {
                self.diff
                    .get_diff_for_pair(&pair, &item.org_unit, &item.period, false)
            })
            .buffered(concurrency)
            .try_collect()
            .await?;
        let diff_items = without_date_elements(
            diffs.into_iter().flatten().collect(),
            &pair.original,
            &partition.config,
        );

        if diff_items.is_empty() {
            tracing::debug!(data_set = %pair.original.code, "nothing to duplicate");
            return Ok((true, Stats::empty()));
        }

        let mut stats = self.replicator.replicate(&pair, &diff_items).await;
        let cells: Vec<(String, String)> = diff_items
            .iter()
            .map(|item| (item.org_unit_uid.clone(), item.period.clone()))
            .collect();
        stats += self
            .replicator
            .stamp_date(&pair.approval, &partition.config.approval_date_code, &cells, today)
            .await;

        let stats = stats.dedup_error_messages();
        Ok((!stats.has_errors(), stats))
    }
}
