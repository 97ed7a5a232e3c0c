//! Subcommand execution

use std::path::Path;
use std::sync::Arc;

use apvd_api::{DataApprovalItemIdentifier, DataDiffItem, WorkflowAction};
use apvd_client::HttpGateway;
use apvd_common::BatchOptions;
use apvd_core::{CoreServices, Repositories, WorkflowReport};

use crate::cli::Command;
use crate::model::config::Configuration;

pub struct Runner {
    services: CoreServices,
}

impl Runner {
    pub fn new(repositories: &Repositories, options: BatchOptions) -> Self {
        Self {
            services: CoreServices::new(repositories, options),
        }
    }

    /// Runner backed by the platform described in `configuration`
    pub fn connect(configuration: &Configuration) -> anyhow::Result<Self> {
        let options = configuration.batch_options();
        let gateway = HttpGateway::from_config(configuration.http_client_config(), options)?;
        tracing::info!(
            server = %configuration.server_url(),
            chunk_size = options.chunk_size,
            concurrency = options.concurrency,
            "connected runner to platform"
        );
        Ok(Self::new(&Repositories::shared(Arc::new(gateway)), options))
    }

    /// True when the command succeeded
    pub async fn run(&self, command: Command) -> anyhow::Result<bool> {
        match command {
            Command::Approve {
                action,
                items,
                stats_file,
            } => {
                let report = self.approve(action, &items, &stats_file).await?;
                Ok(report.is_success())
            }
            Command::Diff {
                data_set,
                org_unit,
                period,
                children,
            } => {
                let items = self.diff(&data_set, &org_unit, &period, children).await?;
                println!("{}", serde_json::to_string_pretty(&items)?);
                Ok(true)
            }
        }
    }

    /// Execute `action` over the items stored in `items_file` and write the report to `stats_file`
    pub async fn approve(
        &self,
        action: WorkflowAction,
        items_file: &Path,
        stats_file: &Path,
    ) -> anyhow::Result<WorkflowReport> {
        let content = tokio::fs::read_to_string(items_file).await?;
        let items: Vec<DataApprovalItemIdentifier> = serde_json::from_str(&content)?;
        tracing::info!(%action, items = items.len(), file = %items_file.display(), "loaded approval items");

        let report = self.services.workflow.execute(action, &items).await?;

        tokio::fs::write(stats_file, serde_json::to_string_pretty(&report)?).await?;

        let stats = report.stats();
        if report.is_success() {
            tracing::info!(
                %action,
                imported = stats.imported,
                updated = stats.updated,
                deleted = stats.deleted,
                stats_file = %stats_file.display(),
                "workflow action completed"
            );
        } else {
            tracing::error!(
                %action,
                errors = stats.error_messages.len(),
                stats_file = %stats_file.display(),
                "workflow action failed"
            );
        }

        Ok(report)
    }

    pub async fn diff(
        &self,
        data_set_id: &str,
        org_unit_id: &str,
        period: &str,
        children: bool,
    ) -> anyhow::Result<Vec<DataDiffItem>> {
        self.services
            .diff
            .get_diff(data_set_id, org_unit_id, period, children)
            .await
    }
}
