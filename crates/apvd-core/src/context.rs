//! Wiring of repositories into services

use std::sync::Arc;

use apvd_auth::UserService;
use apvd_common::BatchOptions;
use apvd_config::DataSetConfigurationService;
use apvd_persistence::{
    AppSettingsRepository, DataApprovalRepository, DataSetConfigurationRepository,
    DataSetRepository, DataValuesRepository, MonitoringRepository, UserRepository,
};

use crate::approve::ApproveUseCase;
use crate::diff::DiffEngine;
use crate::monitoring::MonitoringService;
use crate::replicate::ApprovalReplicator;
use crate::workflow::ApprovalWorkflow;

/// Every external collaborator the core talks to
#[derive(Clone)]
pub struct Repositories {
    pub data_sets: Arc<dyn DataSetRepository>,
    pub data_values: Arc<dyn DataValuesRepository>,
    pub configurations: Arc<dyn DataSetConfigurationRepository>,
    pub users: Arc<dyn UserRepository>,
    pub settings: Arc<dyn AppSettingsRepository>,
    pub approvals: Arc<dyn DataApprovalRepository>,
    pub monitoring: Arc<dyn MonitoringRepository>,
}

impl Repositories {
    /// All collaborators served by a single backend
    pub fn shared<S>(backend: Arc<S>) -> Self
    where
        S: DataSetRepository
            + DataValuesRepository
            + DataSetConfigurationRepository
            + UserRepository
            + AppSettingsRepository
            + DataApprovalRepository
            + MonitoringRepository
            + 'static,
    {
        Self {
            data_sets: backend.clone(),
            data_values: backend.clone(),
            configurations: backend.clone(),
            users: backend.clone(),
            settings: backend.clone(),
            approvals: backend.clone(),
            monitoring: backend,
        }
    }
}

/// The use cases built on one set of repositories
#[derive(Clone)]
pub struct CoreServices {
    pub users: UserService,
    pub configurations: DataSetConfigurationService,
    pub diff: DiffEngine,
    pub replicator: ApprovalReplicator,
    pub workflow: ApprovalWorkflow,
    pub approve: ApproveUseCase,
    pub monitoring: MonitoringService,
}

impl CoreServices {
    pub fn new(repositories: &Repositories, options: BatchOptions) -> Self {
        let users = UserService::new(repositories.users.clone());
        let configurations = DataSetConfigurationService::new(
            repositories.configurations.clone(),
            repositories.data_sets.clone(),
            users.clone(),
        );
        let diff = DiffEngine::new(
            repositories.data_sets.clone(),
            repositories.data_values.clone(),
            repositories.settings.clone(),
        );
        let replicator = ApprovalReplicator::new(
            repositories.data_sets.clone(),
            repositories.data_values.clone(),
            repositories.settings.clone(),
            options,
        );
        let workflow = ApprovalWorkflow::new(
            repositories.data_sets.clone(),
            repositories.approvals.clone(),
            configurations.clone(),
            users.clone(),
            diff.clone(),
            replicator.clone(),
        );
        let approve = ApproveUseCase::new(
            repositories.data_sets.clone(),
            configurations.clone(),
            users.clone(),
            replicator.clone(),
        );
        let monitoring = MonitoringService::new(
            repositories.monitoring.clone(),
            repositories.data_sets.clone(),
            configurations.clone(),
            users.clone(),
        );

        Self {
            users,
            configurations,
            diff,
            replicator,
            workflow,
            approve,
            monitoring,
        }
    }
}
