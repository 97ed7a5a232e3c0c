//! Apvd API - Data model for the approval workflow
//!
//! This crate defines the plain types exchanged between the services and the
//! gateways: metadata, data values, approval rows, diff rows, dataset
//! configurations and their validation.

pub mod approval;
pub mod configuration;
pub mod data_value;
pub mod model;
pub mod validation;

pub use approval::{
    DataApprovalItemIdentifier, DataDiffItem, MalDataApprovalItem, MonitoringValue,
    WorkflowAction,
};
pub use configuration::{
    ActionPermissions, ConfigAction, DataSetConfiguration, Permissions, build_configuration_code,
};
pub use data_value::{DataValue, DataValueToPost, DataValuesSelector};
pub use model::{
    AppSettings, CategoryCombo, CategoryOptionCombo, DataElement, DataSet, DataSetSettings,
    DataSetSettingsElements, IdRef, PeriodType, User, UserGroupRef,
};
pub use validation::{ValidationFailure, validate_configuration};
