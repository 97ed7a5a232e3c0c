//! Approval workflow items and diff rows

use serde::{Deserialize, Serialize};

use crate::configuration::ConfigAction;

const DIFF_ID_SEPARATOR: &str = "|||";
const APPROVAL_ID_SEPARATOR: &str = "-";

/// Commands the workflow orchestrator can issue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowAction {
    Complete,
    Incomplete,
    /// Workflow-level approval, labelled "Submit"
    Submit,
    Revoke,
    /// Replicate the diff into the approval dataset, labelled "Approve"
    Duplicate,
}

impl WorkflowAction {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowAction::Complete => "complete",
            WorkflowAction::Incomplete => "incomplete",
            WorkflowAction::Submit => "submit",
            WorkflowAction::Revoke => "revoke",
            WorkflowAction::Duplicate => "duplicate",
        }
    }

    /// Permission a user needs on the dataset configuration
    pub fn required_permission(self) -> ConfigAction {
        match self {
            WorkflowAction::Complete => ConfigAction::Complete,
            WorkflowAction::Incomplete => ConfigAction::Incomplete,
            WorkflowAction::Submit => ConfigAction::Submit,
            WorkflowAction::Revoke => ConfigAction::Revoke,
            WorkflowAction::Duplicate => ConfigAction::Approve,
        }
    }
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WorkflowAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(WorkflowAction::Complete),
            "incomplete" => Ok(WorkflowAction::Incomplete),
            "submit" => Ok(WorkflowAction::Submit),
            "revoke" => Ok(WorkflowAction::Revoke),
            "duplicate" => Ok(WorkflowAction::Duplicate),
            _ => Err(format!("Invalid workflow action: {}", s)),
        }
    }
}

/// Structured key of one approval row
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataApprovalItemIdentifier {
    pub data_set: String,
    pub org_unit: String,
    #[serde(default)]
    pub org_unit_code: Option<String>,
    pub period: String,
    #[serde(default)]
    pub workflow: Option<String>,
}

impl DataApprovalItemIdentifier {
    pub fn new(data_set: &str, org_unit: &str, period: &str) -> Self {
        Self {
            data_set: data_set.to_string(),
            org_unit: org_unit.to_string(),
            period: period.to_string(),
            ..Default::default()
        }
    }
}

/// Completion, approval and monitoring state of one (dataset, org unit, period)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MalDataApprovalItem {
    pub data_set_uid: String,
    pub data_set: String,
    pub org_unit_uid: String,
    pub org_unit: String,
    #[serde(default)]
    pub org_unit_code: String,
    pub period: String,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub approval_workflow_uid: Option<String>,
    #[serde(default)]
    pub approval_workflow: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub last_updated_value: Option<String>,
    #[serde(default)]
    pub last_date_of_submission: Option<String>,
    #[serde(default)]
    pub last_date_of_approval: Option<String>,
    #[serde(default)]
    pub modification_count: Option<String>,
    #[serde(default)]
    pub monitoring: bool,
}

impl MalDataApprovalItem {
    /// Row key for selection, not a storage key
    pub fn id(&self) -> String {
        [
            self.data_set_uid.as_str(),
            self.approval_workflow_uid.as_deref().unwrap_or_default(),
            self.period.as_str(),
            self.org_unit_uid.as_str(),
            self.org_unit_code.as_str(),
        ]
        .join(APPROVAL_ID_SEPARATOR)
    }

    pub fn identifier(&self) -> DataApprovalItemIdentifier {
        DataApprovalItemIdentifier {
            data_set: self.data_set_uid.clone(),
            org_unit: self.org_unit_uid.clone(),
            org_unit_code: Some(self.org_unit_code.clone()).filter(|code| !code.is_empty()),
            period: self.period.clone(),
            workflow: self.approval_workflow_uid.clone(),
        }
    }
}

/// One cell whose original and approved values disagree
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDiffItem {
    pub data_set_uid: String,
    pub org_unit_uid: String,
    pub period: String,
    /// Original data element id
    pub data_element_id: String,
    /// Display name of the row, including the combo name when not default
    pub data_element: String,
    /// Name used to find the approval dataset element
    pub data_element_basic_name: String,
    /// Empty when the value was retracted from the original dataset
    pub value: String,
    pub apvd_value: Option<String>,
    pub comment: Option<String>,
    pub apvd_comment: Option<String>,
    pub attribute_option_combo: Option<String>,
    pub category_option_combo: String,
    pub category_option_combo_name: String,
}

impl DataDiffItem {
    /// Row key for selection, not a storage key
    pub fn id(&self) -> String {
        [
            self.data_set_uid.as_str(),
            self.period.as_str(),
            self.org_unit_uid.as_str(),
            self.data_element.as_str(),
            self.value.as_str(),
            self.apvd_value.as_deref().unwrap_or_default(),
            self.comment.as_deref().unwrap_or_default(),
            self.attribute_option_combo.as_deref().unwrap_or_default(),
            self.category_option_combo.as_str(),
            self.data_element_basic_name.as_str(),
        ]
        .join(DIFF_ID_SEPARATOR)
    }

    pub fn is_retraction(&self) -> bool {
        self.value.is_empty()
    }
}

/// Monitoring flag stored per (org unit, period, dataset)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringValue {
    pub org_unit: String,
    pub period: String,
    pub data_set: String,
    pub enable: bool,
}

impl MonitoringValue {
    pub fn same_cell(&self, other: &MonitoringValue) -> bool {
        self.org_unit == other.org_unit
            && self.period == other.period
            && self.data_set == other.data_set
    }
}
