//! Metadata model: data sets, data elements, org units and users

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use apvd_common::DEFAULT_CATEGORY_OPTION_COMBO;

/// Reference to an object by id with optional display fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IdRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOptionCombo {
    pub id: String,
    pub name: String,
}

impl CategoryOptionCombo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_CATEGORY_OPTION_COMBO
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCombo {
    pub id: String,
    #[serde(default)]
    pub category_option_combos: Vec<CategoryOptionCombo>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataElement {
    pub id: String,
    pub name: String,
    /// Name as stored on the platform, before any display formatting
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub category_combo: CategoryCombo,
}

impl DataElement {
    /// Name used when joining against approval dataset elements
    pub fn basic_name(&self) -> &str {
        if self.original_name.is_empty() {
            &self.name
        } else {
            &self.original_name
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodType {
    #[default]
    Monthly,
    Yearly,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSet {
    pub id: String,
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub organisation_units: Vec<IdRef>,
    #[serde(default)]
    pub data_elements: Vec<DataElement>,
    #[serde(default)]
    pub period_type: PeriodType,
}

impl DataSet {
    pub fn is_assigned_to(&self, org_unit_id: &str) -> bool {
        self.organisation_units.iter().any(|ou| ou.id == org_unit_id)
    }

    pub fn data_element_by_code(&self, code: &str) -> Option<&DataElement> {
        self.data_elements.iter().find(|de| de.code == code)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroupRef {
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
}

/// The user on whose behalf a use case runs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_groups: Vec<UserGroupRef>,
    #[serde(default)]
    pub is_super_admin: bool,
}

impl User {
    pub fn group_codes(&self) -> Vec<&str> {
        self.user_groups
            .iter()
            .filter(|group| !group.code.is_empty())
            .map(|group| group.code.as_str())
            .collect()
    }
}

/// Data element codes stamped with dates during the workflow
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetSettingsElements {
    #[serde(default)]
    pub approval_date: String,
    #[serde(default)]
    pub submission_date: String,
}

/// Per-dataset approval settings keyed by the original dataset code
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetSettings {
    #[serde(default)]
    pub data_source_id: String,
    #[serde(default)]
    pub old_data_source_id: String,
    pub approval_data_set_code: String,
    #[serde(default)]
    pub data_elements: DataSetSettingsElements,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub data_sets: HashMap<String, DataSetSettings>,
}

impl AppSettings {
    pub fn data_set(&self, code: &str) -> Option<&DataSetSettings> {
        self.data_sets.get(code)
    }
}
