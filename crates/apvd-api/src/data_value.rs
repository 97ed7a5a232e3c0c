//! Data values as fetched from and written to the value store

use serde::{Deserialize, Serialize};

/// Snapshot of a stored value
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    pub data_element: String,
    pub period: String,
    pub org_unit: String,
    pub category_option_combo: String,
    #[serde(default)]
    pub attribute_option_combo: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub comment: Option<String>,
    /// Denormalized at fetch time for name-based matching
    #[serde(default)]
    pub data_element_name: String,
    #[serde(default)]
    pub followup: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

impl DataValue {
    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.unwrap_or(false)
    }
}

/// A value to create, update or delete
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValueToPost {
    pub data_element: String,
    pub period: String,
    pub org_unit: String,
    pub category_option_combo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_option_combo: Option<String>,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl DataValueToPost {
    /// Identity of the cell this value targets
    pub fn cell_key(&self) -> (String, String, String, String, String) {
        (
            self.data_element.clone(),
            self.period.clone(),
            self.org_unit.clone(),
            self.category_option_combo.clone(),
            self.attribute_option_combo.clone().unwrap_or_default(),
        )
    }
}

/// Filter for fetching values
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValuesSelector {
    #[serde(default)]
    pub data_set_ids: Vec<String>,
    #[serde(default)]
    pub org_unit_ids: Vec<String>,
    #[serde(default)]
    pub periods: Vec<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub children: bool,
}

impl DataValuesSelector {
    pub fn for_cell(data_set_id: &str, org_unit_id: &str, period: &str, children: bool) -> Self {
        Self {
            data_set_ids: vec![data_set_id.to_string()],
            org_unit_ids: vec![org_unit_id.to_string()],
            periods: vec![period.to_string()],
            children,
            ..Default::default()
        }
    }
}
