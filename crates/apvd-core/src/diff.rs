//! Diff engine
//!
//! Compares the values of an original dataset with the values of its approval
//! copy for one org unit and period. Approval elements share no ids with the
//! original ones: they are joined by name, the approval name being the
//! original name followed by `-APVD`, compared case-insensitively.
//!
//! With `children` set, rows of every org unit found on either side are
//! concatenated, grouped by org unit in first-seen order.

use std::collections::HashSet;
use std::sync::Arc;

use apvd_api::{
    CategoryOptionCombo, DataDiffItem, DataElement, DataSet, DataSetConfiguration, DataValue,
    DataValuesSelector,
};
use apvd_common::APPROVAL_SUFFIX;
use apvd_persistence::{AppSettingsRepository, DataSetRepository, DataValuesRepository};

use crate::lookup::{DataSetPair, check_cell, resolve_pair};

/// `approval_name` names the approval copy of the element called `original_name`
pub fn is_valid_approval_data_element(original_name: &str, approval_name: &str) -> bool {
    let expected = format!("{}{}", original_name, APPROVAL_SUFFIX);
    approval_name.to_lowercase() == expected.to_lowercase()
}

/// One data element expanded for one of its category option combos
struct ExpandedElement<'a> {
    data_element: &'a DataElement,
    combo: &'a CategoryOptionCombo,
}

impl ExpandedElement<'_> {
    /// Blank for the default combo
    fn combo_name(&self) -> &str {
        if self.combo.is_default() {
            ""
        } else {
            &self.combo.name
        }
    }

    fn display_name(&self) -> String {
        match self.combo_name() {
            "" => self.data_element.name.clone(),
            combo => format!("{} {}", self.data_element.name, combo),
        }
    }
}

fn expand(data_set: &DataSet) -> Vec<ExpandedElement<'_>> {
    data_set
        .data_elements
        .iter()
        .flat_map(|data_element| {
            data_element
                .category_combo
                .category_option_combos
                .iter()
                .map(move |combo| ExpandedElement {
                    data_element,
                    combo,
                })
        })
        .collect()
}

fn org_unit_union(original: &[DataValue], approval: &[DataValue]) -> Vec<String> {
    let mut seen = HashSet::new();
    original
        .iter()
        .chain(approval.iter())
        .filter(|dv| seen.insert(dv.org_unit.as_str()))
        .map(|dv| dv.org_unit.clone())
        .collect()
}

/// Compare already fetched values; no I/O
pub fn compute_diff(
    original_data_set: &DataSet,
    period: &str,
    original_values: &[DataValue],
    approval_values: &[DataValue],
) -> Vec<DataDiffItem> {
    let elements = expand(original_data_set);
    let mut items = Vec::new();

    for org_unit in org_unit_union(original_values, approval_values) {
        for element in &elements {
            let original = original_values.iter().find(|dv| {
                dv.data_element == element.data_element.id
                    && dv.category_option_combo == element.combo.id
                    && dv.org_unit == org_unit
                    && dv.period == period
            });
            let approval = approval_values.iter().find(|dv| {
                is_valid_approval_data_element(element.data_element.basic_name(), &dv.data_element_name)
                    && dv.category_option_combo == element.combo.id
                    && dv.org_unit == org_unit
                    && dv.period == period
            });

            let original_value = original.map(|dv| dv.value.as_str()).unwrap_or_default();
            let approval_value = approval.map(|dv| dv.value.as_str()).unwrap_or_default();
            if original_value == approval_value {
                continue;
            }

            let attribute_option_combo = original
                .or(approval)
                .map(|dv| dv.attribute_option_combo.clone())
                .filter(|aoc| !aoc.is_empty());

            items.push(DataDiffItem {
                data_set_uid: original_data_set.id.clone(),
                org_unit_uid: org_unit.clone(),
                period: period.to_string(),
                data_element_id: element.data_element.id.clone(),
                data_element: element.display_name(),
                data_element_basic_name: element.data_element.basic_name().to_string(),
                // an approval value without an original one is a retraction
                value: original_value.to_string(),
                apvd_value: approval.map(|dv| dv.value.clone()),
                comment: original.and_then(|dv| dv.comment.clone()),
                apvd_comment: approval.and_then(|dv| dv.comment.clone()),
                attribute_option_combo,
                category_option_combo: element.combo.id.clone(),
                category_option_combo_name: element.combo_name().to_string(),
            });
        }
    }

    items
}

/// Drop rows of the elements `config` stamps with submission and approval dates
///
/// Those elements are written by the workflow itself and have no approval copy.
pub fn without_date_elements(
    items: Vec<DataDiffItem>,
    data_set: &DataSet,
    config: &DataSetConfiguration,
) -> Vec<DataDiffItem> {
    let date_elements: HashSet<&str> = config
        .date_element_codes()
        .into_iter()
        .filter(|code| !code.is_empty())
        .filter_map(|code| data_set.data_element_by_code(code))
        .map(|element| element.id.as_str())
        .collect();
    if date_elements.is_empty() {
        return items;
    }

    items
        .into_iter()
        .filter(|item| !date_elements.contains(item.data_element_id.as_str()))
        .collect()
}

#[derive(Clone)]
pub struct DiffEngine {
    data_sets: Arc<dyn DataSetRepository>,
    data_values: Arc<dyn DataValuesRepository>,
    settings: Arc<dyn AppSettingsRepository>,
}

impl DiffEngine {
    pub fn new(
        data_sets: Arc<dyn DataSetRepository>,
        data_values: Arc<dyn DataValuesRepository>,
        settings: Arc<dyn AppSettingsRepository>,
    ) -> Self {
        Self {
            data_sets,
            data_values,
            settings,
        }
    }

    pub async fn resolve(&self, data_set_id: &str) -> anyhow::Result<DataSetPair> {
        resolve_pair(self.data_sets.as_ref(), self.settings.as_ref(), data_set_id).await
    }

    pub async fn get_diff(
        &self,
        data_set_id: &str,
        org_unit_id: &str,
        period: &str,
        children: bool,
    ) -> anyhow::Result<Vec<DataDiffItem>> {
        check_cell(org_unit_id, period)?;
        let pair = self.resolve(data_set_id).await?;
        self.get_diff_for_pair(&pair, org_unit_id, period, children).await
    }

    pub async fn get_diff_for_pair(
        &self,
        pair: &DataSetPair,
        org_unit_id: &str,
        period: &str,
        children: bool,
    ) -> anyhow::Result<Vec<DataDiffItem>> {
        check_cell(org_unit_id, period)?;

        let original_selector =
            DataValuesSelector::for_cell(&pair.original.id, org_unit_id, period, children);
        let approval_selector =
            DataValuesSelector::for_cell(&pair.approval.id, org_unit_id, period, children);
        let (original_values, approval_values) = futures::try_join!(
            self.data_values.get(&original_selector),
            self.data_values.get(&approval_selector)
        )?;

        let items = compute_diff(&pair.original, period, &original_values, &approval_values);
        tracing::debug!(
            data_set = %pair.original.code,
            approval_data_set = %pair.approval.code,
            org_unit = org_unit_id,
            period,
            children,
            original_values = original_values.len(),
            approval_values = approval_values.len(),
            differences = items.len(),
            "computed approval diff"
        );

        Ok(items)
    }
}
