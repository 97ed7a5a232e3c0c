//! Value replication into the approval dataset
//!
//! Each diff row is rewritten against the approval element whose name is the
//! row's basic name plus `-APVD`. Retractions become deletions, everything else
//! an upsert. Rows without a matching approval element are reported in the
//! returned stats and never reach the store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;

use apvd_api::{DataDiffItem, DataElement, DataSet, DataValueToPost};
use apvd_common::{BatchOptions, Stats, run_chunked};
use apvd_persistence::{AppSettingsRepository, DataSetRepository, DataValuesRepository};

use crate::diff::is_valid_approval_data_element;
use crate::lookup::{DataSetPair, resolve_pair};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct ApprovalReplicator {
    data_sets: Arc<dyn DataSetRepository>,
    data_values: Arc<dyn DataValuesRepository>,
    settings: Arc<dyn AppSettingsRepository>,
    options: BatchOptions,
}

impl ApprovalReplicator {
    pub fn new(
        data_sets: Arc<dyn DataSetRepository>,
        data_values: Arc<dyn DataValuesRepository>,
        settings: Arc<dyn AppSettingsRepository>,
        options: BatchOptions,
    ) -> Self {
        Self {
            data_sets,
            data_values,
            settings,
            options,
        }
    }

    pub fn options(&self) -> BatchOptions {
        self.options
    }

    pub async fn resolve(&self, data_set_id: &str) -> anyhow::Result<DataSetPair> {
        resolve_pair(self.data_sets.as_ref(), self.settings.as_ref(), data_set_id).await
    }

    /// Resolve the approval dataset of `data_set_id` and replicate `items` into it
    pub async fn replicate_for(
        &self,
        data_set_id: &str,
        items: &[DataDiffItem],
    ) -> anyhow::Result<Stats> {
        let pair = self.resolve(data_set_id).await?;
        Ok(self.replicate(&pair, items).await)
    }

    pub async fn replicate(&self, pair: &DataSetPair, items: &[DataDiffItem]) -> Stats {
        let mut unresolved = Stats::empty();
        let mut upserts = Vec::new();
        let mut deletions = Vec::new();

        for item in items {
            let Some(approval_element) = find_approval_element(&pair.approval, item) else {
                unresolved += Stats::with_error(
                    item.id(),
                    format!(
                        "Approval data element not found for {} in DataSet {}",
                        item.data_element_basic_name, pair.approval.code
                    ),
                );
                continue;
            };

            let value = DataValueToPost {
                data_element: approval_element.id.clone(),
                period: item.period.clone(),
                org_unit: item.org_unit_uid.clone(),
                category_option_combo: item.category_option_combo.clone(),
                attribute_option_combo: item.attribute_option_combo.clone(),
                value: item.value.clone(),
                comment: item.comment.clone(),
            };
            if item.is_retraction() {
                deletions.push(value);
            } else {
                upserts.push(value);
            }
        }

        tracing::info!(
            approval_data_set = %pair.approval.code,
            upserts = upserts.len(),
            deletions = deletions.len(),
            unresolved = unresolved.error_messages.len(),
            "replicating values into approval dataset"
        );

        let saved = self.save_all(upserts).await;
        let deleted = self.delete_all(deletions).await;

        unresolved + saved + deleted
    }

    /// Write `date` into the element coded `element_code` for every (org unit, period)
    pub async fn stamp_date(
        &self,
        data_set: &DataSet,
        element_code: &str,
        cells: &[(String, String)],
        date: NaiveDate,
    ) -> Stats {
        if cells.is_empty() {
            return Stats::empty();
        }

        let Some(element) = data_set.data_element_by_code(element_code) else {
            tracing::warn!(data_set = %data_set.code, element_code, "date element not found");
            return Stats::with_error(
                element_code,
                format!("Data element {} not found in DataSet {}", element_code, data_set.code),
            );
        };
        let Some(combo) = element.category_combo.category_option_combos.first() else {
            return Stats::with_error(
                element_code,
                format!("Data element {} has no category option combo", element_code),
            );
        };

        let value = date.format(DATE_FORMAT).to_string();
        let mut seen = HashSet::new();
        let values: Vec<DataValueToPost> = cells
            .iter()
            .filter(|cell| seen.insert(*cell))
            .map(|(org_unit, period)| DataValueToPost {
                data_element: element.id.clone(),
                period: period.clone(),
                org_unit: org_unit.clone(),
                category_option_combo: combo.id.clone(),
                attribute_option_combo: None,
                value: value.clone(),
                comment: None,
            })
            .collect();

        tracing::debug!(data_set = %data_set.code, element_code, cells = values.len(), %value, "stamping date");
        self.save_all(values).await
    }

    async fn save_all(&self, values: Vec<DataValueToPost>) -> Stats {
        let data_values = self.data_values.clone();
        run_chunked(values, self.options, |chunk| {
            let data_values = data_values.clone();
            async move { data_values.save_all(&chunk).await }
        })
        .await
    }

    async fn delete_all(&self, values: Vec<DataValueToPost>) -> Stats {
        let data_values = self.data_values.clone();
        run_chunked(values, self.options, |chunk| {
            let data_values = data_values.clone();
            async move { data_values.delete_all(&chunk).await }
        })
        .await
    }
}

fn find_approval_element<'a>(approval: &'a DataSet, item: &DataDiffItem) -> Option<&'a DataElement> {
    approval
        .data_elements
        .iter()
        .find(|element| is_valid_approval_data_element(&item.data_element_basic_name, element.basic_name()))
}
