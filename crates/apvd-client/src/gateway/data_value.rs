use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use apvd_api::{DataValue, DataValueToPost, DataValuesSelector};
use apvd_common::Stats;
use apvd_persistence::{DataSetRepository, DataValuesRepository};

use super::HttpGateway;
use crate::import::{stats_from_error, stats_from_response};

const DATA_VALUE_SETS_PATH: &str = "/api/dataValueSets";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataValueSet {
    #[serde(default)]
    data_values: Vec<DataValue>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DataValueSetToPost<'a> {
    data_values: &'a [DataValueToPost],
}

#[derive(Clone, Copy, Debug)]
enum ImportStrategy {
    CreateAndUpdate,
    Delete,
}

impl ImportStrategy {
    fn as_str(self) -> &'static str {
        match self {
            ImportStrategy::CreateAndUpdate => "CREATE_AND_UPDATE",
            ImportStrategy::Delete => "DELETE",
        }
    }
}

fn selector_query(selector: &DataValuesSelector) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    query.extend(selector.data_set_ids.iter().map(|id| ("dataSet", id.clone())));
    query.extend(selector.org_unit_ids.iter().map(|id| ("orgUnit", id.clone())));
    query.extend(selector.periods.iter().map(|pe| ("period", pe.clone())));
    if let Some(start) = &selector.start_date {
        query.push(("startDate", start.clone()));
    }
    if let Some(end) = &selector.end_date {
        query.push(("endDate", end.clone()));
    }
    query.push(("children", selector.children.to_string()));
    query.push(("includeDeleted", "false".to_string()));
    query
}

impl HttpGateway {
    /// Basic names of every data element of the selected datasets
    async fn element_names(&self, data_set_ids: &[String]) -> anyhow::Result<HashMap<String, String>> {
        let data_sets = try_join_all(data_set_ids.iter().map(|id| self.get_by_id(id))).await?;
        Ok(data_sets
            .into_iter()
            .flatten()
            .flat_map(|ds| ds.data_elements)
            .map(|de| (de.id.clone(), de.basic_name().to_string()))
            .collect())
    }

    async fn post_values(&self, values: &[DataValueToPost], strategy: ImportStrategy) -> Stats {
        if values.is_empty() {
            return Stats::empty();
        }

        let query = [("importStrategy", strategy.as_str())];
        let body = DataValueSetToPost { data_values: values };
        let stats = match self.client.post_json(DATA_VALUE_SETS_PATH, &query, &body).await {
            Ok(response) => stats_from_response(strategy.as_str(), &response),
            Err(e) => {
                tracing::error!(strategy = strategy.as_str(), error = %e, "value write failed");
                stats_from_error(strategy.as_str(), &e)
            }
        };

        tracing::debug!(
            strategy = strategy.as_str(),
            values = values.len(),
            imported = stats.imported,
            updated = stats.updated,
            deleted = stats.deleted,
            errors = stats.error_messages.len(),
            "posted value chunk"
        );
        stats
    }
}

#[async_trait]
impl DataValuesRepository for HttpGateway {
    async fn get(&self, selector: &DataValuesSelector) -> anyhow::Result<Vec<DataValue>> {
        let query = selector_query(selector);
        let (set, names) = futures::try_join!(
            async {
                self.client
                    .get_json::<DataValueSet, _>(DATA_VALUE_SETS_PATH, &query)
                    .await
                    .map_err(anyhow::Error::from)
            },
            self.element_names(&selector.data_set_ids)
        )?;

        Ok(set
            .data_values
            .into_iter()
            .filter(|dv| !dv.is_deleted())
            .map(|mut dv| {
                if let Some(name) = names.get(&dv.data_element) {
                    dv.data_element_name = name.clone();
                }
                dv
            })
            .collect())
    }

    async fn save_all(&self, values: &[DataValueToPost]) -> Stats {
        self.post_values(values, ImportStrategy::CreateAndUpdate).await
    }

    async fn delete_all(&self, values: &[DataValueToPost]) -> Stats {
        self.post_values(values, ImportStrategy::Delete).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_query() {
        let mut selector = DataValuesSelector::for_cell("ds1", "ou1", "2023", true);
        selector.start_date = Some("2023-01-01".to_string());

        let query = selector_query(&selector);
        assert_eq!(
            query,
            vec![
                ("dataSet", "ds1".to_string()),
                ("orgUnit", "ou1".to_string()),
                ("period", "2023".to_string()),
                ("startDate", "2023-01-01".to_string()),
                ("children", "true".to_string()),
                ("includeDeleted", "false".to_string()),
            ]
        );
    }
}
