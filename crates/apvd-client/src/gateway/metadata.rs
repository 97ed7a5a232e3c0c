use async_trait::async_trait;
use serde::Deserialize;

use apvd_api::{CategoryCombo, DataElement, DataSet, IdRef, PeriodType};
use apvd_common::batch::DEFAULT_METADATA_CHUNK_SIZE;
use apvd_common::{ApvdError, BatchOptions, try_map_chunked};
use apvd_persistence::DataSetRepository;

use super::HttpGateway;

const DATA_SET_FIELDS: &str = "id,code,name,periodType,organisationUnits[id],\
dataSetElements[dataElement[id,name,formName,code,categoryCombo[id,categoryOptionCombos[id,name]]]]";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataElementPayload {
    id: String,
    name: String,
    #[serde(default)]
    form_name: Option<String>,
    #[serde(default)]
    code: String,
    #[serde(default)]
    category_combo: CategoryCombo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataSetElementPayload {
    data_element: DataElementPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataSetPayload {
    id: String,
    #[serde(default)]
    code: String,
    name: String,
    #[serde(default)]
    period_type: Option<String>,
    #[serde(default)]
    organisation_units: Vec<IdRef>,
    #[serde(default)]
    data_set_elements: Vec<DataSetElementPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataSetsPage {
    #[serde(default)]
    data_sets: Vec<DataSetPayload>,
}

impl From<DataElementPayload> for DataElement {
    fn from(payload: DataElementPayload) -> Self {
        let display_name = payload
            .form_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| payload.name.clone());
        DataElement {
            id: payload.id,
            name: display_name,
            original_name: payload.name,
            code: payload.code,
            category_combo: payload.category_combo,
        }
    }
}

impl From<DataSetPayload> for DataSet {
    fn from(payload: DataSetPayload) -> Self {
        let period_type = match payload.period_type.as_deref() {
            Some("Yearly") => PeriodType::Yearly,
            _ => PeriodType::Monthly,
        };
        DataSet {
            id: payload.id,
            code: payload.code,
            name: payload.name,
            organisation_units: payload.organisation_units,
            data_elements: payload
                .data_set_elements
                .into_iter()
                .map(|element| element.data_element.into())
                .collect(),
            period_type,
        }
    }
}

impl HttpGateway {
    async fn fetch_data_sets(&self, filters: Vec<String>, or: bool) -> anyhow::Result<Vec<DataSet>> {
        let mut query = vec![
            ("fields", DATA_SET_FIELDS.to_string()),
            ("paging", "false".to_string()),
        ];
        query.extend(filters.into_iter().map(|filter| ("filter", filter)));
        if or {
            query.push(("rootJunction", "OR".to_string()));
        }

        let page: DataSetsPage = self.client.get_json("/api/dataSets", &query).await?;
        Ok(page.data_sets.into_iter().map(DataSet::from).collect())
    }
}

#[async_trait]
impl DataSetRepository for HttpGateway {
    async fn get_by_id(&self, id: &str) -> anyhow::Result<Vec<DataSet>> {
        self.fetch_data_sets(vec![format!("id:eq:{}", id)], false).await
    }

    async fn get_by_name_or_code(&self, name_or_code: &str) -> anyhow::Result<DataSet> {
        let data_sets = self
            .fetch_data_sets(
                vec![
                    format!("name:eq:{}", name_or_code),
                    format!("code:eq:{}", name_or_code),
                ],
                true,
            )
            .await?;

        let position = data_sets
            .iter()
            .position(|ds| ds.code == name_or_code)
            .unwrap_or(0);
        data_sets
            .into_iter()
            .nth(position)
            .ok_or_else(|| ApvdError::not_found("DataSet", name_or_code).into())
    }

    async fn get_by_codes(&self, codes: &[String]) -> anyhow::Result<Vec<DataSet>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let options = BatchOptions::new(DEFAULT_METADATA_CHUNK_SIZE, self.options.concurrency);
        tracing::debug!(codes = codes.len(), "resolving datasets by code");
        try_map_chunked(codes.to_vec(), options, |chunk| async move {
            self.fetch_data_sets(vec![format!("code:in:[{}]", chunk.join(","))], false)
                .await
        })
        .await
    }
}
