use serde::{Deserialize, Serialize};

use apvd_api::{DataSet, DataSetConfiguration};

/// A configuration paired with the full record of its original dataset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalConfiguration {
    pub configuration: DataSetConfiguration,
    pub data_set: DataSet,
}
