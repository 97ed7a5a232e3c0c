//! Input validation for dataset configurations
//!
//! Validation is a pure function returning every failing property. It never
//! raises; callers decide whether a non-empty result blocks the save.

use serde::{Deserialize, Serialize};
use validator::ValidationError;

use apvd_common::is_blank;

use crate::configuration::DataSetConfiguration;

pub const CANNOT_BE_BLANK: &str = "cannot_be_blank";
pub const DATA_SETS_MUST_DIFFER: &str = "data_sets_must_differ";

/// One property that failed validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub property: String,
    pub value: String,
    pub errors: Vec<String>,
}

/// Required field must contain something other than whitespace
pub fn validate_required(value: &str) -> Result<(), ValidationError> {
    if is_blank(value) {
        return Err(ValidationError::new(CANNOT_BE_BLANK));
    }
    Ok(())
}

/// Original and destination datasets must differ
pub fn validate_distinct_data_sets(original: &str, destination: &str) -> Result<(), ValidationError> {
    if original == destination {
        return Err(ValidationError::new(DATA_SETS_MUST_DIFFER));
    }
    Ok(())
}

/// Validate a configuration before persisting it
pub fn validate_configuration(config: &DataSetConfiguration) -> Vec<ValidationFailure> {
    let required = [
        ("dataSetOriginalCode", &config.data_set_original_code),
        ("dataSetDestinationCode", &config.data_set_destination_code),
        ("submissionDateCode", &config.submission_date_code),
        ("approvalDateCode", &config.approval_date_code),
        ("dataSourceId", &config.data_source_id),
    ];

    let mut failures: Vec<ValidationFailure> = required
        .into_iter()
        .filter_map(|(property, value)| {
            validate_required(value).err().map(|error| ValidationFailure {
                property: property.to_string(),
                value: value.to_string(),
                errors: vec![error.code.to_string()],
            })
        })
        .collect();

    if let Err(error) = validate_distinct_data_sets(
        &config.data_set_original_code,
        &config.data_set_destination_code,
    ) {
        let code = error.code.to_string();
        match failures
            .iter_mut()
            .find(|failure| failure.property == "dataSetDestinationCode")
        {
            Some(failure) => failure.errors.push(code),
            None => failures.push(ValidationFailure {
                property: "dataSetDestinationCode".to_string(),
                value: config.data_set_destination_code.clone(),
                errors: vec![code],
            }),
        }
    }

    failures
}
