//! Shared fixture: an NHWA dataset with its approval copy, backed by `MemoryStore`

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use apvd_api::{
    ActionPermissions, AppSettings, CategoryCombo, CategoryOptionCombo, ConfigAction, DataElement,
    DataSet, DataSetConfiguration, DataSetSettings, DataValue, IdRef, User, UserGroupRef,
};
use apvd_common::BatchOptions;
use apvd_core::{CoreServices, Repositories};
use apvd_persistence::MemoryStore;

pub const ORIGINAL_ID: &str = "ds1";
pub const ORIGINAL_CODE: &str = "NHWA-M1-2023";
pub const APPROVAL_ID: &str = "ds2";
pub const APPROVAL_CODE: &str = "NHWA-M1-2023-APVD";
pub const PERIOD: &str = "2023";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

pub fn element(id: &str, name: &str, code: &str) -> DataElement {
    DataElement {
        id: id.to_string(),
        name: name.to_string(),
        original_name: name.to_string(),
        code: code.to_string(),
        category_combo: CategoryCombo {
            id: "cc-default".to_string(),
            category_option_combos: vec![CategoryOptionCombo::new("coc1", "default")],
        },
    }
}

pub fn data_set(id: &str, code: &str, elements: Vec<DataElement>, org_units: &[&str]) -> DataSet {
    DataSet {
        id: id.to_string(),
        code: code.to_string(),
        name: code.to_string(),
        organisation_units: org_units.iter().map(|ou| IdRef::new(*ou)).collect(),
        data_elements: elements,
        ..Default::default()
    }
}

pub fn original_data_set() -> DataSet {
    data_set(
        ORIGINAL_ID,
        ORIGINAL_CODE,
        vec![
            element("de1", "Doctors", "DOC"),
            element("de-sub", "Submission date", "SUBMISSION_DATE"),
        ],
        &["X", "Y"],
    )
}

/// Assigned to org unit X only
pub fn approval_data_set() -> DataSet {
    data_set(
        APPROVAL_ID,
        APPROVAL_CODE,
        vec![
            element("a-de1", "Doctors-APVD", "DOC-APVD"),
            element("a-date", "Approval date", "APPROVAL_DATE"),
        ],
        &["X"],
    )
}

pub fn settings_for(pairs: &[(&str, &str)]) -> AppSettings {
    let data_sets: HashMap<String, DataSetSettings> = pairs
        .iter()
        .map(|(original, approval)| {
            (
                original.to_string(),
                DataSetSettings {
                    data_source_id: "src".to_string(),
                    approval_data_set_code: approval.to_string(),
                    ..Default::default()
                },
            )
        })
        .collect();
    AppSettings { data_sets }
}

pub fn configuration(original: &str, destination: &str, username: &str) -> DataSetConfiguration {
    let mut config = DataSetConfiguration::initial()
        .update_data_set_original(original)
        .update_data_set_destination(destination)
        .update_submission_date_element("SUBMISSION_DATE")
        .update_approval_date_element("APPROVAL_DATE")
        .update_data_source("src");
    for action in ConfigAction::ALL {
        config = config.update_permissions_for_action(
            action,
            ActionPermissions::new(vec![username.to_string()], vec![]),
        );
    }
    config
}

pub fn user(username: &str) -> User {
    User {
        id: format!("id-{}", username),
        username: username.to_string(),
        user_groups: vec![UserGroupRef {
            id: "g1".to_string(),
            code: "FIELD_STAFF".to_string(),
            name: "Field staff".to_string(),
        }],
        ..Default::default()
    }
}

pub fn value(element: &str, org_unit: &str, value: &str) -> DataValue {
    DataValue {
        data_element: element.to_string(),
        period: PERIOD.to_string(),
        org_unit: org_unit.to_string(),
        category_option_combo: "coc1".to_string(),
        value: value.to_string(),
        ..Default::default()
    }
}

/// NHWA datasets, settings and a configuration granting every action to `jane`
pub fn store() -> MemoryStore {
    MemoryStore::new()
        .with_data_set(original_data_set())
        .with_data_set(approval_data_set())
        .with_settings(settings_for(&[(ORIGINAL_CODE, APPROVAL_CODE)]))
        .with_configuration(configuration(ORIGINAL_CODE, APPROVAL_CODE, "jane"))
        .with_current_user(user("jane"))
}

pub fn services(store: Arc<MemoryStore>) -> CoreServices {
    services_with(store, BatchOptions::default())
}

pub fn services_with(store: Arc<MemoryStore>, options: BatchOptions) -> CoreServices {
    CoreServices::new(&Repositories::shared(store), options)
}
