// In-memory persistence backend
// Keeps every collaborator's state behind RwLocks; used by tests and dry runs

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use apvd_api::{
    AppSettings, DataApprovalItemIdentifier, DataSet, DataSetConfiguration, DataValue,
    DataValueToPost, DataValuesSelector, MonitoringValue, User,
};
use apvd_common::{ApvdError, ErrorMessage, Stats};

use crate::traits::{
    AppSettingsRepository, DataApprovalRepository, DataSetConfigurationRepository,
    DataSetRepository, DataValuesRepository, MonitoringRepository, UserRepository,
};

/// Conflict code reported for values the store refuses
const REJECTED_VALUE_CODE: &str = "E7633";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApprovalOperation {
    Complete,
    Incomplete,
    Approve,
    Unapprove,
}

/// One command received by the approval repository
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApprovalCall {
    pub operation: ApprovalOperation,
    pub items: Vec<DataApprovalItemIdentifier>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteKind {
    Save,
    Delete,
}

/// One batch received by the value store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteCall {
    pub kind: WriteKind,
    pub values: Vec<DataValueToPost>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApprovalState {
    pub completed: bool,
    pub approved: bool,
}

type CellKey = (String, String, String);

fn cell_of(item: &DataApprovalItemIdentifier) -> CellKey {
    (
        item.data_set.clone(),
        item.org_unit.clone(),
        item.period.clone(),
    )
}

fn same_cell(value: &DataValue, post: &DataValueToPost) -> bool {
    value.data_element == post.data_element
        && value.period == post.period
        && value.org_unit == post.org_unit
        && value.category_option_combo == post.category_option_combo
        && value.attribute_option_combo == post.attribute_option_combo.clone().unwrap_or_default()
}

/// In-memory implementation of every repository trait
#[derive(Default)]
pub struct MemoryStore {
    data_sets: RwLock<Vec<DataSet>>,
    org_unit_parents: RwLock<HashMap<String, String>>,
    data_values: RwLock<Vec<DataValue>>,
    rejected_data_elements: RwLock<HashSet<String>>,
    write_calls: RwLock<Vec<WriteCall>>,
    configurations: RwLock<BTreeMap<String, DataSetConfiguration>>,
    current_user: RwLock<User>,
    users: RwLock<Vec<User>>,
    settings: RwLock<AppSettings>,
    approval_states: RwLock<HashMap<CellKey, ApprovalState>>,
    approval_calls: RwLock<Vec<ApprovalCall>>,
    failing_operations: RwLock<HashSet<ApprovalOperation>>,
    monitoring: RwLock<Vec<MonitoringValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Setup ====================

    pub fn with_data_set(self, data_set: DataSet) -> Self {
        self.data_sets.write().push(data_set);
        self
    }

    pub fn with_org_unit_parent(self, child: &str, parent: &str) -> Self {
        self.org_unit_parents
            .write()
            .insert(child.to_string(), parent.to_string());
        self
    }

    pub fn with_data_value(self, value: DataValue) -> Self {
        self.data_values.write().push(value);
        self
    }

    pub fn with_current_user(self, user: User) -> Self {
        self.users.write().push(user.clone());
        *self.current_user.write() = user;
        self
    }

    pub fn with_user(self, user: User) -> Self {
        self.users.write().push(user);
        self
    }

    pub fn with_settings(self, settings: AppSettings) -> Self {
        *self.settings.write() = settings;
        self
    }

    pub fn with_configuration(self, config: DataSetConfiguration) -> Self {
        self.configurations.write().insert(config.code(), config);
        self
    }

    pub fn with_approval_state(self, item: &DataApprovalItemIdentifier, state: ApprovalState) -> Self {
        self.approval_states.write().insert(cell_of(item), state);
        self
    }

    /// Values for this data element are refused with a conflict
    pub fn reject_data_element(&self, data_element_id: &str) {
        self.rejected_data_elements
            .write()
            .insert(data_element_id.to_string());
    }

    /// Commands of this kind report `false`
    pub fn fail_operation(&self, operation: ApprovalOperation) {
        self.failing_operations.write().insert(operation);
    }

    // ==================== Inspection ====================

    pub fn data_values(&self) -> Vec<DataValue> {
        self.data_values.read().clone()
    }

    pub fn write_calls(&self) -> Vec<WriteCall> {
        self.write_calls.read().clone()
    }

    pub fn approval_calls(&self) -> Vec<ApprovalCall> {
        self.approval_calls.read().clone()
    }

    pub fn approval_state(&self, item: &DataApprovalItemIdentifier) -> ApprovalState {
        self.approval_states
            .read()
            .get(&cell_of(item))
            .copied()
            .unwrap_or_default()
    }

    pub fn configuration_count(&self) -> usize {
        self.configurations.read().len()
    }

    // ==================== Helpers ====================

    fn is_within(&self, org_unit: &str, roots: &HashSet<&str>, children: bool) -> bool {
        if roots.contains(org_unit) {
            return true;
        }
        if !children {
            return false;
        }

        let parents = self.org_unit_parents.read();
        let mut current = org_unit;
        let mut depth = 0;
        while let Some(parent) = parents.get(current) {
            if roots.contains(parent.as_str()) {
                return true;
            }
            current = parent;
            depth += 1;
            if depth > parents.len() {
                break;
            }
        }
        false
    }

    fn record_approval(
        &self,
        operation: ApprovalOperation,
        items: &[DataApprovalItemIdentifier],
    ) -> bool {
        self.approval_calls.write().push(ApprovalCall {
            operation,
            items: items.to_vec(),
        });

        if self.failing_operations.read().contains(&operation) {
            tracing::debug!(?operation, "approval operation configured to fail");
            return false;
        }

        let mut states = self.approval_states.write();
        for item in items {
            let state = states.entry(cell_of(item)).or_default();
            match operation {
                ApprovalOperation::Complete => state.completed = true,
                ApprovalOperation::Incomplete => state.completed = false,
                ApprovalOperation::Approve => state.approved = true,
                ApprovalOperation::Unapprove => state.approved = false,
            }
        }
        true
    }
}

#[async_trait]
impl DataSetRepository for MemoryStore {
    async fn get_by_id(&self, id: &str) -> anyhow::Result<Vec<DataSet>> {
        Ok(self
            .data_sets
            .read()
            .iter()
            .filter(|ds| ds.id == id)
            .cloned()
            .collect())
    }

    async fn get_by_name_or_code(&self, name_or_code: &str) -> anyhow::Result<DataSet> {
        self.data_sets
            .read()
            .iter()
            .find(|ds| ds.name == name_or_code || ds.code == name_or_code)
            .cloned()
            .ok_or_else(|| ApvdError::not_found("DataSet", name_or_code).into())
    }

    async fn get_by_codes(&self, codes: &[String]) -> anyhow::Result<Vec<DataSet>> {
        Ok(self
            .data_sets
            .read()
            .iter()
            .filter(|ds| codes.contains(&ds.code))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DataValuesRepository for MemoryStore {
    async fn get(&self, selector: &DataValuesSelector) -> anyhow::Result<Vec<DataValue>> {
        let (element_ids, element_names) = {
            let data_sets = self.data_sets.read();
            let names: HashMap<String, String> = data_sets
                .iter()
                .flat_map(|ds| ds.data_elements.iter())
                .map(|de| (de.id.clone(), de.basic_name().to_string()))
                .collect();
            let ids: HashSet<String> = data_sets
                .iter()
                .filter(|ds| selector.data_set_ids.contains(&ds.id))
                .flat_map(|ds| ds.data_elements.iter().map(|de| de.id.clone()))
                .collect();
            (ids, names)
        };
        let roots: HashSet<&str> = selector.org_unit_ids.iter().map(String::as_str).collect();

        let values = self
            .data_values
            .read()
            .iter()
            .filter(|dv| !dv.is_deleted())
            .filter(|dv| selector.data_set_ids.is_empty() || element_ids.contains(&dv.data_element))
            .filter(|dv| roots.is_empty() || self.is_within(&dv.org_unit, &roots, selector.children))
            .filter(|dv| selector.periods.is_empty() || selector.periods.contains(&dv.period))
            .map(|dv| DataValue {
                data_element_name: element_names
                    .get(&dv.data_element)
                    .cloned()
                    .unwrap_or_default(),
                ..dv.clone()
            })
            .collect();

        Ok(values)
    }

    async fn save_all(&self, values: &[DataValueToPost]) -> Stats {
        self.write_calls.write().push(WriteCall {
            kind: WriteKind::Save,
            values: values.to_vec(),
        });

        let rejected = self.rejected_data_elements.read().clone();
        let mut stored = self.data_values.write();
        let mut stats = Stats::empty();

        for post in values {
            if rejected.contains(&post.data_element) {
                stats.ignored += 1;
                stats.error_messages.push(ErrorMessage::new(
                    post.data_element.clone(),
                    format!("ERROR: {}: {}", REJECTED_VALUE_CODE, post.value),
                ));
                continue;
            }

            match stored.iter_mut().find(|dv| same_cell(dv, post)) {
                Some(existing) => {
                    existing.value = post.value.clone();
                    existing.comment = post.comment.clone();
                    stats.updated += 1;
                }
                None => {
                    stored.push(DataValue {
                        data_element: post.data_element.clone(),
                        period: post.period.clone(),
                        org_unit: post.org_unit.clone(),
                        category_option_combo: post.category_option_combo.clone(),
                        attribute_option_combo: post.attribute_option_combo.clone().unwrap_or_default(),
                        value: post.value.clone(),
                        comment: post.comment.clone(),
                        ..Default::default()
                    });
                    stats.imported += 1;
                }
            }
        }

        stats
    }

    async fn delete_all(&self, values: &[DataValueToPost]) -> Stats {
        self.write_calls.write().push(WriteCall {
            kind: WriteKind::Delete,
            values: values.to_vec(),
        });

        let mut stored = self.data_values.write();
        let mut stats = Stats::empty();

        for post in values {
            match stored.iter().position(|dv| same_cell(dv, post)) {
                Some(index) => {
                    stored.remove(index);
                    stats.deleted += 1;
                }
                None => stats.ignored += 1,
            }
        }

        stats
    }
}

#[async_trait]
impl DataSetConfigurationRepository for MemoryStore {
    async fn get_by_code(&self, code: &str) -> anyhow::Result<DataSetConfiguration> {
        self.configurations
            .read()
            .get(code)
            .cloned()
            .ok_or_else(|| ApvdError::not_found("DataSetConfiguration", code).into())
    }

    async fn get_all(&self) -> anyhow::Result<Vec<DataSetConfiguration>> {
        Ok(self.configurations.read().values().cloned().collect())
    }

    async fn save(&self, config: &DataSetConfiguration) -> anyhow::Result<()> {
        self.configurations
            .write()
            .insert(config.code(), config.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> anyhow::Result<()> {
        let mut configurations = self.configurations.write();
        let before = configurations.len();
        configurations.retain(|_, config| config.id != id);

        if configurations.len() == before {
            return Err(ApvdError::not_found("DataSetConfiguration", id).into());
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_current(&self) -> anyhow::Result<User> {
        Ok(self.current_user.read().clone())
    }

    async fn get_by_usernames(&self, usernames: &[String]) -> anyhow::Result<Vec<User>> {
        Ok(self
            .users
            .read()
            .iter()
            .filter(|user| usernames.contains(&user.username))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AppSettingsRepository for MemoryStore {
    async fn get(&self) -> anyhow::Result<AppSettings> {
        Ok(self.settings.read().clone())
    }
}

#[async_trait]
impl DataApprovalRepository for MemoryStore {
    async fn complete(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool> {
        Ok(self.record_approval(ApprovalOperation::Complete, items))
    }

    async fn incomplete(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool> {
        Ok(self.record_approval(ApprovalOperation::Incomplete, items))
    }

    async fn approve(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool> {
        Ok(self.record_approval(ApprovalOperation::Approve, items))
    }

    async fn unapprove(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool> {
        Ok(self.record_approval(ApprovalOperation::Unapprove, items))
    }
}

#[async_trait]
impl MonitoringRepository for MemoryStore {
    async fn get(&self) -> anyhow::Result<Vec<MonitoringValue>> {
        Ok(self.monitoring.read().clone())
    }

    async fn save(&self, values: &[MonitoringValue]) -> anyhow::Result<()> {
        *self.monitoring.write() = values.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apvd_api::{CategoryCombo, CategoryOptionCombo, DataElement};
    use apvd_common::is_not_found;

    fn data_set() -> DataSet {
        DataSet {
            id: "ds1".to_string(),
            code: "NHWA-M1-2023".to_string(),
            name: "NHWA Module 1".to_string(),
            data_elements: vec![DataElement {
                id: "de1".to_string(),
                name: "Doctors".to_string(),
                original_name: "Doctors".to_string(),
                code: "DOC".to_string(),
                category_combo: CategoryCombo {
                    id: "cc1".to_string(),
                    category_option_combos: vec![CategoryOptionCombo::new("coc1", "default")],
                },
            }],
            ..Default::default()
        }
    }

    fn value(org_unit: &str, value: &str) -> DataValue {
        DataValue {
            data_element: "de1".to_string(),
            period: "2023".to_string(),
            org_unit: org_unit.to_string(),
            category_option_combo: "coc1".to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }

    fn post(value: &str) -> DataValueToPost {
        DataValueToPost {
            data_element: "de1".to_string(),
            period: "2023".to_string(),
            org_unit: "ou1".to_string(),
            category_option_combo: "coc1".to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_fills_data_element_name() {
        let store = MemoryStore::new()
            .with_data_set(data_set())
            .with_data_value(value("ou1", "10"));

        let values = DataValuesRepository::get(
            &store,
            &DataValuesSelector::for_cell("ds1", "ou1", "2023", false),
        )
        .await
        .unwrap();

        assert_eq!(values.len(), 1);
        assert_eq!(values[0].data_element_name, "Doctors");
    }

    #[tokio::test]
    async fn test_get_with_children_includes_descendants() {
        let store = MemoryStore::new()
            .with_data_set(data_set())
            .with_org_unit_parent("district", "country")
            .with_org_unit_parent("facility", "district")
            .with_data_value(value("country", "1"))
            .with_data_value(value("facility", "2"))
            .with_data_value(value("elsewhere", "3"));

        let own = DataValuesRepository::get(
            &store,
            &DataValuesSelector::for_cell("ds1", "country", "2023", false),
        )
        .await
        .unwrap();
        assert_eq!(own.len(), 1);

        let tree = DataValuesRepository::get(
            &store,
            &DataValuesSelector::for_cell("ds1", "country", "2023", true),
        )
        .await
        .unwrap();
        let org_units: Vec<&str> = tree.iter().map(|dv| dv.org_unit.as_str()).collect();
        assert_eq!(org_units, vec!["country", "facility"]);
    }

    #[tokio::test]
    async fn test_save_all_upserts_and_reports_rejections() {
        let store = MemoryStore::new().with_data_set(data_set());

        let stats = store.save_all(&[post("10")]).await;
        assert_eq!(stats.imported, 1);

        let stats = store.save_all(&[post("12")]).await;
        assert_eq!(stats.updated, 1);
        assert_eq!(store.data_values()[0].value, "12");

        store.reject_data_element("de1");
        let stats = store.save_all(&[post("13")]).await;
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.error_messages[0].message, "ERROR: E7633: 13");
        assert_eq!(store.write_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_all() {
        let store = MemoryStore::new().with_data_value(DataValue {
            data_element: "de1".to_string(),
            period: "2023".to_string(),
            org_unit: "ou1".to_string(),
            category_option_combo: "coc1".to_string(),
            value: "10".to_string(),
            ..Default::default()
        });

        let stats = store.delete_all(&[post(""), post("")]).await;
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.ignored, 1);
        assert!(store.data_values().is_empty());
    }

    #[tokio::test]
    async fn test_configuration_lookup_and_remove() {
        let config = DataSetConfiguration::initial()
            .update_data_set_original("A")
            .update_data_set_destination("B");
        let store = MemoryStore::new().with_configuration(config.clone());

        assert_eq!(store.get_by_code("DS_A_B").await.unwrap(), config);
        let err = store.get_by_code("DS_A_C").await.unwrap_err();
        assert!(is_not_found(&err));

        store.remove(&config.id).await.unwrap();
        assert_eq!(store.configuration_count(), 0);
        assert!(is_not_found(&store.remove(&config.id).await.unwrap_err()));
    }

    #[tokio::test]
    async fn test_approval_operations_track_state() {
        let item = DataApprovalItemIdentifier::new("ds1", "ou1", "2023");
        let store = MemoryStore::new();

        assert!(store.complete(std::slice::from_ref(&item)).await.unwrap());
        assert!(store.approve(std::slice::from_ref(&item)).await.unwrap());
        assert_eq!(
            store.approval_state(&item),
            ApprovalState {
                completed: true,
                approved: true
            }
        );

        store.fail_operation(ApprovalOperation::Unapprove);
        assert!(!store.unapprove(std::slice::from_ref(&item)).await.unwrap());
        assert!(store.approval_state(&item).approved);
        assert_eq!(store.approval_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_get_by_name_or_code_not_found() {
        let store = MemoryStore::new().with_data_set(data_set());
        assert_eq!(
            store.get_by_name_or_code("NHWA Module 1").await.unwrap().id,
            "ds1"
        );
        let err = store.get_by_name_or_code("missing").await.unwrap_err();
        assert!(is_not_found(&err));
    }
}
