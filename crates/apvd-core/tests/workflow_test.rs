//! Workflow orchestrator scenarios against the in-memory store

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use apvd_api::{
    DataApprovalItemIdentifier, DataSetConfiguration, DataValue, DataValueToPost,
    DataValuesSelector, WorkflowAction,
};
use apvd_common::{ApvdError, BatchOptions, Stats};
use apvd_core::{CoreServices, Repositories};
use apvd_persistence::{
    ApprovalCall, ApprovalOperation, ApprovalState, DataValuesRepository, MemoryStore, async_trait,
};

use common::*;

fn item(org_unit: &str) -> DataApprovalItemIdentifier {
    DataApprovalItemIdentifier::new(ORIGINAL_ID, org_unit, PERIOD)
}

fn operations(calls: &[ApprovalCall]) -> Vec<ApprovalOperation> {
    calls.iter().map(|call| call.operation).collect()
}

#[tokio::test]
async fn test_complete_and_incomplete() {
    let store = Arc::new(store());
    let workflow = services(store.clone()).workflow;

    let report = workflow
        .execute(WorkflowAction::Complete, &[item("X"), item("Y")])
        .await
        .unwrap();
    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 1);
    assert!(store.approval_state(&item("Y")).completed);

    let report = workflow
        .execute(WorkflowAction::Incomplete, &[item("X")])
        .await
        .unwrap();
    assert!(report.is_success());
    assert!(!store.approval_state(&item("X")).completed);
    assert!(store.approval_state(&item("Y")).completed);
}

#[tokio::test]
async fn test_revoke_calls_unapprove_and_incomplete() {
    let approved = ApprovalState {
        completed: true,
        approved: true,
    };
    let store = Arc::new(store().with_approval_state(&item("X"), approved));
    store.fail_operation(ApprovalOperation::Incomplete);

    let report = services(store.clone())
        .workflow
        .execute(WorkflowAction::Revoke, &[item("X")])
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(
        operations(&store.approval_calls()),
        vec![ApprovalOperation::Unapprove, ApprovalOperation::Incomplete]
    );
    // the unapprove step went through on its own
    assert!(!store.approval_state(&item("X")).approved);
}

#[tokio::test]
async fn test_revoke_fails_when_unapprove_fails() {
    let store = Arc::new(store());
    store.fail_operation(ApprovalOperation::Unapprove);

    let report = services(store.clone())
        .workflow
        .execute(WorkflowAction::Revoke, &[item("X")])
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(store.approval_calls().len(), 2);
}

#[tokio::test]
async fn test_revoke_without_incomplete_flag() {
    let config = configuration(ORIGINAL_CODE, APPROVAL_CODE, "jane").update_revoke_and_incomplete(false);
    let store = Arc::new(store().with_configuration(config));

    let report = services(store.clone())
        .workflow
        .execute(WorkflowAction::Revoke, &[item("X")])
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(
        operations(&store.approval_calls()),
        vec![ApprovalOperation::Unapprove]
    );
}

#[tokio::test]
async fn test_revoke_with_stored_record_missing_incomplete_flag() {
    let mut record = serde_json::to_value(configuration(ORIGINAL_CODE, APPROVAL_CODE, "jane")).unwrap();
    record.as_object_mut().unwrap().remove("revokeAndIncomplete");
    let config: DataSetConfiguration = serde_json::from_value(record).unwrap();

    let approved = ApprovalState {
        completed: true,
        approved: true,
    };
    let store = Arc::new(
        store()
            .with_configuration(config)
            .with_approval_state(&item("X"), approved),
    );

    let report = services(store.clone())
        .workflow
        .execute(WorkflowAction::Revoke, &[item("X")])
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(
        operations(&store.approval_calls()),
        vec![ApprovalOperation::Unapprove, ApprovalOperation::Incomplete]
    );
    let state = store.approval_state(&item("X"));
    assert!(!state.approved);
    assert!(!state.completed);
}

#[tokio::test]
async fn test_submit_completes_and_stamps_submission_date() {
    let store = Arc::new(store());

    let report = services(store.clone())
        .workflow
        .execute_on(WorkflowAction::Submit, &[item("X")], today())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(
        operations(&store.approval_calls()),
        vec![ApprovalOperation::Approve, ApprovalOperation::Complete]
    );
    assert_eq!(report.stats().imported, 1);

    let stamped: Vec<_> = store
        .data_values()
        .into_iter()
        .filter(|dv| dv.data_element == "de-sub")
        .collect();
    assert_eq!(stamped.len(), 1);
    assert_eq!(stamped[0].value, "2024-01-15");
    assert_eq!(stamped[0].org_unit, "X");
}

#[tokio::test]
async fn test_submit_without_complete_flag() {
    let config = configuration(ORIGINAL_CODE, APPROVAL_CODE, "jane").update_submit_and_complete(false);
    let store = Arc::new(store().with_configuration(config));

    services(store.clone())
        .workflow
        .execute_on(WorkflowAction::Submit, &[item("X")], today())
        .await
        .unwrap();

    assert_eq!(
        operations(&store.approval_calls()),
        vec![ApprovalOperation::Approve]
    );
}

#[tokio::test]
async fn test_failed_submit_does_not_stamp() {
    let store = Arc::new(store());
    store.fail_operation(ApprovalOperation::Approve);

    let report = services(store.clone())
        .workflow
        .execute_on(WorkflowAction::Submit, &[item("X")], today())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert!(store.data_values().is_empty());
}

#[tokio::test]
async fn test_duplicate_copies_diff_and_stamps_approval_date() {
    let store = Arc::new(
        store()
            .with_data_value(value("de1", "X", "10"))
            .with_data_value(value("a-de1", "X", "12")),
    );

    let report = services(store.clone())
        .workflow
        .execute_on(WorkflowAction::Duplicate, &[item("X")], today())
        .await
        .unwrap();

    assert!(report.is_success());
    let stats = report.stats();
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.imported, 1);

    let values = store.data_values();
    let copied = values.iter().find(|dv| dv.data_element == "a-de1").unwrap();
    assert_eq!(copied.value, "10");
    let stamp = values.iter().find(|dv| dv.data_element == "a-date").unwrap();
    assert_eq!(stamp.value, "2024-01-15");
}

#[tokio::test]
async fn test_duplicate_after_submit_ignores_submission_date() {
    let store = Arc::new(store().with_data_value(value("de1", "X", "10")));
    let workflow = services(store.clone()).workflow;

    let submitted = workflow
        .execute_on(WorkflowAction::Submit, &[item("X")], today())
        .await
        .unwrap();
    assert!(submitted.is_success());
    assert!(store.data_values().iter().any(|dv| dv.data_element == "de-sub"));

    let duplicated = workflow
        .execute_on(WorkflowAction::Duplicate, &[item("X")], today())
        .await
        .unwrap();

    assert!(duplicated.is_success());
    let stats = duplicated.stats();
    assert!(stats.error_messages.is_empty());
    assert_eq!(stats.imported, 2);

    let values = store.data_values();
    let copied = values.iter().find(|dv| dv.data_element == "a-de1").unwrap();
    assert_eq!(copied.value, "10");
    let stamp = values.iter().find(|dv| dv.data_element == "a-date").unwrap();
    assert_eq!(stamp.value, "2024-01-15");
}

/// Delegates to the store while tracking how many reads run at once
struct CountingValues {
    inner: Arc<MemoryStore>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl DataValuesRepository for CountingValues {
    async fn get(&self, selector: &DataValuesSelector) -> anyhow::Result<Vec<DataValue>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        let values = DataValuesRepository::get(self.inner.as_ref(), selector).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        values
    }

    async fn save_all(&self, values: &[DataValueToPost]) -> Stats {
        self.inner.save_all(values).await
    }

    async fn delete_all(&self, values: &[DataValueToPost]) -> Stats {
        self.inner.delete_all(values).await
    }
}

#[tokio::test]
async fn test_duplicate_fetches_with_bounded_concurrency() {
    let store = Arc::new(store());
    let counting = Arc::new(CountingValues {
        inner: store.clone(),
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let mut repositories = Repositories::shared(store);
    repositories.data_values = counting.clone();
    let workflow = CoreServices::new(&repositories, BatchOptions::new(25, 3)).workflow;

    let items: Vec<_> = (0..20).map(|i| item(&format!("ou{}", i))).collect();
    let report = workflow
        .execute(WorkflowAction::Duplicate, &items)
        .await
        .unwrap();

    assert!(report.is_success());
    // each item reads both datasets together
    assert!(counting.peak.load(Ordering::SeqCst) <= 2 * 3);
}

#[tokio::test]
async fn test_duplicate_removes_retracted_values() {
    let store = Arc::new(store().with_data_value(value("a-de1", "X", "12")));

    let report = services(store.clone())
        .workflow
        .execute_on(WorkflowAction::Duplicate, &[item("X")], today())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.stats().deleted, 1);
    assert!(store.data_values().iter().all(|dv| dv.data_element != "a-de1"));
}

#[tokio::test]
async fn test_duplicate_with_no_diff_is_a_success_without_writes() {
    let store = Arc::new(
        store()
            .with_data_value(value("de1", "X", "10"))
            .with_data_value(value("a-de1", "X", "10")),
    );

    let report = services(store.clone())
        .workflow
        .execute(WorkflowAction::Duplicate, &[item("X")])
        .await
        .unwrap();

    assert!(report.is_success());
    assert!(store.write_calls().is_empty());
}

#[tokio::test]
async fn test_duplicate_fails_on_rejected_values() {
    let store = Arc::new(store().with_data_value(value("de1", "X", "10")));
    store.reject_data_element("a-de1");

    let report = services(store.clone())
        .workflow
        .execute_on(WorkflowAction::Duplicate, &[item("X")], today())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.stats().error_messages.len(), 1);
    assert!(report.stats().error_messages[0].message.starts_with("ERROR: "));
}

#[tokio::test]
async fn test_every_data_set_is_attempted() {
    let store = Arc::new(
        MemoryStore::new()
            .with_data_set(original_data_set())
            .with_data_set(approval_data_set())
            .with_data_set(data_set("ds3", "TB-2023", vec![element("de3", "Cases", "CASES")], &["X"]))
            .with_data_set(data_set(
                "ds4",
                "TB-2023-APVD",
                vec![
                    element("a-de3", "Cases-APVD", "CASES-APVD"),
                    element("a-date-tb", "Approval date", "APPROVAL_DATE"),
                ],
                &["X"],
            ))
            .with_settings(settings_for(&[
                (ORIGINAL_CODE, APPROVAL_CODE),
                ("TB-2023", "TB-2023-APVD"),
            ]))
            .with_configuration(configuration(ORIGINAL_CODE, APPROVAL_CODE, "jane"))
            .with_configuration(configuration("TB-2023", "TB-2023-APVD", "jane"))
            .with_current_user(user("jane"))
            .with_data_value(value("de3", "X", "4"))
            .with_data_value(value("de1", "X", "10")),
    );
    store.reject_data_element("a-de3");

    let items = vec![
        DataApprovalItemIdentifier::new("ds3", "X", PERIOD),
        item("X"),
    ];
    let report = services(store.clone())
        .workflow
        .execute_on(WorkflowAction::Duplicate, &items, today())
        .await
        .unwrap();

    assert!(!report.is_success());
    let outcomes: Vec<(&str, bool)> = report
        .outcomes
        .iter()
        .map(|outcome| (outcome.data_set_id.as_str(), outcome.success))
        .collect();
    assert_eq!(outcomes, vec![("ds3", false), ("ds1", true)]);
    assert!(store
        .data_values()
        .iter()
        .any(|dv| dv.data_element == "a-de1" && dv.value == "10"));
}

#[tokio::test]
async fn test_denied_action_issues_no_command() {
    let readonly = configuration("TB-2023", "TB-2023-APVD", "someone-else");
    let store = Arc::new(
        store()
            .with_data_set(data_set("ds3", "TB-2023", vec![], &["X"]))
            .with_configuration(readonly),
    );

    let items = vec![item("X"), DataApprovalItemIdentifier::new("ds3", "X", PERIOD)];
    let err = services(store.clone())
        .workflow
        .execute(WorkflowAction::Complete, &items)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApvdError>(),
        Some(ApvdError::PermissionDenied(_))
    ));
    assert!(store.approval_calls().is_empty());
}

#[tokio::test]
async fn test_super_admin_needs_no_grant() {
    let admin = apvd_api::User {
        username: "admin".to_string(),
        is_super_admin: true,
        ..Default::default()
    };
    let store = Arc::new(store().with_current_user(admin));

    let report = services(store.clone())
        .workflow
        .execute(WorkflowAction::Complete, &[item("X")])
        .await
        .unwrap();
    assert!(report.is_success());
}

#[tokio::test]
async fn test_missing_configuration_is_not_found() {
    let store = Arc::new(
        MemoryStore::new()
            .with_data_set(original_data_set())
            .with_current_user(user("jane")),
    );

    let err = services(store)
        .workflow
        .execute(WorkflowAction::Complete, &[item("X")])
        .await
        .unwrap_err();
    assert!(apvd_common::is_not_found(&err));
}

#[tokio::test]
async fn test_blank_period_is_rejected_before_any_lookup() {
    let store = Arc::new(store());
    let bad = DataApprovalItemIdentifier::new(ORIGINAL_ID, "X", "");

    let err = services(store.clone())
        .workflow
        .execute(WorkflowAction::Complete, &[bad])
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApvdError>(),
        Some(ApvdError::InvalidArgument(_))
    ));
    assert!(store.approval_calls().is_empty());
}
