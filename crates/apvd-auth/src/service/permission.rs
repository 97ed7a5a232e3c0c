//! Permission evaluator
//!
//! Grants are a pure union: a user may perform an action when listed by
//! username, when one of their groups is listed, or when they are a super
//! administrator. There are no deny lists.

use apvd_api::{ConfigAction, DataSetConfiguration, User};
use apvd_common::ApvdError;

pub fn can_perform(
    config: &DataSetConfiguration,
    action: ConfigAction,
    username: &str,
    user_group_codes: &[&str],
    is_super_admin: bool,
) -> bool {
    if is_super_admin {
        return true;
    }

    let granted = config.permissions.get(action);
    granted.users.iter().any(|user| user == username)
        || granted
            .user_groups
            .iter()
            .any(|group| user_group_codes.contains(&group.as_str()))
}

pub fn can_user_perform(config: &DataSetConfiguration, action: ConfigAction, user: &User) -> bool {
    can_perform(
        config,
        action,
        &user.username,
        &user.group_codes(),
        user.is_super_admin,
    )
}

/// Fails with `ApvdError::PermissionDenied` naming the user, action and configuration
pub fn require_permission(
    config: &DataSetConfiguration,
    action: ConfigAction,
    user: &User,
) -> Result<(), ApvdError> {
    if can_user_perform(config, action, user) {
        return Ok(());
    }

    tracing::warn!(
        username = %user.username,
        action = %action,
        configuration = %config.code(),
        "permission denied"
    );
    Err(ApvdError::PermissionDenied(format!(
        "User {} is not allowed to {} on DataSet {}",
        user.username, action, config.data_set_original_code
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apvd_api::{ActionPermissions, UserGroupRef};
    use proptest::prelude::*;

    fn config_with(action: ConfigAction, users: &[&str], groups: &[&str]) -> DataSetConfiguration {
        DataSetConfiguration::initial()
            .update_data_set_original("NHWA-M1-2023")
            .update_permissions_for_action(
                action,
                ActionPermissions::new(
                    users.iter().map(|u| u.to_string()).collect(),
                    groups.iter().map(|g| g.to_string()).collect(),
                ),
            )
    }

    #[test]
    fn test_direct_user_grant() {
        let config = config_with(ConfigAction::Submit, &["jane"], &["APPROVERS"]);
        assert!(can_perform(&config, ConfigAction::Submit, "jane", &[], false));
        assert!(can_perform(&config, ConfigAction::Submit, "jane", &["OTHERS"], false));
    }

    #[test]
    fn test_group_grant() {
        let config = config_with(ConfigAction::Approve, &["jane"], &["APPROVERS"]);
        assert!(can_perform(
            &config,
            ConfigAction::Approve,
            "john",
            &["OTHERS", "APPROVERS"],
            false
        ));
    }

    #[test]
    fn test_no_grant() {
        let config = config_with(ConfigAction::Approve, &["jane"], &["APPROVERS"]);
        assert!(!can_perform(&config, ConfigAction::Approve, "john", &["OTHERS"], false));
        // grants do not leak between actions
        assert!(!can_perform(&config, ConfigAction::Revoke, "jane", &["APPROVERS"], false));
    }

    #[test]
    fn test_super_admin_overrides_empty_lists() {
        let config = DataSetConfiguration::initial();
        for action in ConfigAction::ALL {
            assert!(can_perform(&config, action, "admin", &[], true));
        }
    }

    #[test]
    fn test_require_permission_message() {
        let config = config_with(ConfigAction::Read, &[], &["VIEWERS"]);
        let viewer = User {
            username: "jane".to_string(),
            user_groups: vec![UserGroupRef {
                id: "g1".to_string(),
                code: "VIEWERS".to_string(),
                name: "Viewers".to_string(),
            }],
            ..Default::default()
        };
        assert!(require_permission(&config, ConfigAction::Read, &viewer).is_ok());

        let err = require_permission(&config, ConfigAction::Complete, &viewer).unwrap_err();
        assert_eq!(
            err,
            ApvdError::PermissionDenied(
                "User jane is not allowed to complete on DataSet NHWA-M1-2023".to_string()
            )
        );
    }

    proptest! {
        #[test]
        fn prop_super_admin_always_allowed(
            users in proptest::collection::vec("[a-z]{1,6}", 0..4),
            groups in proptest::collection::vec("[A-Z]{1,6}", 0..4),
            username in "[a-z]{1,6}",
        ) {
            let config = DataSetConfiguration::initial().update_permissions_for_action(
                ConfigAction::Complete,
                ActionPermissions::new(users, groups),
            );
            prop_assert!(can_perform(&config, ConfigAction::Complete, &username, &[], true));
        }

        #[test]
        fn prop_grant_is_union_of_user_and_groups(
            users in proptest::collection::vec("[a-z]{1,6}", 0..4),
            groups in proptest::collection::vec("[A-Z]{1,6}", 0..4),
            username in "[a-z]{1,6}",
            caller_groups in proptest::collection::vec("[A-Z]{1,6}", 0..4),
        ) {
            let expected = users.contains(&username)
                || caller_groups.iter().any(|g| groups.contains(g));
            let config = DataSetConfiguration::initial().update_permissions_for_action(
                ConfigAction::Revoke,
                ActionPermissions::new(users, groups),
            );
            let caller_groups: Vec<&str> = caller_groups.iter().map(String::as_str).collect();
            prop_assert_eq!(
                can_perform(&config, ConfigAction::Revoke, &username, &caller_groups, false),
                expected
            );
        }
    }
}
