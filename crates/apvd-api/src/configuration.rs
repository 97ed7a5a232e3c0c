//! Dataset approval configuration
//!
//! A `DataSetConfiguration` is an immutable value: every `update_*` method
//! returns a new configuration and leaves the receiver untouched.

use serde::{Deserialize, Serialize};

use apvd_common::{CONFIGURATION_CODE_PREFIX, generate_uid};

/// Actions guarded by per-dataset permissions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigAction {
    Read,
    Complete,
    Incomplete,
    Revoke,
    Submit,
    Approve,
}

impl ConfigAction {
    pub const ALL: [ConfigAction; 6] = [
        ConfigAction::Read,
        ConfigAction::Complete,
        ConfigAction::Incomplete,
        ConfigAction::Revoke,
        ConfigAction::Submit,
        ConfigAction::Approve,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigAction::Read => "read",
            ConfigAction::Complete => "complete",
            ConfigAction::Incomplete => "incomplete",
            ConfigAction::Revoke => "revoke",
            ConfigAction::Submit => "submit",
            ConfigAction::Approve => "approve",
        }
    }
}

impl std::fmt::Display for ConfigAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConfigAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(ConfigAction::Read),
            "complete" => Ok(ConfigAction::Complete),
            "incomplete" => Ok(ConfigAction::Incomplete),
            "revoke" => Ok(ConfigAction::Revoke),
            "submit" => Ok(ConfigAction::Submit),
            "approve" => Ok(ConfigAction::Approve),
            _ => Err(format!("Invalid action: {}", s)),
        }
    }
}

/// Users and user groups granted one action
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPermissions {
    /// Usernames
    #[serde(default)]
    pub users: Vec<String>,
    /// User group codes
    #[serde(default)]
    pub user_groups: Vec<String>,
}

impl ActionPermissions {
    pub fn new(users: Vec<String>, user_groups: Vec<String>) -> Self {
        Self { users, user_groups }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.user_groups.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub read: ActionPermissions,
    #[serde(default)]
    pub complete: ActionPermissions,
    #[serde(default)]
    pub incomplete: ActionPermissions,
    #[serde(default)]
    pub revoke: ActionPermissions,
    #[serde(default)]
    pub submit: ActionPermissions,
    #[serde(default)]
    pub approve: ActionPermissions,
}

impl Permissions {
    pub fn get(&self, action: ConfigAction) -> &ActionPermissions {
        match action {
            ConfigAction::Read => &self.read,
            ConfigAction::Complete => &self.complete,
            ConfigAction::Incomplete => &self.incomplete,
            ConfigAction::Revoke => &self.revoke,
            ConfigAction::Submit => &self.submit,
            ConfigAction::Approve => &self.approve,
        }
    }

    fn get_mut(&mut self, action: ConfigAction) -> &mut ActionPermissions {
        match action {
            ConfigAction::Read => &mut self.read,
            ConfigAction::Complete => &mut self.complete,
            ConfigAction::Incomplete => &mut self.incomplete,
            ConfigAction::Revoke => &mut self.revoke,
            ConfigAction::Submit => &mut self.submit,
            ConfigAction::Approve => &mut self.approve,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetConfiguration {
    pub id: String,
    pub data_set_original_code: String,
    pub data_set_destination_code: String,
    pub submission_date_code: String,
    pub approval_date_code: String,
    #[serde(default)]
    pub permissions: Permissions,
    pub data_source_id: String,
    #[serde(default)]
    pub submit_and_complete: bool,
    #[serde(default = "default_revoke_and_incomplete")]
    pub revoke_and_incomplete: bool,
}

fn default_revoke_and_incomplete() -> bool {
    true
}

impl DataSetConfiguration {
    /// A blank configuration with a fresh id and no grants
    pub fn initial() -> Self {
        Self {
            id: generate_uid(),
            submit_and_complete: true,
            revoke_and_incomplete: true,
            ..Default::default()
        }
    }

    /// Storage key derived from the original and destination codes
    pub fn code(&self) -> String {
        build_configuration_code(&self.data_set_original_code, &self.data_set_destination_code)
    }

    #[must_use]
    pub fn update_data_set_original(&self, code: impl Into<String>) -> Self {
        self.update(|config| config.data_set_original_code = code.into())
    }

    #[must_use]
    pub fn update_data_set_destination(&self, code: impl Into<String>) -> Self {
        self.update(|config| config.data_set_destination_code = code.into())
    }

    #[must_use]
    pub fn update_submission_date_element(&self, code: impl Into<String>) -> Self {
        self.update(|config| config.submission_date_code = code.into())
    }

    #[must_use]
    pub fn update_approval_date_element(&self, code: impl Into<String>) -> Self {
        self.update(|config| config.approval_date_code = code.into())
    }

    #[must_use]
    pub fn update_permissions_for_action(
        &self,
        action: ConfigAction,
        permissions: ActionPermissions,
    ) -> Self {
        self.update(|config| *config.permissions.get_mut(action) = permissions)
    }

    #[must_use]
    pub fn update_data_source(&self, data_source_id: impl Into<String>) -> Self {
        self.update(|config| config.data_source_id = data_source_id.into())
    }

    #[must_use]
    pub fn update_submit_and_complete(&self, value: bool) -> Self {
        self.update(|config| config.submit_and_complete = value)
    }

    #[must_use]
    pub fn update_revoke_and_incomplete(&self, value: bool) -> Self {
        self.update(|config| config.revoke_and_incomplete = value)
    }

    /// Codes of the elements holding the submission and approval dates
    pub fn date_element_codes(&self) -> [&str; 2] {
        [&self.submission_date_code, &self.approval_date_code]
    }

    fn update(&self, f: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        f(&mut next);
        next
    }
}

pub fn build_configuration_code(original: &str, destination: &str) -> String {
    format!("{}_{}_{}", CONFIGURATION_CODE_PREFIX, original, destination)
}
