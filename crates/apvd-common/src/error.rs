//! Error types and error codes for Apvd
//!
//! This module defines:
//! - `ApvdError`: Domain error enum raised by services and repositories
//! - `ErrorCode`: Structured error codes reported by the runner

use serde::{Deserialize, Serialize};

/// Message raised when a non super-admin tries to save a configuration
pub const ONLY_SUPER_ADMIN_SAVE: &str = "Only super administrators can save DataSet configurations";

/// Message raised when a non super-admin tries to remove a configuration
pub const ONLY_SUPER_ADMIN_REMOVE: &str =
    "Only super administrators can remove DataSet configurations";

/// Message raised when the derived configuration code is already taken
pub const CONFIGURATION_DUPLICATED: &str = "A configuration with the same code already exists.";

/// Message raised when original and destination datasets are the same
pub const SAME_ORIGIN_AND_DESTINATION: &str =
    "Original and destination DataSets must be different";

/// Application-specific error types
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApvdError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("gateway error: {0}")]
    Gateway(String),
}

impl ApvdError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        ApvdError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApvdError::NotFound { .. })
    }

    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            ApvdError::NotFound { .. } => RESOURCE_NOT_FOUND,
            ApvdError::PermissionDenied(_) => ACCESS_DENIED,
            ApvdError::AlreadyExists(_) => RESOURCE_CONFLICT,
            ApvdError::InvalidArgument(_) => PARAMETER_VALIDATE_ERROR,
            ApvdError::Validation(_) => PARAMETER_VALIDATE_ERROR,
            ApvdError::Gateway(_) => GATEWAY_ERROR,
        }
    }
}

/// Returns true when an `anyhow` error wraps `ApvdError::NotFound`
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApvdError>()
        .is_some_and(ApvdError::is_not_found)
}

/// Error code structure for reports and process exit status
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const ACCESS_DENIED: ErrorCode<'static> = ErrorCode {
    code: 10001,
    message: "access denied",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource conflict",
};

pub const GATEWAY_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30001,
    message: "gateway error",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apvd_error_display() {
        let err = ApvdError::not_found("DataSet", "abc");
        assert_eq!(err.to_string(), "DataSet not found: abc");

        let err = ApvdError::PermissionDenied(ONLY_SUPER_ADMIN_REMOVE.to_string());
        assert_eq!(
            err.to_string(),
            "Only super administrators can remove DataSet configurations"
        );

        let err = ApvdError::Validation(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "validation failed: a; b");
    }

    #[test]
    fn test_is_not_found_through_anyhow() {
        let err: anyhow::Error = ApvdError::not_found("DataSetConfiguration", "DS_A_B").into();
        assert!(is_not_found(&err));

        let err: anyhow::Error = ApvdError::Gateway("boom".to_string()).into();
        assert!(!is_not_found(&err));

        let err = anyhow::anyhow!("plain");
        assert!(!is_not_found(&err));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApvdError::AlreadyExists(CONFIGURATION_DUPLICATED.to_string()).error_code(),
            RESOURCE_CONFLICT
        );
        assert_eq!(
            ApvdError::PermissionDenied("x".to_string()).error_code().code,
            10001
        );
    }
}
