//! Apvd Auth - Authorization for dataset configurations
//!
//! This crate provides:
//! - The permission evaluator deciding whether a user may perform an action
//! - `UserService`, a cached view of the current user

pub mod service;

pub use service::permission::{can_perform, can_user_perform, require_permission};
pub use service::user::UserService;
