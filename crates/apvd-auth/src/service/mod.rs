//! Authorization service implementations

pub mod permission;
pub mod user;
