//! Repository traits for the external collaborators
//!
//! Every call is an asynchronous boundary. Implementations exist for the
//! in-memory backend in this crate and for the HTTP gateway in `apvd-client`.

pub mod approval;
pub mod configuration;
pub mod data_set;
pub mod data_value;
pub mod settings;
pub mod user;

pub use approval::{DataApprovalRepository, MonitoringRepository};
pub use configuration::DataSetConfigurationRepository;
pub use data_set::DataSetRepository;
pub use data_value::DataValuesRepository;
pub use settings::AppSettingsRepository;
pub use user::UserRepository;
