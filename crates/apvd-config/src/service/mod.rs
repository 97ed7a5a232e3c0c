//! Configuration service layer

pub mod configuration;

pub use configuration::DataSetConfigurationService;
