pub mod logging;

pub use logging::{LogRotation, LoggingConfig, LoggingEnv, LoggingGuard, init_logging};
