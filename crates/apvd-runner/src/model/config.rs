//! Configuration management for the runner
//!
//! Sources, lowest precedence first: the YAML file, `APVD__`-prefixed
//! environment variables (`APVD__SERVER__URL` sets `apvd.server.url`), then
//! command line overrides.

use config::{Config, Environment, File};

use apvd_client::HttpClientConfig;
use apvd_client::http::DEFAULT_DATA_STORE_NAMESPACE;
use apvd_common::BatchOptions;
use apvd_common::batch::{DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY};

use crate::cli::GlobalArgs;
use crate::startup::{LoggingConfig, LoggingEnv};

pub const SERVER_URL: &str = "apvd.server.url";
pub const SERVER_USERNAME: &str = "apvd.server.username";
pub const SERVER_PASSWORD: &str = "apvd.server.password";
pub const SERVER_CONTEXT_PATH: &str = "apvd.server.context_path";
pub const SERVER_CONNECT_TIMEOUT_MS: &str = "apvd.server.connect_timeout_ms";
pub const SERVER_READ_TIMEOUT_MS: &str = "apvd.server.read_timeout_ms";
pub const DATASTORE_NAMESPACE: &str = "apvd.datastore.namespace";
pub const BATCH_CHUNK_SIZE: &str = "apvd.batch.chunk_size";
pub const BATCH_CONCURRENCY: &str = "apvd.batch.concurrency";
pub const LOG_DIR: &str = "apvd.log.dir";
pub const LOG_LEVEL: &str = "apvd.log.level";
pub const LOG_CONSOLE: &str = "apvd.log.console";
pub const LOG_FILE: &str = "apvd.log.file";
pub const LOG_ROTATION: &str = "apvd.log.rotation";

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_READ_TIMEOUT_MS: u64 = 60000;

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn load(args: &GlobalArgs) -> anyhow::Result<Self> {
        let mut config_builder = Config::builder()
            .add_source(File::from(args.config.as_path()).required(false))
            .add_source(
                Environment::with_prefix("APVD")
                    .prefix_separator("__")
                    .separator("__")
                    .keep_prefix(true)
                    .try_parsing(true),
            );

        if let Some(v) = &args.server {
            config_builder = config_builder.set_override(SERVER_URL, v.as_str())?;
        }
        if let Some(v) = &args.username {
            config_builder = config_builder.set_override(SERVER_USERNAME, v.as_str())?;
        }
        if let Some(v) = &args.password {
            config_builder = config_builder.set_override(SERVER_PASSWORD, v.as_str())?;
        }

        Ok(Configuration {
            config: config_builder.build()?,
        })
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_url(&self) -> String {
        self.config
            .get_string(SERVER_URL)
            .unwrap_or(DEFAULT_SERVER_URL.to_string())
    }

    pub fn server_username(&self) -> String {
        self.config
            .get_string(SERVER_USERNAME)
            .unwrap_or("admin".to_string())
    }

    pub fn server_password(&self) -> String {
        self.config
            .get_string(SERVER_PASSWORD)
            .unwrap_or("district".to_string())
    }

    pub fn server_context_path(&self) -> String {
        self.config
            .get_string(SERVER_CONTEXT_PATH)
            .unwrap_or_default()
    }

    pub fn server_connect_timeout_ms(&self) -> u64 {
        self.config
            .get_int(SERVER_CONNECT_TIMEOUT_MS)
            .map(|v| v.max(0) as u64)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS)
    }

    pub fn server_read_timeout_ms(&self) -> u64 {
        self.config
            .get_int(SERVER_READ_TIMEOUT_MS)
            .map(|v| v.max(0) as u64)
            .unwrap_or(DEFAULT_READ_TIMEOUT_MS)
    }

    pub fn data_store_namespace(&self) -> String {
        self.config
            .get_string(DATASTORE_NAMESPACE)
            .unwrap_or(DEFAULT_DATA_STORE_NAMESPACE.to_string())
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig::new(&self.server_url())
            .with_auth(&self.server_username(), &self.server_password())
            .with_timeouts(
                self.server_connect_timeout_ms(),
                self.server_read_timeout_ms(),
            )
            .with_context_path(&self.server_context_path())
            .with_data_store_namespace(&self.data_store_namespace())
    }

    // ========================================================================
    // Batch Configuration
    // ========================================================================

    pub fn batch_chunk_size(&self) -> usize {
        self.config
            .get_int(BATCH_CHUNK_SIZE)
            .map(|v| v.max(1) as usize)
            .unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    pub fn batch_concurrency(&self) -> usize {
        self.config
            .get_int(BATCH_CONCURRENCY)
            .map(|v| v.max(1) as usize)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions::new(self.batch_chunk_size(), self.batch_concurrency())
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    /// `APVD_LOG_DIR`, `APVD_LOG_LEVEL` and `APVD_LOG_FILE` win over the file
    pub fn logging_config(&self) -> LoggingConfig {
        let env = LoggingEnv::from_env();
        let log_dir = env.log_dir.or_else(|| self.config.get_string(LOG_DIR).ok());
        let level = env
            .level
            .or_else(|| self.config.get_string(LOG_LEVEL).ok())
            .unwrap_or("info".to_string());
        let file_logging = env
            .file_logging
            .or_else(|| self.config.get_bool(LOG_FILE).ok())
            .unwrap_or(false);
        let console_output = self.config.get_bool(LOG_CONSOLE).unwrap_or(true);
        let rotation = self.config.get_string(LOG_ROTATION).ok();

        LoggingConfig::from_config(log_dir, console_output, file_logging, level, rotation)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;
    use crate::startup::LogRotation;

    fn args_for(path: PathBuf) -> GlobalArgs {
        GlobalArgs {
            config: path,
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_without_file() {
        let configuration =
            Configuration::load(&args_for(PathBuf::from("/nonexistent/application.yml"))).unwrap();

        assert_eq!(configuration.server_url(), DEFAULT_SERVER_URL);
        assert_eq!(configuration.batch_options(), BatchOptions::default());
        assert_eq!(configuration.data_store_namespace(), DEFAULT_DATA_STORE_NAMESPACE);
    }

    #[test]
    fn test_file_and_overrides() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            file,
            "apvd:\n  server:\n    url: https://file.example.org\n    username: file-user\n    read_timeout_ms: 1500\n  batch:\n    chunk_size: 10\n    concurrency: 0\n  datastore:\n    namespace: approvals\n  log:\n    rotation: never"
        )
        .unwrap();

        let args = GlobalArgs {
            server: Some("https://cli.example.org".to_string()),
            config: file.path().to_path_buf(),
            ..Default::default()
        };
        let configuration = Configuration::load(&args).unwrap();

        assert_eq!(configuration.server_url(), "https://cli.example.org");
        assert_eq!(configuration.server_username(), "file-user");
        assert_eq!(configuration.batch_options(), BatchOptions::new(10, 1));

        let http = configuration.http_client_config();
        assert_eq!(http.server_addrs, vec!["https://cli.example.org".to_string()]);
        assert_eq!(http.read_timeout_ms, 1500);
        assert_eq!(http.data_store_namespace, "approvals");
        assert_eq!(configuration.logging_config().rotation, LogRotation::Never);
    }
}
