// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::env;
use std::fmt;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::scrape_manager::fetcher::DEFAULT_METRICS_PORT;
use crate::send_manager::credentials::Credentials;
use crate::utils::error::ForwarderError;
use crate::write_request::constants::DEFAULT_NODE_NAME;

const DEFAULT_CONFIG_FILE_NAME: &str = "default.toml";
const DEFAULT_SCRAPE_INTERVAL_SECONDS: u64 = 15;

#[derive(Debug, Deserialize)]
/// Settings for the scrape side of the forwarder.
pub struct ForwarderSettings {
  metrics_port: u16,
  scrape_interval_seconds: u64,
  node_name: String,
  #[serde(default)]
  request_timeout_seconds: Option<u64>,
}

impl ForwarderSettings {
  /// Get the port of the local metrics endpoint.
  pub fn get_metrics_port(&self) -> u16 {
    self.metrics_port
  }

  /// Get the interval between two scrape cycles.
  pub fn get_scrape_interval(&self) -> Duration {
    Duration::from_secs(self.scrape_interval_seconds)
  }

  /// Get the node name attached to every forwarded series.
  pub fn get_node_name(&self) -> &str {
    &self.node_name
  }

  /// Get the per-request timeout, if one is configured.
  pub fn get_request_timeout(&self) -> Option<Duration> {
    self.request_timeout_seconds.map(Duration::from_secs)
  }
}

#[derive(Deserialize)]
/// Settings for the remote write endpoint. All three values are secrets.
pub struct RemoteWriteSettings {
  url: String,
  user: String,
  key: String,
}

impl RemoteWriteSettings {
  /// Get the remote write URL, without scheme and credentials.
  pub fn get_url(&self) -> &str {
    &self.url
  }

  /// Get the delivery credentials.
  pub fn get_credentials(&self) -> Credentials {
    Credentials::new(&self.url, &self.user, &self.key)
  }
}

impl fmt::Debug for RemoteWriteSettings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RemoteWriteSettings")
      .field("url", &"<redacted>")
      .field("user", &"<redacted>")
      .field("key", &"<redacted>")
      .finish()
  }
}

#[derive(Debug, Deserialize)]
/// Settings for the forwarder, read from config file.
pub struct Settings {
  forwarder: ForwarderSettings,
  remote_write: RemoteWriteSettings,
}

impl Settings {
  /// Create Settings from given configuration directory path.
  pub fn new(config_dir_path: &str) -> Result<Self, ForwarderError> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
    let config_default_file_name = format!("{}/{}", config_dir_path, DEFAULT_CONFIG_FILE_NAME);
    let config_environment_file_name = format!("{}/{}.toml", config_dir_path, run_mode);

    let config = Config::builder()
      .set_default("forwarder.metrics_port", DEFAULT_METRICS_PORT as i64)?
      .set_default(
        "forwarder.scrape_interval_seconds",
        DEFAULT_SCRAPE_INTERVAL_SECONDS as i64,
      )?
      .set_default("forwarder.node_name", DEFAULT_NODE_NAME)?
      // Start off by merging in the "default" configuration file
      .add_source(File::with_name(&config_default_file_name))
      // Add in the current environment file
      // Default to 'development' env
      // Note that this file is _optional_
      .add_source(File::with_name(&config_environment_file_name).required(false))
      // Add in settings from the environment (with a prefix of PROMFORWARD)
      // Eg.. `PROMFORWARD_REMOTE_WRITE__KEY=secret` would set the `remote_write.key` key
      .add_source(
        Environment::with_prefix("promforward")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
  }

  fn validate(&self) -> Result<(), ForwarderError> {
    let remote_write = &self.remote_write;
    for (name, value) in [
      ("url", &remote_write.url),
      ("user", &remote_write.user),
      ("key", &remote_write.key),
    ] {
      if value.trim().is_empty() {
        return Err(ForwarderError::InvalidConfiguration(format!(
          "remote_write.{} must not be empty",
          name
        )));
      }
    }

    if self.forwarder.scrape_interval_seconds == 0 {
      return Err(ForwarderError::InvalidConfiguration(
        "forwarder.scrape_interval_seconds must be positive".to_owned(),
      ));
    }

    if self.forwarder.node_name.is_empty() {
      return Err(ForwarderError::InvalidConfiguration(
        "forwarder.node_name must not be empty".to_owned(),
      ));
    }

    Ok(())
  }

  /// Get forwarder settings.
  pub fn get_forwarder_settings(&self) -> &ForwarderSettings {
    &self.forwarder
  }

  /// Get remote write settings.
  pub fn get_remote_write_settings(&self) -> &RemoteWriteSettings {
    &self.remote_write
  }

  pub fn get_default_config_file_name() -> &'static str {
    DEFAULT_CONFIG_FILE_NAME
  }
}

/// Initialize logging for tests. Safe to call from every test.
pub fn config_test_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}
