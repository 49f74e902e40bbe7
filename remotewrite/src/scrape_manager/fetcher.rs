// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::time::Duration;

use log::debug;
use reqwest::Client;

use crate::utils::error::{FetchError, ForwarderError};

/// Port of the local metrics endpoint when none is configured.
pub const DEFAULT_METRICS_PORT: u16 = 6060;

const METRICS_HOST: &str = "localhost";
const METRICS_PATH: &str = "/metrics";

/// Pulls the metrics snapshot exposed by the local process.
#[derive(Debug, Clone)]
pub struct MetricsFetcher {
  client: Client,
  metrics_url: String,
}

impl MetricsFetcher {
  /// Create a fetcher for the default metrics port, using transport default timeouts.
  pub fn new() -> Result<Self, ForwarderError> {
    Self::new_with_params(DEFAULT_METRICS_PORT, None)
  }

  /// Create a fetcher for the given port on localhost, with an optional per-request timeout.
  pub fn new_with_params(
    metrics_port: u16,
    request_timeout: Option<Duration>,
  ) -> Result<Self, ForwarderError> {
    let mut builder = Client::builder();
    if let Some(timeout) = request_timeout {
      builder = builder.timeout(timeout);
    }

    Ok(MetricsFetcher {
      client: builder.build()?,
      metrics_url: format!("http://{}:{}{}", METRICS_HOST, metrics_port, METRICS_PATH),
    })
  }

  /// Get the URL scraped by this fetcher.
  pub fn get_metrics_url(&self) -> &str {
    &self.metrics_url
  }

  /// Get the body of the metrics endpoint. The status code is not inspected, so the body
  /// of an error response is returned as well.
  pub async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
    let request = self
      .client
      .get(&self.metrics_url)
      .build()
      .map_err(|err| FetchError::RequestBuild(err.to_string()))?;

    let response = self
      .client
      .execute(request)
      .await
      .map_err(|err| FetchError::Transport(err.to_string()))?;
    let status = response.status();

    let body = response
      .bytes()
      .await
      .map_err(|err| FetchError::BodyRead(err.to_string()))?;

    debug!(
      "Scraped {} bytes from {} with status {}",
      body.len(),
      self.metrics_url,
      status
    );

    Ok(body.to_vec())
  }
}
