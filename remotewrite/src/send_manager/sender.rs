// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::time::Duration;

use log::debug;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};

use crate::send_manager::credentials::Credentials;
use crate::utils::error::{ForwarderError, SendError};

/// User agent sent with every remote write request.
pub const REMOTE_WRITE_USER_AGENT: &str = concat!("promforward/", env!("CARGO_PKG_VERSION"));

/// Header carrying the remote write protocol version.
pub const REMOTE_WRITE_VERSION_HEADER: &str = "X-Prometheus-Remote-Write-Version";
pub const REMOTE_WRITE_VERSION: &str = "0.1.0";

const CONTENT_ENCODING_SNAPPY: &str = "snappy";
const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";

/// Delivers encoded write requests to the remote write endpoint.
#[derive(Debug, Clone)]
pub struct RemoteWriteSender {
  client: Client,
  scheme: &'static str,
}

impl RemoteWriteSender {
  /// Create a sender delivering over HTTPS, with an optional per-request timeout.
  pub fn new(request_timeout: Option<Duration>) -> Result<Self, ForwarderError> {
    Self::new_with_scheme("https", request_timeout)
  }

  /// Create a sender delivering over plain HTTP. Only meant for local testing.
  pub fn new_insecure(request_timeout: Option<Duration>) -> Result<Self, ForwarderError> {
    Self::new_with_scheme("http", request_timeout)
  }

  fn new_with_scheme(
    scheme: &'static str,
    request_timeout: Option<Duration>,
  ) -> Result<Self, ForwarderError> {
    let mut builder = Client::builder();
    if let Some(timeout) = request_timeout {
      builder = builder.timeout(timeout);
    }

    Ok(RemoteWriteSender {
      client: builder.build()?,
      scheme,
    })
  }

  /// POST the payload with the remote write headers. The response status is returned
  /// whatever it is; only failing to build or deliver the request is an error.
  pub async fn send(
    &self,
    payload: Vec<u8>,
    credentials: &Credentials,
  ) -> Result<StatusCode, SendError> {
    let target_url = credentials.get_target_url(self.scheme)?;
    let payload_len = payload.len();

    // Errors are stripped of their URL, which carries the credentials.
    let request = self
      .client
      .post(target_url)
      .header(CONTENT_ENCODING, CONTENT_ENCODING_SNAPPY)
      .header(CONTENT_TYPE, CONTENT_TYPE_PROTOBUF)
      .header(USER_AGENT, REMOTE_WRITE_USER_AGENT)
      .header(REMOTE_WRITE_VERSION_HEADER, REMOTE_WRITE_VERSION)
      .body(payload)
      .build()
      .map_err(|err| SendError::RequestBuild(err.without_url().to_string()))?;

    let response = self
      .client
      .execute(request)
      .await
      .map_err(|err| SendError::Transport(err.without_url().to_string()))?;

    debug!("Sent {} bytes to remote write endpoint", payload_len);

    Ok(response.status())
  }
}
