// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
/// Errors while pulling the metrics snapshot from the local endpoint.
pub enum FetchError {
  #[error("Could not build scrape request: {0}")]
  RequestBuild(String),

  #[error("Could not reach metrics endpoint: {0}")]
  Transport(String),

  #[error("Could not read scrape response body: {0}")]
  BodyRead(String),
}

#[derive(Debug, Error, Eq, PartialEq)]
/// Errors while converting a scrape body to a write request. Line numbers are 1-based.
pub enum ConversionError {
  #[error("Scrape body is not valid UTF-8: {0}")]
  InvalidUtf8(String),

  #[error("Syntax error on line {0}: {1}")]
  Syntax(usize, String),

  #[error("Invalid sample value {1:?} on line {0}.")]
  InvalidValue(usize, String),

  #[error("Invalid timestamp {1:?} on line {0}.")]
  InvalidTimestamp(usize, String),

  #[error("Duplicate label name {1:?} on line {0}.")]
  DuplicateLabel(usize, String),

  #[error("Label name __name__ is reserved, found on line {0}.")]
  ReservedLabel(usize),

  #[error("Second {1} line for metric {2:?} on line {0}.")]
  DuplicateMetadata(usize, String, String),

  #[error("TYPE line for metric {1:?} appears after its samples, on line {0}.")]
  TypeAfterSamples(usize, String),

  #[error("Missing label {1:?} for metric {2:?} on line {0}.")]
  MissingLabel(usize, String, String),
}

#[derive(Debug, Error, Eq, PartialEq)]
/// Errors while turning a write request into a wire payload, or back.
pub enum EncodeError {
  #[error("Invalid write request: {0}")]
  InvalidWriteRequest(String),

  #[error("Could not serialize write request: {0}")]
  Serialize(String),

  #[error("Could not compress payload: {0}")]
  Compress(String),

  #[error("Could not decompress payload: {0}")]
  Decompress(String),

  #[error("Could not deserialize write request: {0}")]
  Deserialize(String),
}

#[derive(Debug, Error, Eq, PartialEq)]
/// Errors while delivering a payload to the remote write endpoint.
pub enum SendError {
  #[error("Could not build remote write request: {0}")]
  RequestBuild(String),

  #[error("Could not reach remote write endpoint: {0}")]
  Transport(String),
}

#[derive(Debug, Error, Eq, PartialEq)]
/// Failure of one scrape-and-forward cycle, tagged with the stage that failed.
pub enum CycleError {
  #[error("Fetch stage failed: {0}")]
  Fetch(FetchError),

  #[error("Convert stage failed: {0}")]
  Convert(ConversionError),

  #[error("Encode stage failed: {0}")]
  Encode(EncodeError),

  #[error("Send stage failed: {0}")]
  Send(SendError),
}

impl CycleError {
  /// Name of the stage that failed.
  pub fn stage(&self) -> &'static str {
    match self {
      CycleError::Fetch(_) => "fetch",
      CycleError::Convert(_) => "convert",
      CycleError::Encode(_) => "encode",
      CycleError::Send(_) => "send",
    }
  }
}

#[derive(Debug, Error)]
/// Errors while setting up the forwarder.
pub enum ForwarderError {
  #[error("Invalid configuration. {0}")]
  InvalidConfiguration(String),

  #[error("Could not build HTTP client: {0}")]
  HttpClient(String),
}

impl From<FetchError> for CycleError {
  fn from(error: FetchError) -> Self {
    CycleError::Fetch(error)
  }
}

impl From<ConversionError> for CycleError {
  fn from(error: ConversionError) -> Self {
    CycleError::Convert(error)
  }
}

impl From<EncodeError> for CycleError {
  fn from(error: EncodeError) -> Self {
    CycleError::Encode(error)
  }
}

impl From<SendError> for CycleError {
  fn from(error: SendError) -> Self {
    CycleError::Send(error)
  }
}

impl From<config::ConfigError> for ForwarderError {
  fn from(error: config::ConfigError) -> Self {
    ForwarderError::InvalidConfiguration(error.to_string())
  }
}

impl From<reqwest::Error> for ForwarderError {
  fn from(error: reqwest::Error) -> Self {
    ForwarderError::HttpClient(error.to_string())
  }
}
