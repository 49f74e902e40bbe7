// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Wire encoding of write requests: protobuf serialization followed by snappy
//! block compression, as expected by remote write endpoints.

use std::collections::HashSet;

use log::{debug, error};
use prost::Message;

use crate::utils::error::EncodeError;
use crate::write_request::time_series::{TimeSeries, WriteRequest};

/// Check that every series has samples with strictly increasing timestamps, and unique
/// label names. Remote write endpoints reject two samples of a series at one timestamp.
fn validate(write_request: &WriteRequest) -> Result<(), EncodeError> {
  for (index, ts) in write_request.timeseries.iter().enumerate() {
    if ts.samples.is_empty() {
      return Err(EncodeError::InvalidWriteRequest(format!(
        "series {} has no samples",
        describe(index, ts)
      )));
    }

    if ts
      .samples
      .windows(2)
      .any(|pair| pair[0].timestamp >= pair[1].timestamp)
    {
      return Err(EncodeError::InvalidWriteRequest(format!(
        "series {} has samples out of timestamp order or at the same timestamp",
        describe(index, ts)
      )));
    }

    let mut names = HashSet::with_capacity(ts.labels.len());
    for label in &ts.labels {
      if !names.insert(label.name.as_str()) {
        return Err(EncodeError::InvalidWriteRequest(format!(
          "series {} has duplicate label {}",
          describe(index, ts),
          label.name
        )));
      }
    }
  }

  Ok(())
}

// Label names only; values may be large.
fn describe(index: usize, ts: &TimeSeries) -> String {
  let names: Vec<&str> = ts.labels.iter().map(|l| l.name.as_str()).collect();
  format!("#{} [{}]", index, names.join(","))
}

/// Serialize and compress the given write request. The output is deterministic for a
/// given request, and starts with the uncompressed length so it can be decoded
/// without external framing.
pub fn encode(write_request: &WriteRequest) -> Result<Vec<u8>, EncodeError> {
  validate(write_request)?;

  let mut raw = Vec::with_capacity(write_request.encoded_len());
  write_request.encode(&mut raw).map_err(|err| {
    error!("Could not serialize write request: {}", err);
    EncodeError::Serialize(err.to_string())
  })?;

  let compressed = snap::raw::Encoder::new()
    .compress_vec(&raw)
    .map_err(|err| {
      error!("Could not compress write request: {}", err);
      EncodeError::Compress(err.to_string())
    })?;

  debug!(
    "Encoded {} series: {} bytes serialized, {} bytes compressed",
    write_request.len(),
    raw.len(),
    compressed.len()
  );

  Ok(compressed)
}

/// Decompress and deserialize a payload produced by `encode`.
pub fn decode(payload: &[u8]) -> Result<WriteRequest, EncodeError> {
  let raw = snap::raw::Decoder::new()
    .decompress_vec(payload)
    .map_err(|err| EncodeError::Decompress(err.to_string()))?;

  WriteRequest::decode(raw.as_slice()).map_err(|err| EncodeError::Deserialize(err.to_string()))
}
