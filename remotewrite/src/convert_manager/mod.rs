// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Conversion of scraped snapshots to write requests.

pub mod text_format;

use crate::utils::error::ConversionError;
use crate::write_request::labels::LabelSet;
use crate::write_request::time_series::WriteRequest;

/// Turns the bytes of one scrape, plus the fixed label set of the node, into a write
/// request. Every produced series carries the fixed labels. Implementations must not
/// return a partial write request on malformed input.
pub trait Converter: Send + Sync {
  fn convert(&self, scrape: &[u8], labels: &LabelSet) -> Result<WriteRequest, ConversionError>;
}
