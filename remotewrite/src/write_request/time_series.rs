// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Remote write message types, using the field numbers of the standard
//! `prometheus.WriteRequest` protobuf schema.

use crate::write_request::labels::LabelSet;

/// A batch of time series, the unit of serialization.
#[derive(Clone, PartialEq, prost::Message)]
pub struct WriteRequest {
  #[prost(message, repeated, tag = "1")]
  pub timeseries: Vec<TimeSeries>,
}

/// A label set with its samples.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TimeSeries {
  #[prost(message, repeated, tag = "1")]
  pub labels: Vec<Label>,
  #[prost(message, repeated, tag = "2")]
  pub samples: Vec<Sample>,
}

#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct Label {
  #[prost(string, tag = "1")]
  pub name: String,
  #[prost(string, tag = "2")]
  pub value: String,
}

/// A value at a point in time. Timestamp is in milliseconds since epoch.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Sample {
  #[prost(double, tag = "1")]
  pub value: f64,
  #[prost(int64, tag = "2")]
  pub timestamp: i64,
}

impl WriteRequest {
  /// Create a write request from the given series.
  pub fn new_with_timeseries(timeseries: Vec<TimeSeries>) -> Self {
    WriteRequest { timeseries }
  }

  /// Number of series in this request.
  pub fn len(&self) -> usize {
    self.timeseries.len()
  }

  /// Returns true if the request carries no series.
  pub fn is_empty(&self) -> bool {
    self.timeseries.is_empty()
  }
}

impl TimeSeries {
  /// Create a series without samples. Labels are stored sorted by name.
  pub fn new_with_labels(labels: &LabelSet) -> Self {
    TimeSeries {
      labels: labels
        .iter()
        .map(|(name, value)| Label::new(name, value))
        .collect(),
      samples: Vec::new(),
    }
  }

  /// Append a sample, keeping samples ordered by timestamp. A sample with the timestamp
  /// of an existing one replaces it, and the replaced sample is returned.
  pub fn append_sample(&mut self, sample: Sample) -> Option<Sample> {
    match self
      .samples
      .binary_search_by_key(&sample.timestamp, |existing| existing.timestamp)
    {
      Ok(position) => Some(std::mem::replace(&mut self.samples[position], sample)),
      Err(position) => {
        self.samples.insert(position, sample);
        None
      }
    }
  }

  /// Get the value of the given label, if present.
  pub fn get_label_value(&self, name: &str) -> Option<&str> {
    self
      .labels
      .iter()
      .find(|label| label.name == name)
      .map(|label| label.value.as_str())
  }

  /// Get the labels of this series as a label set.
  pub fn get_label_set(&self) -> LabelSet {
    self
      .labels
      .iter()
      .map(|label| (label.name.clone(), label.value.clone()))
      .collect()
  }
}

impl Label {
  pub fn new(name: &str, value: &str) -> Self {
    Label {
      name: name.to_owned(),
      value: value.to_owned(),
    }
  }
}

impl Sample {
  pub fn new(timestamp: i64, value: f64) -> Self {
    Sample { value, timestamp }
  }
}
