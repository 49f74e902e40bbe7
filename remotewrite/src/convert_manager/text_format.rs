// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Convert the Prometheus text exposition format to a write request.
//!
//! Uses the Pest parser with Pest-formatted PEG grammars: https://pest.rs/
//! which validates the syntax of each line. Metadata (HELP and TYPE) is checked
//! for consistency, and every sample line becomes one sample of the series named by
//! its metric name and labels. Histogram and summary families are therefore
//! forwarded as their `_bucket`, `_sum`, `_count` and quantile series.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use log::debug;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::convert_manager::Converter;
use crate::utils::error::ConversionError;
use crate::write_request::constants::{BUCKET_LABEL, METRIC_NAME_LABEL, QUANTILE_LABEL};
use crate::write_request::labels::LabelSet;
use crate::write_request::time_series::{Sample, TimeSeries, WriteRequest};

#[derive(Parser)]
#[grammar = "src/convert_manager/text_format_grammar.pest"]
struct TextFormatParser;

/// Type of a metric family, as declared by a TYPE line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
  Counter,
  Gauge,
  Histogram,
  Summary,
  Untyped,
}

impl FromStr for MetricType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "counter" => Ok(MetricType::Counter),
      "gauge" => Ok(MetricType::Gauge),
      "histogram" => Ok(MetricType::Histogram),
      "summary" => Ok(MetricType::Summary),
      "untyped" => Ok(MetricType::Untyped),
      _ => Err(format!("unknown metric type {:?}", s)),
    }
  }
}

#[derive(Debug, Default)]
struct FamilyMetadata {
  has_help: bool,
  metric_type: Option<MetricType>,
  has_samples: bool,
}

/// Converter for the text exposition format.
#[derive(Debug, Default)]
pub struct TextFormatConverter {
  // Timestamp for samples without one. When not set, the time of conversion is used.
  default_timestamp_ms: Option<i64>,
}

impl TextFormatConverter {
  /// Create a converter that stamps samples without a timestamp with the scrape time.
  pub fn new() -> Self {
    TextFormatConverter {
      default_timestamp_ms: None,
    }
  }

  /// Create a converter that stamps samples without a timestamp with the given time.
  pub fn new_with_default_timestamp(default_timestamp_ms: i64) -> Self {
    TextFormatConverter {
      default_timestamp_ms: Some(default_timestamp_ms),
    }
  }
}

impl Converter for TextFormatConverter {
  fn convert(&self, scrape: &[u8], labels: &LabelSet) -> Result<WriteRequest, ConversionError> {
    let text =
      std::str::from_utf8(scrape).map_err(|err| ConversionError::InvalidUtf8(err.to_string()))?;
    let default_timestamp = self
      .default_timestamp_ms
      .unwrap_or_else(|| Utc::now().timestamp_millis());

    let mut conversion = Conversion::new(labels, default_timestamp);
    for (index, line) in text.lines().enumerate() {
      conversion.parse_line(index + 1, line)?;
    }

    let write_request = conversion.into_write_request();
    debug!(
      "Converted {} bytes of scraped metrics to {} series",
      scrape.len(),
      write_request.len()
    );

    Ok(write_request)
  }
}

/// State of one conversion call.
struct Conversion<'a> {
  fixed_labels: &'a LabelSet,
  default_timestamp: i64,
  families: HashMap<String, FamilyMetadata>,
  series_positions: HashMap<LabelSet, usize>,
  timeseries: Vec<TimeSeries>,
}

impl<'a> Conversion<'a> {
  fn new(fixed_labels: &'a LabelSet, default_timestamp: i64) -> Self {
    Conversion {
      fixed_labels,
      default_timestamp,
      families: HashMap::new(),
      series_positions: HashMap::new(),
      timeseries: Vec::new(),
    }
  }

  fn parse_line(&mut self, line_number: usize, line: &str) -> Result<(), ConversionError> {
    let mut pairs = TextFormatParser::parse(Rule::line, line).map_err(|err| {
      ConversionError::Syntax(line_number, err.variant.message().to_string())
    })?;

    let line_pair = match pairs.next() {
      Some(line_pair) => line_pair,
      None => return Ok(()),
    };

    for pair in line_pair.into_inner() {
      match pair.as_rule() {
        Rule::comment => self.parse_comment(line_number, pair)?,
        Rule::sample => self.parse_sample(line_number, pair)?,
        _ => {}
      }
    }

    Ok(())
  }

  fn parse_comment(&mut self, line_number: usize, pair: Pair<Rule>) -> Result<(), ConversionError> {
    for pair in pair.into_inner() {
      match pair.as_rule() {
        Rule::help => {
          let name = first_inner_str(&pair, Rule::metric_name);
          let family = self.families.entry(name.to_owned()).or_default();
          if family.has_help {
            return Err(ConversionError::DuplicateMetadata(
              line_number,
              "HELP".to_owned(),
              name.to_owned(),
            ));
          }
          family.has_help = true;
        }
        Rule::type_decl => {
          let name = first_inner_str(&pair, Rule::metric_name);
          let metric_type = MetricType::from_str(first_inner_str(&pair, Rule::metric_type))
            .map_err(|msg| ConversionError::Syntax(line_number, msg))?;

          let family = self.families.entry(name.to_owned()).or_default();
          if family.metric_type.is_some() {
            return Err(ConversionError::DuplicateMetadata(
              line_number,
              "TYPE".to_owned(),
              name.to_owned(),
            ));
          }
          if family.has_samples {
            return Err(ConversionError::TypeAfterSamples(
              line_number,
              name.to_owned(),
            ));
          }
          family.metric_type = Some(metric_type);
        }
        // Any other comment is ignored.
        _ => {}
      }
    }

    Ok(())
  }

  fn parse_sample(&mut self, line_number: usize, pair: Pair<Rule>) -> Result<(), ConversionError> {
    let mut name = "";
    let mut line_labels = LabelSet::new();
    let mut value = 0.0;
    let mut timestamp = self.default_timestamp;

    for pair in pair.into_inner() {
      match pair.as_rule() {
        Rule::metric_name => name = pair.as_str(),
        Rule::label_set => {
          for label in pair.into_inner() {
            let label_name = first_inner_str(&label, Rule::label_name);
            let raw_value = first_inner_str(&label, Rule::label_value);

            if label_name == METRIC_NAME_LABEL {
              return Err(ConversionError::ReservedLabel(line_number));
            }
            let label_value = unescape_label_value(raw_value)
              .map_err(|msg| ConversionError::Syntax(line_number, msg))?;
            if line_labels
              .insert(label_name.to_owned(), label_value)
              .is_some()
            {
              return Err(ConversionError::DuplicateLabel(
                line_number,
                label_name.to_owned(),
              ));
            }
          }
        }
        Rule::value => {
          value = parse_value(pair.as_str())
            .ok_or_else(|| ConversionError::InvalidValue(line_number, pair.as_str().to_owned()))?;
        }
        Rule::timestamp => {
          timestamp = pair.as_str().parse::<i64>().map_err(|_| {
            ConversionError::InvalidTimestamp(line_number, pair.as_str().to_owned())
          })?;
        }
        _ => {}
      }
    }

    self.check_family_labels(line_number, name, &line_labels)?;

    let mut series_labels = line_labels;
    series_labels.insert(METRIC_NAME_LABEL.to_owned(), name.to_owned());
    // The fixed labels of the node win over labels found in the scrape.
    for (label_name, label_value) in self.fixed_labels {
      series_labels.insert(label_name.clone(), label_value.clone());
    }

    self.append_sample(line_number, series_labels, Sample::new(timestamp, value));

    Ok(())
  }

  /// Record that the family of this sample has samples, and check the labels histogram
  /// and summary samples must carry.
  fn check_family_labels(
    &mut self,
    line_number: usize,
    name: &str,
    line_labels: &LabelSet,
  ) -> Result<(), ConversionError> {
    let (family_name, metric_type) = self.resolve_family(name);

    let required_label = match metric_type {
      Some(MetricType::Histogram) if name.ends_with("_bucket") => Some(BUCKET_LABEL),
      Some(MetricType::Summary) if name == family_name => Some(QUANTILE_LABEL),
      _ => None,
    };
    if let Some(required_label) = required_label {
      if !line_labels.contains_key(required_label) {
        return Err(ConversionError::MissingLabel(
          line_number,
          required_label.to_owned(),
          name.to_owned(),
        ));
      }
    }

    // Until its family is typed, a suffixed sample may belong to a histogram or summary
    // declared later, so the base name counts as having samples too.
    if metric_type.is_none() {
      for suffix in ["_bucket", "_sum", "_count"] {
        if let Some(base) = name.strip_suffix(suffix) {
          self.families.entry(base.to_owned()).or_default().has_samples = true;
        }
      }
    }
    self.families.entry(family_name).or_default().has_samples = true;

    Ok(())
  }

  /// Find the family a sample name belongs to, taking histogram and summary suffixes into account.
  fn resolve_family(&self, name: &str) -> (String, Option<MetricType>) {
    if let Some(metric_type) = self.families.get(name).and_then(|f| f.metric_type) {
      return (name.to_owned(), Some(metric_type));
    }

    for suffix in ["_bucket", "_sum", "_count"] {
      if let Some(base) = name.strip_suffix(suffix) {
        let metric_type = self.families.get(base).and_then(|f| f.metric_type);
        match metric_type {
          Some(MetricType::Histogram) => return (base.to_owned(), metric_type),
          Some(MetricType::Summary) if suffix != "_bucket" => return (base.to_owned(), metric_type),
          _ => {}
        }
      }
    }

    (name.to_owned(), None)
  }

  /// Add a sample to the series with the given labels. A second sample of a series at
  /// the same timestamp replaces the first.
  fn append_sample(&mut self, line_number: usize, labels: LabelSet, sample: Sample) {
    match self.series_positions.get(&labels) {
      Some(position) => {
        if let Some(replaced) = self.timeseries[*position].append_sample(sample) {
          debug!(
            "Line {} replaces an earlier sample of the same series at timestamp {}",
            line_number, replaced.timestamp
          );
        }
      }
      None => {
        let mut ts = TimeSeries::new_with_labels(&labels);
        ts.append_sample(sample);
        self.series_positions.insert(labels, self.timeseries.len());
        self.timeseries.push(ts);
      }
    }
  }

  fn into_write_request(self) -> WriteRequest {
    WriteRequest::new_with_timeseries(self.timeseries)
  }
}

fn first_inner_str<'i>(pair: &Pair<'i, Rule>, rule: Rule) -> &'i str {
  pair
    .clone()
    .into_inner()
    .find(|inner| inner.as_rule() == rule)
    .map(|inner| inner.as_str())
    .unwrap_or("")
}

fn parse_value(value: &str) -> Option<f64> {
  match value {
    "+Inf" | "Inf" => Some(f64::INFINITY),
    "-Inf" => Some(f64::NEG_INFINITY),
    "NaN" => Some(f64::NAN),
    _ => value.parse::<f64>().ok(),
  }
}

fn unescape_label_value(raw: &str) -> Result<String, String> {
  let mut unescaped = String::with_capacity(raw.len());
  let mut chars = raw.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      unescaped.push(c);
      continue;
    }
    match chars.next() {
      Some('\\') => unescaped.push('\\'),
      Some('"') => unescaped.push('"'),
      Some('n') => unescaped.push('\n'),
      Some(other) => return Err(format!("invalid escape sequence \\{}", other)),
      None => return Err("unterminated escape sequence".to_owned()),
    }
  }

  Ok(unescaped)
}
