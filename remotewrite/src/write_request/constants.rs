// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

/// The label carrying the metric name in every forwarded series.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// The fixed label identifying the node that forwarded a series.
pub const NODE_NAME_LABEL: &str = "node_name";

/// Node name used when none is configured.
pub const DEFAULT_NODE_NAME: &str = "testNode";

/// Label holding the upper bound of a histogram bucket.
pub const BUCKET_LABEL: &str = "le";

/// Label holding the quantile of a summary sample.
pub const QUANTILE_LABEL: &str = "quantile";
