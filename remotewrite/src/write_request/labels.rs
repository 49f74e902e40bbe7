// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::collections::BTreeMap;

use crate::write_request::constants::NODE_NAME_LABEL;

/// Mapping from label name to label value. Names are unique and iterate in sorted order.
pub type LabelSet = BTreeMap<String, String>;

/// Create the fixed label set attached to every series forwarded by this node.
pub fn node_label_set(node_name: &str) -> LabelSet {
  let mut labels = LabelSet::new();
  labels.insert(NODE_NAME_LABEL.to_owned(), node_name.to_owned());
  labels
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_node_label_set() {
    let labels = node_label_set("testNode");
    assert_eq!(labels.len(), 1);
    assert_eq!(labels.get(NODE_NAME_LABEL).unwrap(), "testNode");
  }
}
