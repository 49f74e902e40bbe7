// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Utilities for running the forwarder process.

pub(crate) mod shutdown;
