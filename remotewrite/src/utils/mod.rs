// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Utilities for configuring and running the forwarder.

pub mod config;
pub mod environment;
pub mod error;

#[cfg(test)]
pub(crate) mod test_server;
#[cfg(test)]
pub(crate) mod test_with_env_vars;
