// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Scrape a local Prometheus metrics endpoint and forward the snapshot to a remote
//! write endpoint.
//!
//! A cycle fetches the text exposition of the local process
//! ([`scrape_manager::fetcher`]), converts it to a remote write request carrying the
//! node's fixed labels ([`convert_manager`]), serializes and snappy-compresses it
//! ([`encode_manager::encoder`]) and POSTs it with the remote write headers
//! ([`send_manager::sender`]). The [`scheduler::Scheduler`] repeats cycles on a fixed
//! cadence until cancelled.

pub mod convert_manager;
pub mod encode_manager;
pub mod scheduler;
pub mod scrape_manager;
pub mod send_manager;
pub mod utils;
pub mod write_request;

pub use crate::scheduler::{Scheduler, SchedulerState};
pub use crate::utils::config::Settings;
