// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Drives the scrape-and-forward pipeline on a fixed cadence.
//!
//! Each tick runs one cycle: fetch → convert → encode → send, strictly in sequence.
//! A failing stage aborts the rest of its cycle; the failure is logged and the next
//! tick starts a fresh cycle. Nothing is carried over between cycles.

use std::time::Duration;

use log::{debug, error, info};
use reqwest::StatusCode;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::convert_manager::text_format::TextFormatConverter;
use crate::convert_manager::Converter;
use crate::encode_manager::encoder::encode;
use crate::scrape_manager::fetcher::MetricsFetcher;
use crate::send_manager::credentials::Credentials;
use crate::send_manager::sender::RemoteWriteSender;
use crate::utils::config::Settings;
use crate::utils::error::{CycleError, ForwarderError};
use crate::write_request::labels::{node_label_set, LabelSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
  /// Waiting for the next tick.
  Idle,
  /// A cycle is in progress.
  Running,
}

pub struct Scheduler {
  fetcher: MetricsFetcher,
  converter: Box<dyn Converter>,
  sender: RemoteWriteSender,
  credentials: Credentials,
  labels: LabelSet,
  tick_interval: Duration,
  // Readable through `subscribe_state` while `run` holds the scheduler.
  state: watch::Sender<SchedulerState>,
}

impl Scheduler {
  /// Create a scheduler from its stages.
  pub fn new(
    fetcher: MetricsFetcher,
    converter: Box<dyn Converter>,
    sender: RemoteWriteSender,
    credentials: Credentials,
    labels: LabelSet,
    tick_interval: Duration,
  ) -> Self {
    Scheduler {
      fetcher,
      converter,
      sender,
      credentials,
      labels,
      tick_interval,
      state: watch::channel(SchedulerState::Idle).0,
    }
  }

  /// Create a scheduler scraping the text exposition format, configured from the given settings.
  pub fn new_from_settings(settings: &Settings) -> Result<Self, ForwarderError> {
    let forwarder_settings = settings.get_forwarder_settings();
    let request_timeout = forwarder_settings.get_request_timeout();

    let fetcher =
      MetricsFetcher::new_with_params(forwarder_settings.get_metrics_port(), request_timeout)?;
    let sender = RemoteWriteSender::new(request_timeout)?;

    Ok(Scheduler::new(
      fetcher,
      Box::new(TextFormatConverter::new()),
      sender,
      settings.get_remote_write_settings().get_credentials(),
      node_label_set(forwarder_settings.get_node_name()),
      forwarder_settings.get_scrape_interval(),
    ))
  }

  pub fn get_state(&self) -> SchedulerState {
    *self.state.borrow()
  }

  /// Get a receiver that observes state changes, including while the loop runs.
  pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
    self.state.subscribe()
  }

  pub fn get_tick_interval(&self) -> Duration {
    self.tick_interval
  }

  pub fn get_labels(&self) -> &LabelSet {
    &self.labels
  }

  /// Run one cycle, logging its outcome. Returns the status code of the remote write
  /// endpoint, which is not acted upon, or the error of the stage that failed.
  pub async fn run_cycle(&self) -> Result<StatusCode, CycleError> {
    let result = self.forward().await;

    match &result {
      Ok(status) => debug!(
        "Remote write endpoint responded with status code {}",
        status.as_u16()
      ),
      Err(err) => error!("Scrape cycle aborted in {} stage: {}", err.stage(), err),
    }

    result
  }

  async fn forward(&self) -> Result<StatusCode, CycleError> {
    let scrape = self.fetcher.fetch().await?;
    let write_request = self.converter.convert(&scrape, &self.labels)?;
    let payload = encode(&write_request)?;
    let status = self.sender.send(payload, &self.credentials).await?;

    Ok(status)
  }

  /// Run a cycle on every tick until cancelled. The first cycle starts one tick after
  /// the call. A cycle running longer than the tick interval delays the next tick.
  /// On cancellation no new cycle is started, and an in-flight cycle is dropped at
  /// its current await point.
  pub async fn run(&self, cancel: CancellationToken) {
    info!(
      "Forwarding metrics from {} every {:?}",
      self.fetcher.get_metrics_url(),
      self.tick_interval
    );

    let mut ticker = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("Received shutdown in scrape loop. Exiting...");
          break;
        }
        _ = ticker.tick() => {}
      }

      self.state.send_replace(SchedulerState::Running);
      let interrupted = tokio::select! {
        _ = cancel.cancelled() => true,
        _ = self.run_cycle() => false,
      };
      self.state.send_replace(SchedulerState::Idle);

      if interrupted {
        info!("Received shutdown during a scrape cycle. Abandoning it and exiting...");
        break;
      }
    }
  }
}
