// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! The metrics forwarder process.
//!
//! Scrapes the Prometheus metrics exposed by the local node and forwards them to a
//! remote write endpoint (for example Grafana Cloud) every few seconds, until it
//! receives Ctrl-C or SIGTERM. Configuration is read from the directory in the
//! environment variable "PROMFORWARD_CONFIG_DIR_PATH" (defaults to "config"); remote
//! write secrets are usually supplied through the environment or a ".env-creds" file.

mod utils;

// If the `dhat-heap` feature is enabled, we use dhat to track heap usage.
#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::env;
use std::process;

use log::{error, info};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use remotewrite::utils::environment::load_env;
use remotewrite::utils::error::ForwarderError;
use remotewrite::{Scheduler, Settings};

use crate::utils::shutdown::shutdown_signal;

async fn run_forwarder(settings: Settings) -> Result<(), ForwarderError> {
  let scheduler = Scheduler::new_from_settings(&settings)?;

  let cancel = CancellationToken::new();
  let loop_cancel = cancel.clone();
  let scheduler_handle = tokio::spawn(async move {
    scheduler.run(loop_cancel).await;
  });

  info!("Started metrics forwarder. Use Ctrl-C or SIGTERM to gracefully exit...");
  shutdown_signal().await;

  info!("Stopping the scrape loop and waiting for it to finish...");
  cancel.cancel();
  if let Err(err) = scheduler_handle.await {
    error!("Error while joining the scrape loop: {}", err);
  }

  info!("Completed metrics forwarder shutdown");

  Ok(())
}

/// Program entry point.
fn main() {
  // If the `dhat-heap` feature is enabled, we use dhat to track heap usage.
  #[cfg(feature = "dhat-heap")]
  let _profiler = dhat::Profiler::new_heap();

  // Load environment variables from ".env" and ".env-creds" file.
  load_env();

  // If log level isn't set, set it to info.
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info")
  }

  // Set up logging.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let config_dir_path =
    env::var("PROMFORWARD_CONFIG_DIR_PATH").unwrap_or_else(|_| "config".to_owned());
  let settings = match Settings::new(&config_dir_path) {
    Ok(settings) => settings,
    Err(err) => {
      error!("Could not load settings from {}: {}", config_dir_path, err);
      process::exit(1);
    }
  };

  // The scrape loop is a single task; one spare worker covers the signal handlers.
  let num_threads = std::cmp::min(2, num_cpus::get());

  let runtime = match tokio::runtime::Builder::new_multi_thread()
    .worker_threads(num_threads)
    .enable_all() // Enables both I/O and time drivers
    .build()
  {
    Ok(runtime) => runtime,
    Err(err) => {
      error!("Could not start the async runtime: {}", err);
      process::exit(1);
    }
  };

  if let Err(err) = runtime.block_on(run_forwarder(settings)) {
    error!("Could not start the metrics forwarder: {}", err);
    process::exit(1);
  }
}
