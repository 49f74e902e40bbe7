// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

#[test]
fn test_cargo_run_promforward() {
  // Start the forwarder with the shipped config and a short interval. Nothing listens on
  // the metrics port, so every cycle fails - which must not stop the process.
  let mut child = Command::new("cargo")
    .args(["run", "--bin", "promforward"])
    .env("PROMFORWARD_CONFIG_DIR_PATH", "config")
    .env("PROMFORWARD_FORWARDER__SCRAPE_INTERVAL_SECONDS", "1")
    .env("PROMFORWARD_FORWARDER__METRICS_PORT", "1")
    .env("PROMFORWARD_REMOTE_WRITE__URL", "localhost:1/api/v1/write")
    .env("PROMFORWARD_REMOTE_WRITE__USER", "promforward")
    .env("PROMFORWARD_REMOTE_WRITE__KEY", "not-a-real-key")
    .stdout(Stdio::piped())
    .spawn()
    .expect("Failed to start process");

  // Wait for 30 seconds.
  thread::sleep(Duration::from_secs(30));

  // Check if the process is still running - fail in case the forwarder isn't running.
  match child.try_wait() {
    Ok(Some(status)) => {
      panic!("Process exited prematurely with status: {}", status);
    }
    Ok(None) => {
      println!("Process is still running, proceeding...");
    }
    Err(e) => {
      panic!("Error while checking process status: {}", e);
    }
  }

  // Send SIGTERM to the process for graceful shutdown.
  let _ = Command::new("kill")
    .args(["-s", "TERM", &child.id().to_string()])
    .spawn()
    .expect("Failed to send SIGTERM to forwarder");

  // Wait for 10 seconds.
  thread::sleep(Duration::from_secs(10));

  // Check if the process is still running - fail in case the forwarder is still running.
  match child.try_wait() {
    Ok(Some(status)) => {
      println!("Forwarder process exited with status: {}", status);
    }
    Ok(None) => {
      panic!("Forwarder did not exit even after sending SIGTERM.");
    }
    Err(e) => {
      panic!("Error while checking process status: {}", e);
    }
  }
}

#[test]
fn test_cargo_run_promforward_without_secrets() {
  // The shipped config leaves the remote write secrets empty, so startup must fail.
  let status = Command::new("cargo")
    .args(["run", "--bin", "promforward"])
    .env("PROMFORWARD_CONFIG_DIR_PATH", "config")
    .env_remove("RUN_MODE")
    .env_remove("PROMFORWARD_REMOTE_WRITE__URL")
    .env_remove("PROMFORWARD_REMOTE_WRITE__USER")
    .env_remove("PROMFORWARD_REMOTE_WRITE__KEY")
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .expect("Failed to run forwarder");

  assert!(
    !status.success(),
    "Forwarder started without remote write secrets"
  );
}
