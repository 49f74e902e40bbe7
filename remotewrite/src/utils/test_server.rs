// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Local HTTP servers standing in for the scraped process and the remote write endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

pub(crate) const REMOTE_WRITE_PATH: &str = "/api/v1/write";

#[derive(Clone)]
struct ScrapeState {
  bodies: Arc<Vec<String>>,
  status: StatusCode,
  num_requests: Arc<AtomicUsize>,
}

/// A metrics endpoint serving fixed bodies, in turn.
pub(crate) struct ScrapeServer {
  pub port: u16,
  num_requests: Arc<AtomicUsize>,
}

impl ScrapeServer {
  pub fn num_requests(&self) -> usize {
    self.num_requests.load(Ordering::SeqCst)
  }
}

/// A request received by the remote write server.
pub(crate) struct ReceivedRequest {
  pub headers: HeaderMap,
  pub body: Vec<u8>,
}

#[derive(Clone)]
struct RemoteWriteState {
  status: StatusCode,
  requests: Arc<Mutex<Vec<ReceivedRequest>>>,
}

/// A remote write endpoint recording every request and answering with a fixed status.
pub(crate) struct RemoteWriteServer {
  pub port: u16,
  requests: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl RemoteWriteServer {
  pub fn num_requests(&self) -> usize {
    self.requests.lock().unwrap().len()
  }

  /// Remove and return the recorded requests.
  pub fn take_requests(&self) -> Vec<ReceivedRequest> {
    std::mem::take(&mut *self.requests.lock().unwrap())
  }

  /// Remote write URL without scheme, as found in the configuration.
  pub fn get_url(&self) -> String {
    format!("127.0.0.1:{}{}", self.port, REMOTE_WRITE_PATH)
  }
}

async fn serve(router: Router) -> u16 {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let port = listener.local_addr().unwrap().port();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  port
}

async fn serve_metrics(State(state): State<ScrapeState>) -> (StatusCode, String) {
  let n = state.num_requests.fetch_add(1, Ordering::SeqCst);
  (state.status, state.bodies[n % state.bodies.len()].clone())
}

async fn receive_write(
  State(state): State<RemoteWriteState>,
  headers: HeaderMap,
  body: Bytes,
) -> StatusCode {
  state.requests.lock().unwrap().push(ReceivedRequest {
    headers,
    body: body.to_vec(),
  });
  state.status
}

/// Start a metrics endpoint that serves the given body.
pub(crate) async fn start_scrape_server(body: &str, status: StatusCode) -> ScrapeServer {
  start_scrape_server_with_bodies(&[body], status).await
}

/// Start a metrics endpoint that serves the given bodies in turn, one per request.
pub(crate) async fn start_scrape_server_with_bodies(
  bodies: &[&str],
  status: StatusCode,
) -> ScrapeServer {
  let num_requests = Arc::new(AtomicUsize::new(0));
  let state = ScrapeState {
    bodies: Arc::new(bodies.iter().map(|b| b.to_string()).collect()),
    status,
    num_requests: num_requests.clone(),
  };
  let router = Router::new()
    .route("/metrics", get(serve_metrics))
    .with_state(state);

  ScrapeServer {
    port: serve(router).await,
    num_requests,
  }
}

/// Start a metrics endpoint that answers only after the given delay.
pub(crate) async fn start_slow_scrape_server(delay: Duration) -> u16 {
  let router = Router::new().route(
    "/metrics",
    get(move || async move {
      tokio::time::sleep(delay).await;
      "up 1\n"
    }),
  );
  serve(router).await
}

/// Start a remote write endpoint answering with the given status.
pub(crate) async fn start_remote_write_server(status: StatusCode) -> RemoteWriteServer {
  let requests = Arc::new(Mutex::new(Vec::new()));
  let state = RemoteWriteState {
    status,
    requests: requests.clone(),
  };
  let router = Router::new()
    .route(REMOTE_WRITE_PATH, post(receive_write))
    .with_state(state);

  RemoteWriteServer {
    port: serve(router).await,
    requests,
  }
}

/// A local port nothing listens on.
pub(crate) fn closed_port() -> u16 {
  let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
  listener.local_addr().unwrap().port()
}
