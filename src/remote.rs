use std::{future::Future, net::SocketAddr};

use axum::{
  Json, Router,
  extract::{DefaultBodyLimit, State},
  http::StatusCode,
  routing::{get, post},
};
use log::info;
use tower_http::trace::{self, TraceLayer};

use crate::{
  app::{AppHandle, MapSnapshot},
  map::map_event::MapEvent,
};

const MAX_BODY_SIZE: usize = 1_000_000;

/// Queues an event for the map. Accepted means queued, not handled.
pub async fn map_event_handler(
  State(app): State<AppHandle>,
  Json(event): Json<MapEvent>,
) -> StatusCode {
  if app.send(event).await {
    StatusCode::ACCEPTED
  } else {
    StatusCode::SERVICE_UNAVAILABLE
  }
}

pub async fn state_handler(State(app): State<AppHandle>) -> Json<MapSnapshot> {
  Json(app.snapshot())
}

async fn healthcheck() {}

#[must_use]
pub fn router(app: AppHandle) -> Router {
  Router::new()
    .route("/", post(map_event_handler))
    .route("/state", get(state_handler))
    .route("/healthcheck", get(healthcheck))
    .with_state(app)
    .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(trace::DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_response(trace::DefaultOnResponse::new().level(tracing::Level::INFO)),
    )
}

/// Serves the map on localhost until `shutdown` resolves.
pub async fn serve(
  app: AppHandle,
  port: u16,
  shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
  let addr = SocketAddr::from(([127, 0, 0, 1], port));
  let listener = tokio::net::TcpListener::bind(addr).await?;
  info!("Listening on {addr}");
  axum::serve(listener, router(app))
    .with_graceful_shutdown(shutdown)
    .await
}
