//! The SSE transport: `GET /sse` opens a session stream whose first event
//! hands the client a message-posting URL; `POST /sse/messages` carries
//! the actual JSON-RPC traffic and returns its response directly in the
//! HTTP response body (the SSE channel itself only ever carries the
//! `endpoint` event and periodic `ping` heartbeats).

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::Stream;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;

use marcus_core::Coordinator;

use crate::auth::BearerAuth;
use crate::dispatch::handle_json_rpc;
use crate::request_logger::mcp_request_logging_middleware;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

struct SharedState {
    coordinator: Arc<Coordinator>,
    auth: BearerAuth,
    next_session: AtomicU64,
}

/// Builds the axum router for the SSE transport. `auth` governs both
/// routes; pass [`BearerAuth::disabled`] to allow every request.
pub fn router(coordinator: Arc<Coordinator>, auth: BearerAuth) -> Router {
    let state = Arc::new(SharedState {
        coordinator,
        auth,
        next_session: AtomicU64::new(1),
    });

    Router::new()
        .route("/sse", get(sse_handler))
        .route("/sse/messages", post(messages_handler))
        .layer(middleware::from_fn(mcp_request_logging_middleware))
        .with_state(state)
}

async fn sse_handler(
    State(state): State<Arc<SharedState>>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    if !state.auth.authorize(&headers) {
        return Err(StatusCode::FORBIDDEN);
    }

    let session_id = state.next_session.fetch_add(1, Ordering::Relaxed);
    info!(session_id, "SSE session opened");

    let (tx, rx) = mpsc::unbounded_channel();
    let endpoint_event = Event::default()
        .event("endpoint")
        .data(format!("/sse/messages?session_id={session_id}"));
    if tx.send(Ok(endpoint_event)).is_err() {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        interval.tick().await; // first tick fires immediately; skip it
        loop {
            interval.tick().await;
            let ping = Event::default().event("ping").data("");
            if tx.send(Ok(ping)).is_err() {
                break;
            }
        }
    });

    Ok(Sse::new(UnboundedReceiverStream::new(rx)))
}

#[derive(Deserialize)]
struct SessionQuery {
    #[allow(dead_code)]
    session_id: Option<String>,
}

async fn messages_handler(
    State(state): State<Arc<SharedState>>,
    headers: HeaderMap,
    Query(_query): Query<SessionQuery>,
    Json(request): Json<Value>,
) -> impl IntoResponse {
    if !state.auth.authorize(&headers) {
        return (StatusCode::FORBIDDEN, Json(Value::Null));
    }

    let response = handle_json_rpc(&state.coordinator, &request).await;
    (StatusCode::OK, Json(response))
}
