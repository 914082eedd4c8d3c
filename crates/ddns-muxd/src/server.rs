//! HTTP surface of the daemon
//!
//! - `GET /update`: DynDNS v2 update, answered with one status line
//! - `GET /health`: `OK`, or `500` while the configuration is broken
//!
//! Handlers only translate between HTTP and [`UpdateEngine`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use ddns_mux_core::{Error, UpdateEngine};
use tracing::{error, info};

/// Body sent for every rejected update request
const REJECTED_BODY: &str = "badauth";

/// Shared handler state
///
/// A broken configuration does not stop the daemon; it keeps answering
/// so that `/health` can report why.
#[derive(Clone, Debug)]
pub enum AppState {
    Ready(UpdateEngine),
    Unhealthy(Arc<str>),
}

impl AppState {
    fn unhealthy_body(reason: &str) -> String {
        format!("UNHEALTHY: config error. {}", reason)
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/update", get(update))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Response {
    match state {
        AppState::Ready(_) => (StatusCode::OK, "OK").into_response(),
        AppState::Unhealthy(reason) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            AppState::unhealthy_body(&reason),
        )
            .into_response(),
    }
}

async fn update(State(state): State<AppState>, request: Request) -> Response {
    if let Some(ConnectInfo(peer)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        info!("[REQUESTOR] {}", peer);
    }

    let engine = match state {
        AppState::Ready(engine) => engine,
        AppState::Unhealthy(reason) => {
            error!("{}", AppState::unhealthy_body(&reason));
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                AppState::unhealthy_body(&reason),
            )
                .into_response();
        }
    };

    let query = request.uri().query().unwrap_or_default().to_owned();
    match engine.handle_query(&query).await {
        Ok(report) => (StatusCode::OK, report.final_text).into_response(),
        Err(e) if e.is_validation() => (StatusCode::BAD_REQUEST, REJECTED_BODY).into_response(),
        Err(Error::AuthMismatch { .. }) => {
            (StatusCode::UNAUTHORIZED, REJECTED_BODY).into_response()
        }
        Err(e) => {
            error!("Update failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
