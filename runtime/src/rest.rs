// Copyright 2026 Screener Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP REST API for the screener.
//!
//! Every POST endpoint maps 1:1 to an action: the JSON body is tagged with
//! the endpoint's action and run through the same [`Screener::dispatch_message`]
//! path as `/api/v1/dispatch`. Responses are always HTTP 200 carrying the
//! action's result contract, failures included.

use crate::error::ScreenError;
use crate::protocol;
use crate::service::Screener;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Build the axum Router with all REST endpoints.
pub fn router(screener: Arc<Screener>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/status", post(handle_status))
        .route("/api/v1/insider", post(handle_insider))
        .route("/api/v1/analyze", post(handle_analyze))
        .route("/api/v1/dispatch", post(handle_dispatch))
        .layer(cors)
        .with_state(screener)
}

/// Serve the REST API on `127.0.0.1:port` until Ctrl-C.
pub async fn start(port: u16, screener: Arc<Screener>) -> anyhow::Result<()> {
    let app = router(Arc::clone(&screener));
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("REST API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;
    screener.shutdown().await;
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

/// Tag the body with `action` (when given) and dispatch it.
async fn dispatch(action: Option<&str>, body: Bytes, screener: Arc<Screener>) -> Json<Value> {
    let mut message: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            let err = ScreenError::InvalidInput(format!("request body is not JSON: {e}"));
            return Json(protocol::error_value(&err));
        }
    };

    if let Some(action) = action {
        let Some(obj) = message.as_object_mut() else {
            let err = ScreenError::InvalidInput("request body must be a JSON object".into());
            return Json(protocol::error_value(&err));
        };
        obj.insert("action".to_string(), Value::from(action));
    }

    Json(screener.dispatch_message(message).await)
}

// ── Handlers ────────────────────────────────────────────────────

async fn health(State(screener): State<Arc<Screener>>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "activeTabs": screener.active_tabs(),
    }))
}

async fn handle_status(State(screener): State<Arc<Screener>>, body: Bytes) -> Json<Value> {
    dispatch(Some("fetchStatus"), body, screener).await
}

async fn handle_insider(State(screener): State<Arc<Screener>>, body: Bytes) -> Json<Value> {
    dispatch(Some("fetchInsiderData"), body, screener).await
}

/// `withSearch: true` in the body selects grounded analysis.
async fn handle_analyze(State(screener): State<Arc<Screener>>, body: Bytes) -> Json<Value> {
    dispatch(Some("aiAnalyze"), body, screener).await
}

async fn handle_dispatch(State(screener): State<Arc<Screener>>, body: Bytes) -> Json<Value> {
    dispatch(None, body, screener).await
}
