//! HTTP interface.
//!
//! | method | path            | body                | response                                   |
//! |--------|-----------------|---------------------|--------------------------------------------|
//! | POST   | `/api/query`    | `{"query": "..."}`  | `{columns, rows, executionTime}` or `{error}` |
//! | GET    | `/api/status`   |                     | `{ready, message}`                         |
//! | GET    | `/api/examples` |                     | `[{id, name, description, query}]`         |
//!
//! Queries run on the blocking thread pool: loading a table may block on
//! network or disk I/O and execution is CPU-bound.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::database::{Database, DatabaseError, ErrorResponse, StatusResponse};
use crate::samples::{sample_queries, SampleQuery};

/// Builds the application router.
pub fn router(db: Arc<Database>) -> Router {
    Router::new()
        .route("/api/query", post(run_query))
        .route("/api/status", get(status))
        .route("/api/examples", get(examples))
        .with_state(db)
}

/// HTTP server over a shared database.
pub struct HttpServer {
    db: Arc<Database>,
    addr: SocketAddr,
}

impl HttpServer {
    /// Creates a server that will listen on `addr`.
    pub fn new(db: Arc<Database>, addr: SocketAddr) -> Self {
        Self { db, addr }
    }

    /// The address the server listens on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves until the process exits.
    pub async fn serve(self) -> std::io::Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serves until `signal` completes, then stops accepting connections
    /// and lets in-flight requests finish.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("Tabula HTTP server listening on {}", listener.local_addr()?);
        axum::serve(listener, router(self.db))
            .with_graceful_shutdown(signal)
            .await
    }
}

async fn run_query(
    State(db): State<Arc<Database>>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Response {
    let sql = match body {
        Ok(Json(body)) => match body.get("query").and_then(JsonValue::as_str) {
            Some(sql) if !sql.is_empty() => sql.to_string(),
            _ => return error_response(DatabaseError::invalid_query()),
        },
        Err(rejection) => {
            debug!(%rejection, "Rejected query request body");
            return error_response(DatabaseError::invalid_query());
        }
    };

    match tokio::task::spawn_blocking(move || db.run_query(&sql)).await {
        Ok(Ok(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Err(e)) => error_response(e),
        Err(e) => {
            error!(error = %e, "Query task failed");
            error_response(DatabaseError::Internal(
                "An unknown error occurred".to_string(),
            ))
        }
    }
}

async fn status(State(db): State<Arc<Database>>) -> Json<StatusResponse> {
    Json(db.status())
}

async fn examples() -> Json<&'static [SampleQuery]> {
    Json(sample_queries())
}

fn error_response(error: DatabaseError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match &error {
        DatabaseError::Load(cause) => warn!(error = %cause, "Query rejected, tables not ready"),
        DatabaseError::Internal(message) => error!(error = %message, "Query failed"),
        other => debug!(error = %other, "Query rejected"),
    }
    (status, Json(ErrorResponse::new(error.to_string()))).into_response()
}
