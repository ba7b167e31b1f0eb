//! Dashboard Server
//! axum router exposing the WARN summary as an HTML page (`/`) and as JSON (`/data`).
//!
//! Every request loads the notice table afresh and recomputes all aggregates on the
//! blocking pool. Nothing is shared between requests except the source handle.

use crate::data::{LoaderError, NoticeSource, ProcessorError};
use crate::stats::{SummaryCalculator, WarnSummary};
use crate::web::page;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

const MAIN_JS: &str = include_str!("../../static/main.js");

type SharedSource = Arc<dyn NoticeSource>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] LoaderError),
    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] ProcessorError),
    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// WARN dashboard HTTP server.
pub struct Server {
    source: SharedSource,
}

impl Server {
    pub fn new(source: impl NoticeSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Build the router with all dashboard routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/data", get(data))
            .route("/static/main.js", get(main_js))
            .with_state(Arc::clone(&self.source))
    }

    /// Bind `addr` and serve until Ctrl-C.
    pub async fn run(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn index(State(source): State<SharedSource>) -> Result<Html<String>, AppError> {
    let summary = summarize(source).await?;
    Ok(Html(page::render_index(&summary)))
}

async fn data(State(source): State<SharedSource>) -> Result<Json<WarnSummary>, AppError> {
    Ok(Json(summarize(source).await?))
}

async fn main_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], MAIN_JS)
}

/// Load and aggregate on the blocking pool.
async fn summarize(source: SharedSource) -> Result<WarnSummary, AppError> {
    tokio::task::spawn_blocking(move || -> Result<WarnSummary, AppError> {
        let raw = source.load_notices()?;
        let summary = SummaryCalculator::compute_summary(&raw)?;
        info!(
            rows = raw.height(),
            companies = summary.company_data.len(),
            counties = summary.state_data.len(),
            months = summary.month_data.len(),
            employees = summary.state_data.total(),
            "summary computed"
        );
        Ok(summary)
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::testing::notice_frame;
    use crate::data::DataLoader;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use polars::prelude::DataFrame;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// In-memory notice table that counts how often it is loaded.
    struct MemorySource {
        table: DataFrame,
        loads: Arc<AtomicUsize>,
    }

    impl NoticeSource for MemorySource {
        fn load_notices(&self) -> Result<DataFrame, LoaderError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.table.clone())
        }
    }

    fn server() -> (Server, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let source = MemorySource {
            table: notice_frame(&[
                ("Acme", "Fresno County", "100", "2023-01-15"),
                ("Acme", "Fresno County", "50", "2023-02-01"),
                ("Globex", "Kern County", "bad", "2023-01-20"),
                ("Initech", "Kern County", "30", "2022-06-30"),
            ]),
            loads: Arc::clone(&loads),
        };
        (Server::new(source), loads)
    }

    async fn fetch(router: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn data_route_returns_the_three_views() {
        let (server, _) = server();

        let (status, content_type, body) = fetch(server.router(), "/data").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(
            value["company_data"],
            serde_json::json!({"Acme": 150.0, "Initech": 30.0, "Globex": 0.0})
        );
        assert_eq!(
            value["state_data"],
            serde_json::json!({"Fresno County": 150.0, "Kern County": 30.0})
        );
        assert!(body.contains(r#""company_data":{"Acme":150.0,"Initech":30.0,"Globex":0.0}"#));
        assert!(body.contains(r#""month_data":{"Jan 2023":100.0,"Feb 2023":50.0}"#));
    }

    #[tokio::test]
    async fn index_route_renders_the_page() {
        let (server, _) = server();

        let (status, content_type, body) = fetch(server.router(), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert!(body.contains("<td>Acme</td><td class=\"num\">150</td>"));
        assert!(body.contains("<td>Kern County</td><td class=\"num\">30</td>"));
        assert!(body.contains("<td>Feb 2023</td><td class=\"num\">50</td>"));
    }

    #[tokio::test]
    async fn every_request_reloads_the_source() {
        let (server, loads) = server();
        let router = server.router();

        fetch(router.clone(), "/data").await;
        fetch(router.clone(), "/").await;
        fetch(router, "/data").await;

        assert_eq!(loads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_workbook_is_a_server_error() {
        let server = Server::new(DataLoader::new("does/not/exist/warn_report.xlsx"));

        let (status, _, body) = fetch(server.router(), "/data").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Source unavailable"));

        let (status, _, _) = fetch(server.router(), "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn script_is_served() {
        let (server, loads) = server();

        let (status, content_type, body) = fetch(server.router(), "/static/main.js").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/javascript"));
        assert!(body.contains("fetch('/data')"));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (server, _) = server();
        let (status, _, _) = fetch(server.router(), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
