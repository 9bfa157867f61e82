//! HTTP status page and JSON query endpoint.
//!
//! Handlers only read the latest published tables from the [`RateBoard`];
//! they never trigger or wait on sampling.

use std::str::FromStr;
use std::sync::Arc;
use std::thread;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use chrono::Local;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

use lure_core::board::RateBoard;
use lure_core::rates::Interval;
use lure_core::render::{render_header, render_report};

#[derive(Clone)]
pub(crate) struct WebState {
    board: RateBoard,
    hostname: Arc<str>,
    interval: Interval,
}

impl WebState {
    pub(crate) fn new(board: RateBoard, hostname: &str, interval: Interval) -> Self {
        Self {
            board,
            hostname: Arc::from(hostname),
            interval,
        }
    }
}

/// Table selected by `/json?stats=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TableKind {
    Mdt,
    Ost,
    MdtJob,
    OstJob,
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mdt" => Ok(TableKind::Mdt),
            "ost" => Ok(TableKind::Ost),
            "mdtjob" => Ok(TableKind::MdtJob),
            "ostjob" => Ok(TableKind::OstJob),
            other => Err(format!(
                "unknown table '{}', expected one of mdt, ost, mdtjob, ostjob",
                other
            )),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct JsonQuery {
    stats: Option<String>,
}

pub(crate) fn router(state: WebState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/stats", get(handle_stats))
        .route("/json", get(handle_json))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_health() -> &'static str {
    "ok"
}

async fn handle_stats(State(state): State<WebState>) -> String {
    let tables = state.board.latest();
    let header = render_header(&state.hostname, &Local::now(), state.interval.as_secs());
    format!("{}\n{}", header, render_report(&tables))
}

async fn handle_json(State(state): State<WebState>, Query(query): Query<JsonQuery>) -> Response {
    let Some(raw) = query.stats.filter(|s| !s.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "missing 'stats' query parameter").into_response();
    };
    let kind = match raw.parse::<TableKind>() {
        Ok(kind) => kind,
        Err(e) => {
            debug!(stats = %raw, "rejecting json query");
            return (StatusCode::BAD_REQUEST, e).into_response();
        }
    };

    let tables = state.board.latest();
    let (empty, response) = match kind {
        TableKind::Mdt => (tables.mdt.is_empty(), Json(&tables.mdt).into_response()),
        TableKind::Ost => (tables.ost.is_empty(), Json(&tables.ost).into_response()),
        TableKind::MdtJob => (
            tables.mdt_jobs.is_empty(),
            Json(&tables.mdt_jobs).into_response(),
        ),
        TableKind::OstJob => (
            tables.ost_jobs.is_empty(),
            Json(&tables.ost_jobs).into_response(),
        ),
    };
    if empty {
        StatusCode::NO_CONTENT.into_response()
    } else {
        response
    }
}

/// Serves the router on its own thread with a dedicated tokio runtime.
pub(crate) fn spawn(addr: String, state: WebState) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("lure-http".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!(error = %e, "failed to build tokio runtime, HTTP disabled");
                    return;
                }
            };
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::bind(&addr).await {
                    Ok(listener) => listener,
                    Err(e) => {
                        error!(%addr, error = %e, "failed to bind, HTTP disabled");
                        return;
                    }
                };
                info!(%addr, "listening");
                if let Err(e) = axum::serve(listener, router(state)).await {
                    error!(error = %e, "server error");
                }
            });
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lure_core::tables::{CounterSnapshot, JobSnapshot, RateTables};

    fn state_with(tables: RateTables) -> WebState {
        let board = RateBoard::new();
        board.publish(tables);
        WebState::new(board, "mds01", Interval::from_secs(5).unwrap())
    }

    fn query(stats: Option<&str>) -> Query<JsonQuery> {
        Query(JsonQuery {
            stats: stats.map(str::to_string),
        })
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn sample_tables() -> RateTables {
        let mut tables = RateTables::default();
        let counters: CounterSnapshot = [("open".to_string(), 6)].into_iter().collect();
        tables.mdt.insert("lustre-MDT0000".into(), counters.clone());
        let mut jobs = JobSnapshot::new();
        jobs.insert("ls.0".into(), counters);
        tables.mdt_jobs.insert("lustre-MDT0000".into(), jobs);
        tables
    }

    #[test]
    fn test_table_kind_parse() {
        assert_eq!("mdt".parse::<TableKind>(), Ok(TableKind::Mdt));
        assert_eq!("ostjob".parse::<TableKind>(), Ok(TableKind::OstJob));
        assert!("MDT".parse::<TableKind>().is_err());
        assert!("".parse::<TableKind>().is_err());
    }

    #[tokio::test]
    async fn test_json_returns_table() {
        let state = state_with(sample_tables());
        let response = handle_json(State(state), query(Some("mdt"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(value["lustre-MDT0000"]["open"], 6);
    }

    #[tokio::test]
    async fn test_json_job_table() {
        let state = state_with(sample_tables());
        let response = handle_json(State(state), query(Some("mdtjob"))).await;
        let value: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(value["lustre-MDT0000"]["ls.0"]["open"], 6);
    }

    #[tokio::test]
    async fn test_json_empty_table_is_no_content() {
        let state = state_with(sample_tables());
        let response = handle_json(State(state), query(Some("ost"))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_json_bad_requests() {
        let state = state_with(sample_tables());
        for stats in [None, Some(""), Some("disk")] {
            let response = handle_json(State(state.clone()), query(stats)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_stats_page() {
        let page = handle_stats(State(state_with(sample_tables()))).await;
        assert!(page.starts_with("Server: mds01 | Time: "));
        assert!(page.contains("| Sample Interval: 5s\n"));
        assert!(page.contains("MDT Metadata Stats /s:"));
        assert!(page.contains("No OST stats available."));
        assert!(page.contains("ls.0@MDT0000"));
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(handle_health().await, "ok");
    }
}
