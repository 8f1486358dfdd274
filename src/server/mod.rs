//! # HTTP Server for the Entry Form
//!
//! Exposes box derivation, label preview and printing to the entry form UI.
//!
//! ## Usage
//!
//! ```bash
//! warelabel serve --listen 0.0.0.0:8080 --config warelabel.json
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | POST | `/api/boxes/derive` | entry |
//! | POST | `/api/boxes/remove` | `{entry, box_number}` |
//! | POST | `/api/boxes/weights` | `{entry, box_number, net_weight, gross_weight}` |
//! | POST | `/api/entries/save` | entry |
//! | POST | `/api/labels/preview` | `{entry, box_number}` → PNG |
//! | POST | `/api/labels/print` | `{entry, box_number}` |
//! | POST | `/api/labels/print-batch` | entry |
//! | GET | `/api/printers?refresh=true` | |
//! | GET, PUT | `/api/printers/selected` | `{name}` |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::WarelabelError;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/boxes/derive", post(handlers::boxes::derive))
        .route("/api/boxes/remove", post(handlers::boxes::remove))
        .route("/api/boxes/weights", post(handlers::boxes::weights))
        .route("/api/entries/save", post(handlers::boxes::save))
        .route("/api/labels/preview", post(handlers::labels::preview))
        .route("/api/labels/print", post(handlers::labels::print))
        .route("/api/labels/print-batch", post(handlers::labels::print_batch))
        .route("/api/printers", get(handlers::printers::list))
        .route(
            "/api/printers/selected",
            get(handlers::printers::selected).put(handlers::printers::select),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: ServerConfig, state: Arc<AppState>) -> Result<(), WarelabelError> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| WarelabelError::transport(&config.listen_addr, format!("failed to bind: {}", e)))?;
    info!(listen = %config.listen_addr, "warelabel server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| WarelabelError::transport(&config.listen_addr, format!("server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::api::{MemoryEntryApi, SkuTable};
    use crate::config::ClientConfig;
    use crate::dispatch::{Dispatcher, JobId, JobSnapshot, JobStatus, PollPolicy};
    use crate::printer::{PrinterCatalog, PrinterInfo, PrinterStatus};
    use crate::service::LabelService;
    use crate::transport::{ChannelKind, PrintChannel, SubmitReceipt, SubmitRequest};

    /// Accepts every job and reports it completed.
    #[derive(Default)]
    struct InstantChannel {
        submits: AtomicUsize,
    }

    #[async_trait]
    impl PrintChannel for InstantChannel {
        fn kind(&self) -> ChannelKind {
            ChannelKind::RemoteHttp
        }

        async fn list_printers(&self) -> Result<Vec<PrinterInfo>, WarelabelError> {
            Ok(vec![zebra()])
        }

        async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, WarelabelError> {
            let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(SubmitReceipt {
                job_id: JobId(format!("job-{}", n)),
                labels_count: request.images.len() as u32,
            })
        }

        async fn poll(&self, _job_id: &JobId) -> Result<JobSnapshot, WarelabelError> {
            Ok(JobSnapshot::new(JobStatus::Completed, 100))
        }
    }

    fn zebra() -> PrinterInfo {
        PrinterInfo {
            name: "Zebra".to_string(),
            status: PrinterStatus::Online,
            supports_label_printing: true,
            ..Default::default()
        }
    }

    fn app(catalog: PrinterCatalog) -> (Router, Arc<InstantChannel>) {
        let channel = Arc::new(InstantChannel::default());
        let config = ClientConfig {
            batch_delay_ms: 0,
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(channel.clone(), PollPolicy::fixed(Duration::from_millis(1), 3));
        let service = LabelService::new(
            Arc::new(MemoryEntryApi::new()),
            Arc::new(SkuTable::new().with("Wheat Flour", "SKU-77")),
            dispatcher,
            config,
        );
        (router(Arc::new(AppState::new(service, catalog))), channel)
    }

    fn entry_json() -> Value {
        json!({
            "company": "ACME",
            "transaction_no": "INW-1",
            "entry_date": "2024-03-15",
            "articles": [
                {"description": "Wheat Flour", "quantity": 2, "uom": "BOX",
                 "net_weight": 20.0, "total_weight": 22.0}
            ]
        })
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let body = match body {
            Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
            None => Body::empty(),
        };
        let resp = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 4 * 1024 * 1024)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send(router, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn derived(router: &Router) -> Value {
        let (status, entry) = send_json(router, "POST", "/api/boxes/derive", Some(entry_json())).await;
        assert_eq!(status, StatusCode::OK);
        entry
    }

    #[tokio::test]
    async fn test_derive_route() {
        let (router, _) = app(PrinterCatalog::from_discovered(vec![zebra()]));
        let entry = derived(&router).await;
        let boxes = entry["boxes"].as_array().unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[1]["box_id"], "240315-WHEATFLOUR-2");
        assert_eq!(boxes[0]["net_weight"], 10.0);
    }

    #[tokio::test]
    async fn test_derive_rejects_bad_date() {
        let (router, _) = app(PrinterCatalog::fallback());
        let mut entry = entry_json();
        entry["entry_date"] = json!("15/03/2024");
        let (status, _) = send(&router, "POST", "/api/boxes/derive", Some(entry)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_preview_returns_png() {
        let (router, channel) = app(PrinterCatalog::fallback());
        let entry = derived(&router).await;
        let (status, bytes) = send(
            &router,
            "POST",
            "/api/labels/preview",
            Some(json!({"entry": entry, "box_number": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(channel.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_print_batch_route() {
        let (router, channel) = app(PrinterCatalog::from_discovered(vec![zebra()]));
        let entry = derived(&router).await;
        let (status, body) = send_json(&router, "POST", "/api/labels/print-batch", Some(entry)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Printed 2 label(s) on Zebra");
        assert_eq!(channel.submits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_print_without_ready_printer() {
        let offline = PrinterInfo {
            status: PrinterStatus::Offline,
            ..zebra()
        };
        let (router, channel) = app(PrinterCatalog::from_discovered(vec![offline]));
        let entry = derived(&router).await;
        let (status, body) = send_json(
            &router,
            "POST",
            "/api/labels/print",
            Some(json!({"entry": entry, "box_number": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(channel.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_select_printer() {
        let (router, _) = app(PrinterCatalog::from_discovered(vec![zebra()]));
        let (status, body) = send_json(
            &router,
            "PUT",
            "/api/printers/selected",
            Some(json!({"name": "Zebra"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected_printer"], "Zebra");

        let (status, _) = send(
            &router,
            "PUT",
            "/api/printers/selected",
            Some(json!({"name": "Ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = send_json(&router, "GET", "/api/printers/selected", None).await;
        assert_eq!(body["selected_printer"], "Zebra");
    }

    #[tokio::test]
    async fn test_refresh_printers() {
        let (router, _) = app(PrinterCatalog::fallback());
        let (_, body) = send_json(&router, "GET", "/api/printers", None).await;
        assert_eq!(body["source"], "fallback");

        let (_, body) = send_json(&router, "GET", "/api/printers?refresh=true", None).await;
        assert_eq!(body["source"], "discovered");
        assert_eq!(body["printers"][0]["name"], "Zebra");
    }
}
