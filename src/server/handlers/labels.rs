//! Label preview and print handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::dispatch::BatchReport;
use crate::inventory::Entry;
use crate::service::ActionResult;

use super::super::state::AppState;
use super::{reject, status_for};

#[derive(Deserialize)]
pub struct BoxRequest {
    pub entry: Entry,
    pub box_number: u32,
}

/// POST /api/labels/preview - Render one box label as PNG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BoxRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let image = state
        .service
        .preview(&req.entry, req.box_number)
        .await
        .map_err(reject)?;
    let png_bytes = image.to_png().map_err(reject)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}

/// POST /api/labels/print - Print one box on the session's printer.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BoxRequest>,
) -> (StatusCode, Json<ActionResult>) {
    let session = state.session.read().await.clone();
    let catalog = state.catalog.read().await.clone();

    let result = state
        .service
        .print_box(&session, &catalog, &req.entry, req.box_number)
        .await;
    match result {
        Ok(printed) => {
            let result = if printed.result.is_printed() {
                ActionResult::ok(printed.message())
            } else {
                ActionResult::fail(printed.message())
            };
            (StatusCode::OK, Json(result))
        }
        Err(e) => (status_for(&e), Json(ActionResult::fail(e.to_string()))),
    }
}

#[derive(Serialize)]
pub struct BatchResponse {
    #[serde(flatten)]
    pub result: ActionResult,
    pub report: Option<BatchReport>,
}

/// POST /api/labels/print-batch - Print every box of the entry.
pub async fn print_batch(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<Entry>,
) -> (StatusCode, Json<BatchResponse>) {
    let session = state.session.read().await.clone();
    let catalog = state.catalog.read().await.clone();

    match state.service.print_all(&session, &catalog, &entry).await {
        Ok(report) => {
            let result = if report.failures() == 0 {
                ActionResult::ok(report.message())
            } else {
                ActionResult::fail(report.message())
            };
            (
                StatusCode::OK,
                Json(BatchResponse {
                    result,
                    report: Some(report),
                }),
            )
        }
        Err(e) => (
            status_for(&e),
            Json(BatchResponse {
                result: ActionResult::fail(e.to_string()),
                report: None,
            }),
        ),
    }
}
