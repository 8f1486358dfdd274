//! Box derivation and entry handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::boxes::WeightMismatch;
use crate::inventory::Entry;
use crate::service::ActionResult;

use super::super::state::AppState;
use super::{reject, status_for};

/// POST /api/boxes/derive - Re-derive boxes from the entry's articles.
pub async fn derive(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<Entry>,
) -> Result<Json<Entry>, (StatusCode, String)> {
    state.service.derive(&entry).map(Json).map_err(reject)
}

#[derive(Deserialize)]
pub struct RemoveBoxRequest {
    pub entry: Entry,
    pub box_number: u32,
}

/// POST /api/boxes/remove - Drop one box and decrement its article.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RemoveBoxRequest>,
) -> Result<Json<Entry>, (StatusCode, String)> {
    state
        .service
        .remove(&req.entry, req.box_number)
        .map(Json)
        .map_err(reject)
}

#[derive(Deserialize)]
pub struct WeightsRequest {
    pub entry: Entry,
    pub box_number: u32,
    pub net_weight: f64,
    pub gross_weight: f64,
}

/// POST /api/boxes/weights - Manually set one box's weights.
pub async fn weights(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WeightsRequest>,
) -> Result<Json<Entry>, (StatusCode, String)> {
    state
        .service
        .override_weights(&req.entry, req.box_number, req.net_weight, req.gross_weight)
        .map(Json)
        .map_err(reject)
}

#[derive(Serialize)]
pub struct SaveResponse {
    #[serde(flatten)]
    pub result: ActionResult,
    pub warnings: Vec<WeightMismatch>,
}

/// POST /api/entries/save - Create or update the entry.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<Entry>,
) -> (StatusCode, Json<SaveResponse>) {
    match state.service.save_entry(&entry).await {
        Ok(saved) => {
            let verb = if saved.created { "created" } else { "updated" };
            let mut message = format!("Entry {} {}", entry.reference(), verb);
            if !saved.warnings.is_empty() {
                message.push_str(&format!(
                    " with {} weight warning(s)",
                    saved.warnings.len()
                ));
            }
            (
                StatusCode::OK,
                Json(SaveResponse {
                    result: ActionResult::ok(message),
                    warnings: saved.warnings,
                }),
            )
        }
        Err(e) => (
            status_for(&e),
            Json(SaveResponse {
                result: ActionResult::fail(e.to_string()),
                warnings: Vec::new(),
            }),
        ),
    }
}
