//! Printer catalog and selection handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::printer::{PrintSession, PrinterCatalog};

use super::super::state::AppState;
use super::reject;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ListQuery {
    /// Rediscover before answering.
    pub refresh: bool,
}

/// GET /api/printers - The printer catalog, optionally rediscovered.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<PrinterCatalog> {
    if query.refresh {
        let fresh = state.service.printers().await;
        *state.catalog.write().await = fresh;
    }
    Json(state.catalog.read().await.clone())
}

/// GET /api/printers/selected - The current print session.
pub async fn selected(State(state): State<Arc<AppState>>) -> Json<PrintSession> {
    Json(state.session.read().await.clone())
}

#[derive(Deserialize)]
pub struct SelectRequest {
    /// Blank or null clears the selection.
    pub name: Option<String>,
}

/// PUT /api/printers/selected - Choose the printer for this session.
pub async fn select(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<PrintSession>, (StatusCode, String)> {
    let mut candidate = state.session.read().await.clone();
    candidate.select(req.name.unwrap_or_default());

    // Only accept selections that can actually be printed to.
    if candidate.selected_printer.is_some() {
        let catalog = state.catalog.read().await;
        candidate.resolve_printer(&catalog).map_err(reject)?;
    }

    let mut session = state.session.write().await;
    *session = candidate.clone();
    Ok(Json(candidate))
}
