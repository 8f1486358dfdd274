//! Server state and configuration.

use tokio::sync::RwLock;

use crate::printer::{PrintSession, PrinterCatalog};
use crate::service::LabelService;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
}

/// Application state shared across handlers.
///
/// The server serves a single operator, so one print session and one
/// printer catalog are held for the life of the process.
pub struct AppState {
    pub service: LabelService,
    pub session: RwLock<PrintSession>,
    pub catalog: RwLock<PrinterCatalog>,
}

impl AppState {
    pub fn new(service: LabelService, catalog: PrinterCatalog) -> Self {
        let session = service.new_session();
        Self {
            service,
            session: RwLock::new(session),
            catalog: RwLock::new(catalog),
        }
    }
}
