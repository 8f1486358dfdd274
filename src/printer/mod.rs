//! # Printer Module
//!
//! This module describes print sinks and decides which one a job goes to.
//!
//! ## Modules
//!
//! - [`config`]: Printer and media descriptions
//! - [`directory`]: Discovery with fallback, auto-selection
//! - [`session`]: Session-scoped printer selection

pub mod config;
pub mod directory;
pub mod session;

pub use config::{ConnectionType, DEFAULT_PRINTER_NAME, MediaSpec, PrinterInfo, PrinterStatus};
pub use directory::{CatalogSource, PrinterCatalog, discover};
pub use session::PrintSession;
