//! Session-scoped printer selection.
//!
//! A [`PrintSession`] is owned by whoever drives printing (one per user
//! session) and passed explicitly to dispatch calls.

use serde::{Deserialize, Serialize};

use super::config::{MediaSpec, PrinterInfo};
use super::directory::PrinterCatalog;
use crate::error::WarelabelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintSession {
    /// Explicitly chosen printer, if any.
    pub selected_printer: Option<String>,
    /// Media every job in this session is printed on.
    pub media: MediaSpec,
}

impl PrintSession {
    pub fn new(media: MediaSpec) -> Self {
        Self {
            selected_printer: None,
            media,
        }
    }

    /// Choose a printer explicitly. Blank names clear the selection.
    pub fn select(&mut self, name: impl Into<String>) {
        let name = name.into();
        let name = name.trim();
        self.selected_printer = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
    }

    pub fn clear(&mut self) {
        self.selected_printer = None;
    }

    /// The printer a job should go to.
    ///
    /// An explicit selection must exist in the catalog; without one the
    /// catalog's auto-selection applies. Either way the printer must accept
    /// this session's media.
    pub fn resolve_printer<'a>(&self, catalog: &'a PrinterCatalog) -> Result<&'a PrinterInfo, WarelabelError> {
        let printer = match self.selected_printer.as_deref() {
            Some(name) => catalog.find(name).ok_or_else(|| {
                WarelabelError::Precondition(format!(
                    "Printer '{}' is not available. Choose one of: {}",
                    name,
                    catalog.names().join(", ")
                ))
            })?,
            None => catalog.auto_select().ok_or_else(|| {
                WarelabelError::Precondition(
                    "No online label printer found. Select a printer before printing.".to_string(),
                )
            })?,
        };

        if !printer.accepts(&self.media) {
            return Err(WarelabelError::Precondition(format!(
                "Printer '{}' cannot take {:.1}\" x {:.1}\" labels",
                printer.name, self.media.width_in, self.media.height_in
            )));
        }

        Ok(printer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::PrinterStatus;

    fn media() -> MediaSpec {
        MediaSpec::new(4.0, 2.0, 203)
    }

    fn catalog() -> PrinterCatalog {
        PrinterCatalog::from_discovered(vec![
            PrinterInfo {
                name: "Office".into(),
                status: PrinterStatus::Online,
                supports_label_printing: false,
                ..Default::default()
            },
            PrinterInfo {
                name: "Zebra".into(),
                status: PrinterStatus::Online,
                supports_label_printing: true,
                max_media_width_in: Some(4.0),
                ..Default::default()
            },
            PrinterInfo {
                name: "Mini".into(),
                status: PrinterStatus::Online,
                supports_label_printing: true,
                max_media_width_in: Some(2.0),
                ..Default::default()
            },
        ])
    }

    #[test]
    fn test_auto_selection() {
        let session = PrintSession::new(media());
        assert_eq!(session.resolve_printer(&catalog()).unwrap().name, "Zebra");
    }

    #[test]
    fn test_explicit_selection_wins() {
        let mut session = PrintSession::new(media());
        session.select("Office");
        assert_eq!(session.resolve_printer(&catalog()).unwrap().name, "Office");
    }

    #[test]
    fn test_unknown_selection_fails() {
        let mut session = PrintSession::new(media());
        session.select("Ghost");
        let err = session.resolve_printer(&catalog()).unwrap_err();
        assert!(err.to_string().contains("Printer 'Ghost' is not available"));
    }

    #[test]
    fn test_blank_selection_clears() {
        let mut session = PrintSession::new(media());
        session.select("Zebra");
        session.select("  ");
        assert_eq!(session.selected_printer, None);
    }

    #[test]
    fn test_media_too_large() {
        let mut session = PrintSession::new(media());
        session.select("Mini");
        assert!(matches!(
            session.resolve_printer(&catalog()),
            Err(WarelabelError::Precondition(_))
        ));
    }

    #[test]
    fn test_no_ready_printer() {
        let catalog = PrinterCatalog::from_discovered(vec![PrinterInfo {
            name: "Off".into(),
            status: PrinterStatus::Offline,
            supports_label_printing: true,
            ..Default::default()
        }]);
        let err = PrintSession::new(media()).resolve_printer(&catalog).unwrap_err();
        assert!(err.to_string().starts_with("No online label printer found"));
    }
}
