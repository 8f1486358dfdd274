//! # Printer Descriptions
//!
//! This module defines how a print sink and the media sent to it are
//! described.
//!
//! ## Media Size
//!
//! | Field | Unit |
//! |-------|------|
//! | `width_in`, `height_in` | inches |
//! | `dpi` | dots per inch |
//!
//! ```
//! use warelabel::printer::MediaSpec;
//!
//! let media = MediaSpec::new(4.0, 2.0, 203);
//! assert_eq!(media.width_dots(), 812);
//! assert!((media.width_mm() - 101.6).abs() < 0.01);
//! ```

use serde::{Deserialize, Serialize};

use crate::label::LabelSpec;

/// Name of the synthetic sink used when discovery finds nothing.
pub const DEFAULT_PRINTER_NAME: &str = "default";

/// How the sink is attached to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Usb,
    Network,
    Bluetooth,
    /// Software sink (PDF writer, preview, remote virtual printer).
    Virtual,
    #[default]
    Unknown,
}

/// Last reported availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterStatus {
    Online,
    Offline,
    Busy,
    Error,
    #[default]
    Unknown,
}

/// Physical media dimensions and resolution for one job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaSpec {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u16,
}

impl MediaSpec {
    pub fn new(width_in: f64, height_in: f64, dpi: u16) -> Self {
        Self {
            width_in,
            height_in,
            dpi,
        }
    }

    /// Width in dots at this media's DPI
    #[inline]
    pub fn width_dots(&self) -> u32 {
        (self.width_in * self.dpi as f64).round() as u32
    }

    /// Height in dots at this media's DPI
    #[inline]
    pub fn height_dots(&self) -> u32 {
        (self.height_in * self.dpi as f64).round() as u32
    }

    /// Width in millimeters
    #[inline]
    pub fn width_mm(&self) -> f64 {
        self.width_in * 25.4
    }

    /// Height in millimeters
    #[inline]
    pub fn height_mm(&self) -> f64 {
        self.height_in * 25.4
    }

    /// CUPS-style custom media name, e.g. `Custom.101.6x50.8mm`.
    pub fn cups_media(&self) -> String {
        format!("Custom.{:.1}x{:.1}mm", self.width_mm(), self.height_mm())
    }
}

impl From<&LabelSpec> for MediaSpec {
    fn from(spec: &LabelSpec) -> Self {
        Self::new(spec.width_in, spec.height_in, spec.dpi)
    }
}

/// One discovered print sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterInfo {
    pub name: String,
    pub connection_type: ConnectionType,
    pub status: PrinterStatus,
    pub supports_label_printing: bool,
    /// Largest media width in inches, if the sink reports one.
    pub max_media_width_in: Option<f64>,
    /// Largest media height in inches, if the sink reports one.
    pub max_media_height_in: Option<f64>,
    pub dpi: Option<u16>,
}

impl Default for PrinterInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            connection_type: ConnectionType::Unknown,
            status: PrinterStatus::Unknown,
            supports_label_printing: false,
            max_media_width_in: None,
            max_media_height_in: None,
            dpi: None,
        }
    }
}

impl PrinterInfo {
    /// The synthetic sink that stands in when no printer could be discovered.
    ///
    /// It routes to whatever the channel treats as its default destination.
    pub fn synthetic_default() -> Self {
        Self {
            name: DEFAULT_PRINTER_NAME.to_string(),
            connection_type: ConnectionType::Virtual,
            status: PrinterStatus::Online,
            supports_label_printing: true,
            ..Default::default()
        }
    }

    pub fn is_default_sink(&self) -> bool {
        self.name == DEFAULT_PRINTER_NAME
    }

    /// Online and able to print labels.
    pub fn is_label_ready(&self) -> bool {
        self.status == PrinterStatus::Online && self.supports_label_printing
    }

    /// Whether `media` fits within this printer's reported limits.
    /// Unknown limits accept anything.
    pub fn accepts(&self, media: &MediaSpec) -> bool {
        let fits = |limit: Option<f64>, size: f64| limit.is_none_or(|max| size <= max + 1e-6);
        fits(self.max_media_width_in, media.width_in) && fits(self.max_media_height_in, media.height_in)
    }
}
