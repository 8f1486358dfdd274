//! # Warelabel - Box Labels for Warehouse Goods Receipt
//!
//! Warelabel turns the articles of a goods-receipt entry into individually
//! labelled boxes and prints those labels. It provides:
//!
//! - **Box derivation**: numbered boxes with per-box weights that survive
//!   re-derivation
//! - **Label rendering**: a 4×2 inch raster with a QR code of the compacted
//!   payload and a prioritised text block
//! - **Printer directory**: discovery with a synthetic fallback and
//!   auto-selection
//! - **Print dispatch**: job tracking with bounded polling and sequential
//!   batches that survive per-box failures
//!
//! ## Quick Start
//!
//! ```
//! use chrono::NaiveDate;
//! use warelabel::{
//!     boxes::derive_boxes,
//!     inventory::{Article, BoxSet, Entry},
//!     label::{LabelPayload, LabelSpec, render_label},
//! };
//!
//! let mut entry = Entry::new("ACME", "INW-1", "2024-03-15");
//! entry.articles.insert(Article::new("Wheat Flour", 3, "BOX").weights(30.0, 33.0));
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//! entry.boxes = derive_boxes(date, &entry.articles, &BoxSet::new());
//! assert_eq!(entry.boxes.len(), 3);
//!
//! let record = entry.boxes.get(2).unwrap();
//! let (_, article) = entry.articles.owner_of(record).unwrap();
//! let payload = LabelPayload::resolve(&entry, record, article);
//! let label = render_label(&payload, &LabelSpec::STANDARD_4X2)?;
//! assert_eq!((label.width(), label.height()), (812, 406));
//! # Ok::<(), warelabel::WarelabelError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`inventory`] | Entries, articles and boxes |
//! | [`boxes`] | Box derivation, removal, weight reconciliation |
//! | [`label`] | Label payload, layout and rendering |
//! | [`printer`] | Printer descriptions, discovery, session selection |
//! | [`dispatch`] | Print jobs, polling and batches |
//! | [`transport`] | Local spooler and remote HTTP print channels |
//! | [`api`] | Inventory persistence and SKU lookup |
//! | [`service`] | The operations behind the entry form |
//! | [`server`] | HTTP API for the entry form |
//! | [`config`] | Client configuration |
//! | [`error`] | Error types |

pub mod api;
pub mod boxes;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod inventory;
pub mod label;
pub mod printer;
pub mod server;
pub mod service;
pub mod transport;

// Re-exports for convenience
pub use config::ClientConfig;
pub use error::WarelabelError;
pub use label::{LabelSpec, render_label};
pub use service::LabelService;
