//! # Box Derivation
//!
//! Turns an entry's articles into individually numbered, individually weighed
//! boxes.
//!
//! ## Rules
//!
//! | Input | Result |
//! |-------|--------|
//! | UOM is BOX/CARTON, quantity > 0 | `quantity` boxes |
//! | any other UOM, or quantity 0 | no boxes |
//!
//! Box numbers come from one counter shared by every article in the entry,
//! so they are unique and ordered by article order. Weights default to the
//! article aggregate divided by quantity; a box that already exists with the
//! same number and article description keeps its stored weights.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use warelabel::boxes::derive_boxes;
//! use warelabel::inventory::{Article, ArticleSet, BoxSet};
//!
//! let articles: ArticleSet = vec![Article::new("Wheat Flour", 3, "BOX").weights(30.0, 33.0)]
//!     .into_iter()
//!     .collect();
//! let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//!
//! let boxes = derive_boxes(date, &articles, &BoxSet::new());
//! assert_eq!(boxes.numbers(), vec![1, 2, 3]);
//! assert_eq!(boxes.get(1).unwrap().net_weight, 10.0);
//! ```

mod derive;
mod ident;
mod reconcile;

pub use derive::{derive_boxes, override_box_weights, remove_box};
pub use ident::{box_identifier, date_stamp, sanitize_description};
pub use reconcile::{WEIGHT_EPSILON, WeightMismatch, reconcile, require_reconciled};
