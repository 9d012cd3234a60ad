//! HTTP scoring service for a gradient-boosted shipment model.
//!
//! A request is validated, turned into a one-hot feature row aligned to the
//! model's column order, and scored by a tree ensemble loaded from disk.

pub mod config;
pub mod error;
pub mod features;
pub mod handler;
pub mod loader;
pub mod model;
pub mod types;
pub mod validate;

pub use config::Config;
pub use error::ScoreError;
pub use handler::{router, AppState};
