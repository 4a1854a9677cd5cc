//! Shared type definitions for the Idokep uploader.
//!
//! The host engine hands the uploader one [`ObservationRecord`] per archive
//! interval. Records carry their own [`UnitSystem`] tag so the uploader can
//! normalise them before formatting.
//!
//! # Modules
//!
//! - [`record`] -- The observation record and the well-known field names
//! - [`units`] -- Unit system tags used by the host engine

pub mod record;
pub mod units;

pub use record::{ObservationRecord, fields};
pub use units::UnitSystem;
