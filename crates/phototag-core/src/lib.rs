//! Phototag Core - Track parsing, interpolation, and photo records
//!
//! This crate matches photos to GPS tracks by capture time: streaming
//! GPX/KML readers feed a time-ordered track index, and the photo store
//! interpolates a position for each photo against it.

pub mod config;
pub mod dms;
pub mod error;
pub mod formats;
pub mod models;
pub mod ports;
pub mod store;
pub mod track;

pub use error::{PhototagError, Result};
pub use models::{Fix, PhotoMetadata, PhotoRecord, TrackPoint};
pub use store::PhotoStore;
pub use track::{interpolate, TrackIndex};
