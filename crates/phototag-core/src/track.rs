//! Track storage and timestamp-based position lookup.

pub mod index;
pub mod interpolate;

pub use index::TrackIndex;
pub use interpolate::interpolate;
