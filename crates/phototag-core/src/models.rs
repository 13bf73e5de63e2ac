pub mod photo;
pub mod point;

pub use photo::{GpsWrite, PhotoMetadata, PhotoRecord, MAP_DATUM};
pub use point::{format_coords, format_elevation, format_timestamp, valid_coords, Fix, TrackPoint};
