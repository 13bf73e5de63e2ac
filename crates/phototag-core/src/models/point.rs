//! Track point and position value types shared across all phototag crates.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One GPS sample from a track log: a position (plus elevation) at an
/// instant in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// UTC seconds since the epoch
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level; 0.0 when the track log carries none
    pub elevation: f64,
}

impl TrackPoint {
    pub fn new(timestamp: i64, latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            elevation,
        }
    }
}

/// An estimated position produced by the interpolator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

impl From<&TrackPoint> for Fix {
    fn from(point: &TrackPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            elevation: point.elevation,
        }
    }
}

/// Determine whether a latitude/longitude pair lies within valid Earth bounds.
pub fn valid_coords(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && latitude.abs() <= 90.0
        && longitude.abs() <= 180.0
}

/// Add cardinal directions to decimal coordinates, e.g. `N 48.52431, W 123.39110`.
pub fn format_coords(latitude: f64, longitude: f64) -> String {
    format!(
        "{} {:.5}, {} {:.5}",
        if latitude >= 0.0 { "N" } else { "S" },
        latitude.abs(),
        if longitude >= 0.0 { "E" } else { "W" },
        longitude.abs(),
    )
}

/// Render epoch seconds as a human-readable UTC date.
pub fn format_timestamp(epoch: i64) -> String {
    match Utc.timestamp_opt(epoch, 0).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("epoch {epoch}"),
    }
}

/// Render elevation relative to sea level.
pub fn format_elevation(elevation: f64) -> String {
    format!(
        "{:.1} m {} sea level",
        elevation.abs(),
        if elevation >= 0.0 { "above" } else { "below" },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_within_bounds_are_valid() {
        assert!(valid_coords(0.0, 0.0));
        assert!(valid_coords(90.0, 180.0));
        assert!(valid_coords(-90.0, -180.0));
        assert!(valid_coords(48.5, -123.4));
    }

    #[test]
    fn coords_outside_bounds_are_invalid() {
        assert!(!valid_coords(90.1, 0.0));
        assert!(!valid_coords(0.0, -180.5));
        assert!(!valid_coords(f64::NAN, 0.0));
        assert!(!valid_coords(0.0, f64::INFINITY));
    }

    #[test]
    fn format_coords_uses_cardinal_directions() {
        assert_eq!(format_coords(48.5, -123.4), "N 48.50000, W 123.40000");
        assert_eq!(format_coords(-33.9, 151.2), "S 33.90000, E 151.20000");
    }

    #[test]
    fn format_timestamp_renders_utc() {
        assert_eq!(format_timestamp(1287259753), "2010-10-16 20:09:13");
    }

    #[test]
    fn format_elevation_signs() {
        assert_eq!(format_elevation(12.34), "12.3 m above sea level");
        assert_eq!(format_elevation(-3.0), "3.0 m below sea level");
    }
}
