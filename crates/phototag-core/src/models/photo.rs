//! Photo record and EXIF-boundary value types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dms::{decimal_to_dms, dms_to_decimal, Dms, Rational, MAX_DENOMINATOR};
use crate::error::{PhototagError, Result};
use crate::models::point::{
    format_coords, format_elevation, format_timestamp, valid_coords, Fix,
};

/// Map datum recorded alongside every GPS write.
pub const MAP_DATUM: &str = "WGS-84";

/// The {timestamp, latitude, longitude, elevation} record an EXIF reader
/// hands back for one photo file. Every field is optional; cameras omit
/// what they do not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub capture_timestamp: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
}

/// One loaded photo and its in-memory geotagging state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoRecord {
    pub path: PathBuf,
    pub capture_timestamp: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    /// Coordinates changed in memory and not yet persisted.
    pub modified: bool,
    /// Placed by hand; excluded from automatic re-interpolation.
    pub manual: bool,
}

impl PhotoRecord {
    pub fn new(path: PathBuf, metadata: PhotoMetadata) -> Self {
        Self {
            path,
            capture_timestamp: metadata.capture_timestamp,
            latitude: metadata.latitude,
            longitude: metadata.longitude,
            elevation: metadata.elevation,
            modified: false,
            manual: false,
        }
    }

    /// Check whether this record holds coordinates within valid Earth bounds.
    pub fn valid_coords(&self) -> bool {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => valid_coords(lat, lon),
            _ => false,
        }
    }

    pub(crate) fn set_location(&mut self, fix: Fix) {
        self.latitude = Some(fix.latitude);
        self.longitude = Some(fix.longitude);
        self.elevation = Some(fix.elevation);
        self.modified = true;
    }

    /// Reset to the state read from disk, discarding in-memory changes.
    pub(crate) fn reload(&mut self, metadata: PhotoMetadata) {
        self.capture_timestamp = metadata.capture_timestamp;
        self.latitude = metadata.latitude;
        self.longitude = metadata.longitude;
        self.elevation = metadata.elevation;
        self.modified = false;
        self.manual = false;
    }

    /// Plain-text summary of the record, one line per known fact.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        if let Some(stamp) = self.capture_timestamp {
            lines.push(format_timestamp(stamp));
        }
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            lines.push(format_coords(lat, lon));
        } else {
            lines.push("Not geotagged".to_string());
        }
        if let Some(ele) = self.elevation {
            lines.push(format_elevation(ele));
        }
        lines.join("\n")
    }
}

/// The record handed to the EXIF-write collaborator: DMS rationals per
/// axis, hemisphere reference letters derived from sign, a fixed map
/// datum, and an optional elevation rational with its sea-level reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsWrite {
    pub latitude: Dms,
    pub latitude_ref: char,
    pub longitude: Dms,
    pub longitude_ref: char,
    pub elevation: Option<Rational>,
    /// 0 above sea level, 1 below, per the EXIF GPSAltitudeRef convention
    pub elevation_ref: u8,
    pub datum: String,
}

impl GpsWrite {
    /// Convert decimal degrees into the storable form. Rejects coordinates
    /// outside valid Earth bounds without producing a record.
    pub fn from_decimal(latitude: f64, longitude: f64, elevation: Option<f64>) -> Result<Self> {
        if !valid_coords(latitude, longitude) {
            return Err(PhototagError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude: decimal_to_dms(latitude),
            latitude_ref: if latitude >= 0.0 { 'N' } else { 'S' },
            longitude: decimal_to_dms(longitude),
            longitude_ref: if longitude >= 0.0 { 'E' } else { 'W' },
            elevation: elevation.map(|ele| Rational::approximate(ele.abs(), MAX_DENOMINATOR)),
            elevation_ref: u8::from(elevation.is_some_and(|ele| ele < 0.0)),
            datum: MAP_DATUM.to_string(),
        })
    }

    /// Recover decimal coordinates, e.g. when reading a record back.
    pub fn to_decimal(&self) -> (f64, f64, Option<f64>) {
        let lat = dms_to_decimal(
            self.latitude.degrees.to_f64(),
            self.latitude.minutes.to_f64(),
            self.latitude.seconds.to_f64(),
            self.latitude_ref,
        );
        let lon = dms_to_decimal(
            self.longitude.degrees.to_f64(),
            self.longitude.minutes.to_f64(),
            self.longitude.seconds.to_f64(),
            self.longitude_ref,
        );
        let ele = self.elevation.map(|r| {
            let sign = if self.elevation_ref == 1 { -1.0 } else { 1.0 };
            sign * r.to_f64()
        });
        (lat, lon, ele)
    }
}
