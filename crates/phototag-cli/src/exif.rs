//! Photo metadata adapter backed by the kamadak `exif` reader.
//!
//! Reads capture time and any existing GPS block straight from the
//! image. Writes go to a JSON sidecar next to the photo rather than
//! back into the image; the sidecar is read back with precedence over
//! in-file EXIF, so reverting and re-reading see the committed state.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use exif::{Field, In, Tag, Value};
use tracing::debug;

use phototag_core::dms::dms_to_decimal;
use phototag_core::error::{PhototagError, Result};
use phototag_core::models::{GpsWrite, PhotoMetadata};
use phototag_core::ports::PhotoMetadataSource;

pub struct ExifSidecar {
    write_elevation: bool,
}

impl ExifSidecar {
    pub fn new(write_elevation: bool) -> Self {
        Self { write_elevation }
    }

    /// Path of the sidecar holding committed GPS data for `photo`.
    pub fn sidecar_path(photo: &Path) -> PathBuf {
        let mut name = photo.as_os_str().to_owned();
        name.push(".gps.json");
        PathBuf::from(name)
    }

    fn read_exif(path: &Path) -> Result<PhotoMetadata> {
        let file = File::open(path)?;
        let exif = exif::Reader::new()
            .read_from_container(&mut BufReader::new(file))
            .map_err(|e| PhototagError::MissingMetadata {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let capture_timestamp = exif
            .get_field(Tag::DateTimeOriginal, In::PRIMARY)
            .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))
            .and_then(parse_datetime);

        let latitude = axis(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef);
        let longitude = axis(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef);
        let elevation = altitude(&exif);

        Ok(PhotoMetadata {
            capture_timestamp,
            latitude,
            longitude,
            elevation,
        })
    }

    fn read_sidecar(path: &Path) -> Option<GpsWrite> {
        let sidecar = Self::sidecar_path(path);
        let content = fs::read_to_string(&sidecar).ok()?;
        match serde_json::from_str(&content) {
            Ok(gps) => Some(gps),
            Err(e) => {
                debug!(path = %sidecar.display(), "ignoring unreadable sidecar: {e}");
                None
            }
        }
    }
}

impl PhotoMetadataSource for ExifSidecar {
    fn read(&self, path: &Path) -> Result<PhotoMetadata> {
        let sidecar = Self::read_sidecar(path);
        let mut metadata = match Self::read_exif(path) {
            Ok(metadata) => metadata,
            // A sidecar alone still identifies the file as a photo.
            Err(err) if sidecar.is_none() => return Err(err),
            Err(_) => PhotoMetadata::default(),
        };

        if let Some(gps) = sidecar {
            let (lat, lon, ele) = gps.to_decimal();
            metadata.latitude = Some(lat);
            metadata.longitude = Some(lon);
            metadata.elevation = ele;
        }

        Ok(metadata)
    }

    fn write(&self, path: &Path, gps: &GpsWrite) -> Result<()> {
        let mut record = gps.clone();
        if !self.write_elevation {
            record.elevation = None;
            record.elevation_ref = 0;
        }
        let json = serde_json::to_string_pretty(&record).map_err(|e| {
            PhototagError::MissingMetadata {
                path: path.to_path_buf(),
                reason: format!("could not encode GPS record: {e}"),
            }
        })?;
        fs::write(Self::sidecar_path(path), json)?;
        Ok(())
    }
}

/// EXIF "YYYY:MM:DD HH:MM:SS" to UTC epoch seconds.
fn parse_datetime(field: &Field) -> Option<i64> {
    let Value::Ascii(ref lines) = field.value else {
        return None;
    };
    let raw = lines.first()?;
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    Utc.with_ymd_and_hms(
        i32::from(dt.year),
        u32::from(dt.month),
        u32::from(dt.day),
        u32::from(dt.hour),
        u32::from(dt.minute),
        u32::from(dt.second),
    )
    .single()
    .map(|stamp| stamp.timestamp())
}

/// One GPS axis: rational DMS triple plus its hemisphere letter.
fn axis(exif: &exif::Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let triple = rational_triple(exif.get_field(value_tag, In::PRIMARY)?)?;
    let hemisphere = ascii_letter(exif.get_field(ref_tag, In::PRIMARY)?)?;
    Some(dms_to_decimal(triple.0, triple.1, triple.2, hemisphere))
}

fn altitude(exif: &exif::Exif) -> Option<f64> {
    let field = exif.get_field(Tag::GPSAltitude, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    let meters = parts.first()?.to_f64();
    let below_sea_level = matches!(
        exif.get_field(Tag::GPSAltitudeRef, In::PRIMARY).map(|f| &f.value),
        Some(Value::Byte(bytes)) if bytes.first() == Some(&1)
    );
    Some(if below_sea_level { -meters } else { meters })
}

fn rational_triple(field: &Field) -> Option<(f64, f64, f64)> {
    match &field.value {
        Value::Rational(parts) if parts.len() == 3 => {
            Some((parts[0].to_f64(), parts[1].to_f64(), parts[2].to_f64()))
        }
        _ => None,
    }
}

fn ascii_letter(field: &Field) -> Option<char> {
    match &field.value {
        Value::Ascii(lines) => lines.first()?.first().map(|b| *b as char),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sidecar_path_appends_suffix() {
        assert_eq!(
            ExifSidecar::sidecar_path(Path::new("/photos/img_001.jpg")),
            PathBuf::from("/photos/img_001.jpg.gps.json")
        );
    }

    #[test]
    fn write_then_read_prefers_sidecar() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("img.jpg");
        fs::write(&photo, b"not really a jpeg").unwrap();

        let adapter = ExifSidecar::new(true);
        let gps = GpsWrite::from_decimal(48.5, -123.4, Some(120.0)).unwrap();
        adapter.write(&photo, &gps).unwrap();

        let metadata = adapter.read(&photo).unwrap();
        assert!((metadata.latitude.unwrap() - 48.5).abs() < 1e-7);
        assert!((metadata.longitude.unwrap() - -123.4).abs() < 1e-7);
        assert!((metadata.elevation.unwrap() - 120.0).abs() < 1e-4);
        // the fake image carries no EXIF, so no capture time either
        assert!(metadata.capture_timestamp.is_none());
    }

    #[test]
    fn elevation_can_be_left_out_of_writes() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("img.jpg");
        fs::write(&photo, b"not really a jpeg").unwrap();

        let adapter = ExifSidecar::new(false);
        let gps = GpsWrite::from_decimal(48.5, -123.4, Some(120.0)).unwrap();
        adapter.write(&photo, &gps).unwrap();

        let metadata = adapter.read(&photo).unwrap();
        assert!(metadata.elevation.is_none());
    }

    #[test]
    fn file_without_exif_or_sidecar_is_not_a_photo() {
        let dir = TempDir::new().unwrap();
        let not_photo = dir.path().join("notes.txt");
        fs::write(&not_photo, b"plain text").unwrap();

        let adapter = ExifSidecar::new(true);
        assert!(matches!(
            adapter.read(&not_photo),
            Err(PhototagError::MissingMetadata { .. })
        ));
    }
}
