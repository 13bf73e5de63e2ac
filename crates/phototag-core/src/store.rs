//! In-memory collection of loaded photos.
//!
//! The store owns every [`PhotoRecord`], applies interpolation results
//! against the shared clock offset, and tracks which records carry
//! unsaved changes. Disk access goes through the
//! [`PhotoMetadataSource`] port; the store itself never opens a photo
//! file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PhototagError, Result};
use crate::models::{valid_coords, GpsWrite, PhotoRecord};
use crate::ports::PhotoMetadataSource;
use crate::track::{interpolate, TrackIndex};

#[derive(Debug, Default)]
pub struct PhotoStore {
    photos: BTreeMap<PathBuf, PhotoRecord>,
    offset: i64,
}

impl PhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a photo from disk. Loading a path that is already present
    /// re-reads it and discards any in-memory changes.
    pub fn load(
        &mut self,
        path: &Path,
        source: &dyn PhotoMetadataSource,
    ) -> Result<&PhotoRecord> {
        let metadata = source.read(path)?;
        let record = self
            .photos
            .entry(path.to_path_buf())
            .and_modify(|record| record.reload(metadata))
            .or_insert_with(|| PhotoRecord::new(path.to_path_buf(), metadata));
        Ok(record)
    }

    /// Seconds added to each capture timestamp before interpolation.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Change the camera clock offset and re-place every automatic
    /// photo against `index`. Returns how many records were updated.
    pub fn set_offset(&mut self, offset: i64, index: &TrackIndex) -> usize {
        self.offset = offset;
        self.apply_all(index)
    }

    /// Interpolate a position for every eligible photo. Manual photos,
    /// photos without a capture time, and an index too small to
    /// interpolate against all leave records untouched.
    pub fn apply_all(&mut self, index: &TrackIndex) -> usize {
        let offset = self.offset;
        let mut updated = 0;
        for record in self.photos.values_mut() {
            if Self::place(record, offset, index) {
                updated += 1;
            }
        }
        updated
    }

    /// Interpolate a position for one photo. `Ok(false)` means the
    /// record was skipped (manual, or no capture time).
    pub fn apply_interpolated(&mut self, path: &Path, index: &TrackIndex) -> Result<bool> {
        let offset = self.offset;
        let record = self.get_mut(path)?;
        if record.manual {
            return Ok(false);
        }
        let Some(stamp) = record.capture_timestamp else {
            return Ok(false);
        };
        let fix = interpolate(index, stamp + offset)?;
        record.set_location(fix);
        Ok(true)
    }

    /// Pin a photo to externally supplied coordinates, bypassing
    /// interpolation. Invalid coordinates are ignored without touching
    /// the record.
    pub fn apply_manual(&mut self, path: &Path, latitude: f64, longitude: f64) -> Result<bool> {
        let record = self.get_mut(path)?;
        if !valid_coords(latitude, longitude) {
            debug!(
                path = %record.path.display(),
                latitude, longitude, "ignoring out-of-bounds manual placement"
            );
            return Ok(false);
        }
        record.latitude = Some(latitude);
        record.longitude = Some(longitude);
        record.elevation = None;
        record.modified = true;
        record.manual = true;
        Ok(true)
    }

    /// Discard in-memory changes for one photo, re-reading it from disk.
    pub fn revert(&mut self, path: &Path, source: &dyn PhotoMetadataSource) -> Result<()> {
        let metadata = source.read(path)?;
        let record = self.get_mut(path)?;
        record.reload(metadata);
        Ok(())
    }

    /// Persist one photo's coordinates through the metadata port and
    /// clear its modified flag.
    pub fn commit(&mut self, path: &Path, source: &dyn PhotoMetadataSource) -> Result<()> {
        let record = self.get_mut(path)?;
        let (Some(lat), Some(lon)) = (record.latitude, record.longitude) else {
            return Err(PhototagError::MissingMetadata {
                path: record.path.clone(),
                reason: "no coordinates to save".to_string(),
            });
        };
        let gps = GpsWrite::from_decimal(lat, lon, record.elevation)?;
        source.write(path, &gps)?;
        record.modified = false;
        Ok(())
    }

    /// Forget a photo entirely, unsaved changes included.
    pub fn close(&mut self, path: &Path) -> Option<PhotoRecord> {
        self.photos.remove(path)
    }

    pub fn get(&self, path: &Path) -> Option<&PhotoRecord> {
        self.photos.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhotoRecord> {
        self.photos.values()
    }

    /// Records with unsaved changes, in path order.
    pub fn modified(&self) -> impl Iterator<Item = &PhotoRecord> {
        self.photos.values().filter(|record| record.modified)
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    fn place(record: &mut PhotoRecord, offset: i64, index: &TrackIndex) -> bool {
        if record.manual {
            return false;
        }
        let Some(stamp) = record.capture_timestamp else {
            return false;
        };
        match interpolate(index, stamp + offset) {
            Ok(fix) => {
                record.set_location(fix);
                true
            }
            Err(PhototagError::InsufficientTrackData) => false,
            // interpolate has no other failure mode
            Err(_) => false,
        }
    }

    fn get_mut(&mut self, path: &Path) -> Result<&mut PhotoRecord> {
        self.photos
            .get_mut(path)
            .ok_or_else(|| PhototagError::PhotoNotLoaded {
                path: path.to_path_buf(),
            })
    }
}
