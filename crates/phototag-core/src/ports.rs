//! Interfaces to collaborators the core does not implement itself.

use std::path::Path;

use crate::error::Result;
use crate::models::{GpsWrite, PhotoMetadata};

/// Reads and writes photo metadata on behalf of the store.
///
/// The core never touches image files directly; an adapter implements
/// this trait against whatever metadata backend the host uses.
pub trait PhotoMetadataSource {
    /// Read capture time and any existing GPS data for a photo.
    fn read(&self, path: &Path) -> Result<PhotoMetadata>;

    /// Persist a complete GPS block for a photo.
    fn write(&self, path: &Path, gps: &GpsWrite) -> Result<()>;
}
