//! Track file readers.
//!
//! Both supported formats share the streaming element watcher in
//! [`xml`]; [`gpx`] and [`kml`] layer format-specific extraction on top
//! of it. [`read_track_file`] is the entry point for callers that hold
//! a path rather than an open reader.

pub mod gpx;
pub mod kml;
pub mod xml;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Serialize;

use crate::error::{PhototagError, Result};
use crate::formats::xml::ProgressFn;
use crate::models::TrackPoint;

/// Receives track data as a parser emits it, one sample at a time and
/// in document order.
pub trait TrackSink {
    /// A new track segment has started.
    fn segment(&mut self);

    /// A complete track sample.
    fn point(&mut self, point: TrackPoint);
}

/// Counters accumulated over a single parse.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct ParseSummary {
    /// Samples delivered to the sink.
    pub points: usize,
    /// Segment boundaries seen.
    pub segments: usize,
    /// Entries dropped because a required field was missing or unparsable.
    pub skipped: usize,
    /// KML timestamps or coordinates left without a partner at end of
    /// document. Always zero for GPX.
    pub unpaired: usize,
}

/// Formats understood by [`read_track_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackFormat {
    Gpx,
    Kml,
}

impl TrackFormat {
    pub fn name(self) -> &'static str {
        match self {
            TrackFormat::Gpx => "GPX",
            TrackFormat::Kml => "KML",
        }
    }
}

/// Result of a successful [`read_track_file`] call.
#[derive(Debug, Clone, Copy)]
pub struct LoadedTrack {
    pub format: TrackFormat,
    pub summary: ParseSummary,
}

/// Read a track file from disk, probing formats by root element.
///
/// The file is first parsed as GPX; if the root element does not match,
/// it is reopened and parsed as KML. Any other parse error is returned
/// as-is, so a GPX file that is merely malformed is not misreported as
/// failed KML.
pub fn read_track_file(
    path: &Path,
    sink: &mut dyn TrackSink,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<LoadedTrack> {
    let attempt = {
        let reader = BufReader::new(File::open(path)?);
        gpx::read(
            reader,
            sink,
            progress.as_deref_mut().map(|p| -> &mut dyn FnMut() { p }),
        )
    };
    match attempt {
        Ok(summary) => Ok(LoadedTrack {
            format: TrackFormat::Gpx,
            summary,
        }),
        Err(PhototagError::FormatMismatch { .. }) => {
            let reader = BufReader::new(File::open(path)?);
            let summary = kml::read(reader, sink, progress)?;
            Ok(LoadedTrack {
                format: TrackFormat::Kml,
                summary,
            })
        }
        Err(err) => Err(err),
    }
}

/// Sink that records everything it is given. Test helper.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub segments: usize,
    pub points: Vec<TrackPoint>,
}

#[cfg(test)]
impl TrackSink for RecordingSink {
    fn segment(&mut self) {
        self.segments += 1;
    }

    fn point(&mut self, point: TrackPoint) {
        self.points.push(point);
    }
}
