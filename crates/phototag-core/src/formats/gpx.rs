//! GPX 1.x track reader.
//!
//! Watches `trkseg` (segment boundary) and `trkpt` (the point itself:
//! `lat`/`lon` attributes, nested `time` and `ele` text). A point missing
//! any required field is dropped with a diagnostic and parsing continues.

use std::io::BufRead;

use chrono::{TimeZone, Utc};
use quick_xml::Reader;

use crate::error::Result;
use crate::formats::xml::{parse_stream, ElementCapture, ElementWatcher, ProgressFn};
use crate::formats::{ParseSummary, TrackSink};
use crate::models::TrackPoint;

pub const ROOT: &str = "gpx";

/// Parse a GPX document from a buffered reader, emitting segments and
/// points into `sink`.
pub fn read<R: BufRead>(
    input: R,
    sink: &mut dyn TrackSink,
    progress: Option<ProgressFn<'_>>,
) -> Result<ParseSummary> {
    let mut watcher = GpxWatcher {
        sink,
        summary: ParseSummary::default(),
    };
    parse_stream(Reader::from_reader(input), &mut watcher, progress)?;
    Ok(watcher.summary)
}

struct GpxWatcher<'a> {
    sink: &'a mut dyn TrackSink,
    summary: ParseSummary,
}

impl ElementWatcher for GpxWatcher<'_> {
    fn root(&self) -> &'static str {
        ROOT
    }

    fn watched(&self, name: &str) -> bool {
        matches!(name, "trkseg" | "trkpt")
    }

    fn begin(&mut self, name: &str) -> bool {
        if name == "trkseg" {
            self.summary.segments += 1;
            self.sink.segment();
            return false;
        }
        name == "trkpt"
    }

    fn complete(&mut self, name: &str, capture: ElementCapture) -> Result<()> {
        if name != "trkpt" {
            return Ok(());
        }

        match track_point(&capture) {
            Some(point) => {
                self.summary.points += 1;
                self.sink.point(point);
            }
            None => {
                // Without lat, lon and time the point is useless. Skip it
                // and keep going; one bad sample should not sink the file.
                self.summary.skipped += 1;
                tracing::warn!(
                    lat = capture.attr("lat").unwrap_or("?"),
                    lon = capture.attr("lon").unwrap_or("?"),
                    time = capture.text("time").unwrap_or("?"),
                    "dropping malformed trkpt"
                );
            }
        }
        Ok(())
    }
}

fn track_point(capture: &ElementCapture) -> Option<TrackPoint> {
    let latitude: f64 = capture.attr("lat")?.trim().parse().ok()?;
    let longitude: f64 = capture.attr("lon")?.trim().parse().ok()?;
    let timestamp = parse_utc_timestamp(capture.text("time")?)?;
    let elevation = capture
        .text("ele")
        .and_then(|t| t.trim().parse().ok())
        .unwrap_or(0.0);
    Some(TrackPoint::new(timestamp, latitude, longitude, elevation))
}

/// Parse the GPX flavour of ISO 8601, `YYYY-MM-DDTHH:MM:SSZ`, into epoch
/// seconds by direct field splitting. Timestamps are UTC by the GPX spec,
/// so no timezone handling is needed.
fn parse_utc_timestamp(text: &str) -> Option<i64> {
    let mut fields = [0i64; 6];
    let mut count = 0;
    for part in text.trim().split(['-', ':', 'T', 'Z']) {
        if part.is_empty() {
            continue;
        }
        if count == 6 {
            return None;
        }
        fields[count] = part.parse().ok()?;
        count += 1;
    }
    if count != 6 {
        return None;
    }

    Utc.with_ymd_and_hms(
        i32::try_from(fields[0]).ok()?,
        u32::try_from(fields[1]).ok()?,
        u32::try_from(fields[2]).ok()?,
        u32::try_from(fields[3]).ok()?,
        u32::try_from(fields[4]).ok()?,
        u32::try_from(fields[5]).ok()?,
    )
    .single()
    .map(|time| time.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhototagError;
    use crate::formats::RecordingSink;

    const SAMPLE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk>
    <name>Test Track</name>
    <trkseg>
      <trkpt lat="48.52431" lon="-123.39110">
        <ele>100.5</ele>
        <time>2010-10-16T20:09:13Z</time>
      </trkpt>
      <trkpt lat="48.52450" lon="-123.39200">
        <ele>101</ele>
        <time>2010-10-16T20:09:21Z</time>
      </trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="48.53000" lon="-123.40000">
        <time>2010-10-16T20:12:00Z</time>
      </trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn parses_points_and_segments_in_document_order() {
        let mut sink = RecordingSink::default();
        let summary = read(SAMPLE_GPX.as_bytes(), &mut sink, None).unwrap();

        assert_eq!(summary.segments, 2);
        assert_eq!(summary.points, 3);
        assert_eq!(summary.skipped, 0);
        assert_eq!(sink.segments, 2);
        assert_eq!(sink.points.len(), 3);

        assert_eq!(sink.points[0].timestamp, 1287259753);
        assert_eq!(sink.points[0].latitude, 48.52431);
        assert_eq!(sink.points[0].longitude, -123.39110);
        assert_eq!(sink.points[0].elevation, 100.5);

        // Elevation defaults to 0.0 when absent
        assert_eq!(sink.points[2].elevation, 0.0);
        assert!(sink.points[0].timestamp < sink.points[1].timestamp);
    }

    #[test]
    fn point_without_time_is_skipped_not_fatal() {
        let gpx = r#"<gpx><trk><trkseg>
            <trkpt lat="1.0" lon="2.0"><ele>3</ele></trkpt>
            <trkpt lat="4.0" lon="5.0"><time>2010-10-16T20:09:13Z</time></trkpt>
        </trkseg></trk></gpx>"#;

        let mut sink = RecordingSink::default();
        let summary = read(gpx.as_bytes(), &mut sink, None).unwrap();
        assert_eq!(summary.points, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(sink.points[0].latitude, 4.0);
    }

    #[test]
    fn unparsable_fields_are_skipped() {
        let gpx = r#"<gpx><trk><trkseg>
            <trkpt lat="not-a-number" lon="2.0"><time>2010-10-16T20:09:13Z</time></trkpt>
            <trkpt lat="1.0" lon="2.0"><time>late o'clock</time></trkpt>
        </trkseg></trk></gpx>"#;

        let mut sink = RecordingSink::default();
        let summary = read(gpx.as_bytes(), &mut sink, None).unwrap();
        assert_eq!(summary.points, 0);
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn kml_document_is_a_format_mismatch() {
        let kml = r#"<kml><Document><Placemark/></Document></kml>"#;
        let mut sink = RecordingSink::default();
        let err = read(kml.as_bytes(), &mut sink, None).unwrap_err();
        assert!(matches!(
            err,
            PhototagError::FormatMismatch {
                expected: "gpx",
                ..
            }
        ));
        assert!(sink.points.is_empty());
    }

    #[test]
    fn timestamp_splitting_matches_epoch() {
        assert_eq!(parse_utc_timestamp("2010-10-16T20:09:13Z"), Some(1287259753));
        assert_eq!(parse_utc_timestamp("1970-01-01T00:00:00Z"), Some(0));
        assert_eq!(parse_utc_timestamp("2010-10-16"), None);
        assert_eq!(parse_utc_timestamp("2010-13-40T99:99:99Z"), None);
        // Fractional seconds and explicit offsets are not the GPX profile
        assert_eq!(parse_utc_timestamp("2010-10-16T20:09:13.500Z"), None);
    }
}
