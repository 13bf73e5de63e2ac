//! KML `gx:Track` reader.
//!
//! Inside a `gx:Track` the `when` timestamps and `gx:coord` positions are
//! siblings rather than nested, so the two arrive as parallel streams.
//! They are buffered in FIFO queues and paired off as soon as both queues
//! hold an entry. Entries still unpaired at end of document are reported,
//! never silently dropped.

use std::collections::VecDeque;
use std::io::BufRead;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quick_xml::Reader;

use crate::error::Result;
use crate::formats::xml::{parse_stream, ElementCapture, ElementWatcher, ProgressFn};
use crate::formats::{ParseSummary, TrackSink};
use crate::models::TrackPoint;

pub const ROOT: &str = "kml";

/// Parse a KML document from a buffered reader, emitting segments and
/// points into `sink`.
pub fn read<R: BufRead>(
    input: R,
    sink: &mut dyn TrackSink,
    progress: Option<ProgressFn<'_>>,
) -> Result<ParseSummary> {
    let mut watcher = KmlWatcher {
        sink,
        summary: ParseSummary::default(),
        whens: VecDeque::new(),
        coords: VecDeque::new(),
    };
    parse_stream(Reader::from_reader(input), &mut watcher, progress)?;

    let unpaired = watcher.whens.len() + watcher.coords.len();
    if unpaired > 0 {
        tracing::warn!(
            whens = watcher.whens.len(),
            coords = watcher.coords.len(),
            "KML track ended with unpaired when/gx:coord entries"
        );
    }
    let mut summary = watcher.summary;
    summary.unpaired = unpaired;
    Ok(summary)
}

struct KmlWatcher<'a> {
    sink: &'a mut dyn TrackSink,
    summary: ParseSummary,
    whens: VecDeque<i64>,
    coords: VecDeque<(f64, f64, f64)>,
}

impl KmlWatcher<'_> {
    /// Drain as many complete (when, coord) pairs as both queues hold.
    fn drain_pairs(&mut self) {
        while !self.whens.is_empty() && !self.coords.is_empty() {
            if let (Some(timestamp), Some((lon, lat, ele))) =
                (self.whens.pop_front(), self.coords.pop_front())
            {
                self.summary.points += 1;
                self.sink.point(TrackPoint::new(timestamp, lat, lon, ele));
            }
        }
    }
}

impl ElementWatcher for KmlWatcher<'_> {
    fn root(&self) -> &'static str {
        ROOT
    }

    fn watched(&self, name: &str) -> bool {
        matches!(name, "gx:Track" | "when" | "gx:coord")
    }

    fn begin(&mut self, name: &str) -> bool {
        if name == "gx:Track" {
            self.summary.segments += 1;
            self.sink.segment();
            return false;
        }
        matches!(name, "when" | "gx:coord")
    }

    fn complete(&mut self, name: &str, capture: ElementCapture) -> Result<()> {
        match name {
            "when" => match capture.text("when").and_then(parse_when) {
                Some(timestamp) => self.whens.push_back(timestamp),
                None => {
                    self.summary.skipped += 1;
                    tracing::warn!(
                        when = capture.text("when").unwrap_or("?"),
                        "dropping unparsable when timestamp"
                    );
                }
            },
            "gx:coord" => match capture.text("gx:coord").and_then(parse_coord) {
                Some(triple) => self.coords.push_back(triple),
                None => {
                    self.summary.skipped += 1;
                    tracing::warn!(
                        coord = capture.text("gx:coord").unwrap_or("?"),
                        "dropping unparsable gx:coord triple"
                    );
                }
            },
            _ => return Ok(()),
        }
        self.drain_pairs();
        Ok(())
    }
}

/// KML timestamps are freer-form than GPX; accept RFC 3339 plus the common
/// date and date-time shapes, treating naive values as UTC.
fn parse_when(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Utc).timestamp());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc().timestamp());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
    }
    None
}

/// A `gx:coord` is a whitespace-separated "lon lat elevation" triple; the
/// elevation defaults to 0.0 when only two fields are present.
fn parse_coord(text: &str) -> Option<(f64, f64, f64)> {
    let mut fields = text.split_whitespace();
    let lon: f64 = fields.next()?.parse().ok()?;
    let lat: f64 = fields.next()?.parse().ok()?;
    let ele: f64 = match fields.next() {
        Some(raw) => raw.parse().ok()?,
        None => 0.0,
    };
    if fields.next().is_some() {
        return None;
    }
    Some((lon, lat, ele))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhototagError;
    use crate::formats::RecordingSink;

    const SAMPLE_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx="http://www.google.com/kml/ext/2.2">
  <Document>
    <Placemark>
      <gx:Track>
        <when>2010-10-16T20:09:13Z</when>
        <when>2010-10-16T20:09:21Z</when>
        <gx:coord>-123.39110 48.52431 100.5</gx:coord>
        <gx:coord>-123.39200 48.52450 101</gx:coord>
      </gx:Track>
    </Placemark>
  </Document>
</kml>"#;

    #[test]
    fn pairs_whens_and_coords_in_fifo_order() {
        let mut sink = RecordingSink::default();
        let summary = read(SAMPLE_KML.as_bytes(), &mut sink, None).unwrap();

        assert_eq!(summary.segments, 1);
        assert_eq!(summary.points, 2);
        assert_eq!(summary.unpaired, 0);

        assert_eq!(sink.points[0].timestamp, 1287259753);
        assert_eq!(sink.points[0].latitude, 48.52431);
        assert_eq!(sink.points[0].longitude, -123.39110);
        assert_eq!(sink.points[0].elevation, 100.5);
        assert_eq!(sink.points[1].timestamp, 1287259761);
    }

    #[test]
    fn alternating_siblings_pair_identically() {
        let kml = r#"<kml><Document><gx:Track>
            <when>2010-10-16T20:09:13Z</when>
            <gx:coord>-123.39110 48.52431 100.5</gx:coord>
            <when>2010-10-16T20:09:21Z</when>
            <gx:coord>-123.39200 48.52450 101</gx:coord>
        </gx:Track></Document></kml>"#;

        let mut sink = RecordingSink::default();
        let summary = read(kml.as_bytes(), &mut sink, None).unwrap();
        assert_eq!(summary.points, 2);
        assert_eq!(sink.points[0].latitude, 48.52431);
        assert_eq!(sink.points[1].latitude, 48.52450);
    }

    #[test]
    fn surplus_whens_are_reported_as_unpaired() {
        let kml = r#"<kml><Document><gx:Track>
            <when>2010-10-16T20:09:13Z</when>
            <when>2010-10-16T20:09:21Z</when>
            <gx:coord>-123.39110 48.52431 100.5</gx:coord>
        </gx:Track></Document></kml>"#;

        let mut sink = RecordingSink::default();
        let summary = read(kml.as_bytes(), &mut sink, None).unwrap();
        assert_eq!(summary.points, 1);
        assert_eq!(summary.unpaired, 1);
    }

    #[test]
    fn gpx_document_is_a_format_mismatch() {
        let mut sink = RecordingSink::default();
        let err = read(b"<gpx></gpx>" as &[u8], &mut sink, None).unwrap_err();
        assert!(matches!(
            err,
            PhototagError::FormatMismatch {
                expected: "kml",
                ..
            }
        ));
    }

    #[test]
    fn when_accepts_general_date_strings() {
        assert_eq!(parse_when("2010-10-16T20:09:13Z"), Some(1287259753));
        assert_eq!(parse_when("2010-10-16T20:09:13+00:00"), Some(1287259753));
        assert_eq!(parse_when("2010-10-16 20:09:13"), Some(1287259753));
        assert_eq!(parse_when("2010-10-16"), Some(1287187200));
        assert_eq!(parse_when("yesterday-ish"), None);
    }

    #[test]
    fn coord_requires_lon_lat() {
        assert_eq!(parse_coord("-123.5 48.5 10"), Some((-123.5, 48.5, 10.0)));
        assert_eq!(parse_coord("-123.5 48.5"), Some((-123.5, 48.5, 0.0)));
        assert_eq!(parse_coord("-123.5"), None);
        assert_eq!(parse_coord("a b c"), None);
    }
}
