//! Time-ordered index over loaded track points.

use std::collections::BTreeMap;

use geo::{Coord, Rect};

use crate::formats::TrackSink;
use crate::models::TrackPoint;

/// All track points currently loaded, keyed by UTC epoch timestamp.
///
/// Points from every loaded file share one index; a later point with
/// the same timestamp replaces the earlier one. The bounding box only
/// ever grows until [`clear`](TrackIndex::clear).
#[derive(Debug, Default)]
pub struct TrackIndex {
    points: BTreeMap<i64, TrackPoint>,
    segments: usize,
    bounds: Option<Rect<f64>>,
}

impl TrackIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a point, replacing any existing point at the same second.
    pub fn insert(&mut self, point: TrackPoint) {
        let coord = Coord {
            x: point.longitude,
            y: point.latitude,
        };
        self.bounds = Some(match self.bounds {
            None => Rect::new(coord, coord),
            Some(rect) => Rect::new(
                Coord {
                    x: rect.min().x.min(coord.x),
                    y: rect.min().y.min(coord.y),
                },
                Coord {
                    x: rect.max().x.max(coord.x),
                    y: rect.max().y.max(coord.y),
                },
            ),
        });
        self.points.insert(point.timestamp, point);
    }

    /// Drop every point, segment count and the bounding box.
    pub fn clear(&mut self) {
        self.points.clear();
        self.segments = 0;
        self.bounds = None;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Segment boundaries seen while loading.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Timestamp of the oldest point, if any.
    pub fn earliest(&self) -> Option<i64> {
        self.points.keys().next().copied()
    }

    /// Timestamp of the newest point, if any.
    pub fn latest(&self) -> Option<i64> {
        self.points.keys().next_back().copied()
    }

    /// Point recorded exactly at `timestamp`.
    pub fn at(&self, timestamp: i64) -> Option<&TrackPoint> {
        self.points.get(&timestamp)
    }

    /// Nearest point at or before `timestamp`.
    pub fn at_or_before(&self, timestamp: i64) -> Option<&TrackPoint> {
        self.points.range(..=timestamp).next_back().map(|(_, p)| p)
    }

    /// Nearest point at or after `timestamp`.
    pub fn at_or_after(&self, timestamp: i64) -> Option<&TrackPoint> {
        self.points.range(timestamp..).next().map(|(_, p)| p)
    }

    /// Axis-aligned box covering every point ever inserted since the
    /// last clear, longitude on x and latitude on y.
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackPoint> {
        self.points.values()
    }
}

impl TrackSink for TrackIndex {
    fn segment(&mut self) {
        self.segments += 1;
    }

    fn point(&mut self, point: TrackPoint) {
        self.insert(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(points: &[(i64, f64, f64)]) -> TrackIndex {
        let mut index = TrackIndex::new();
        for &(ts, lat, lon) in points {
            index.insert(TrackPoint::new(ts, lat, lon, 0.0));
        }
        index
    }

    #[test]
    fn ordered_regardless_of_insert_order() {
        let index = index_of(&[(300, 3.0, 3.0), (100, 1.0, 1.0), (200, 2.0, 2.0)]);
        assert_eq!(index.earliest(), Some(100));
        assert_eq!(index.latest(), Some(300));
        let stamps: Vec<i64> = index.iter().map(|p| p.timestamp).collect();
        assert_eq!(stamps, vec![100, 200, 300]);
    }

    #[test]
    fn duplicate_timestamp_last_write_wins() {
        let mut index = index_of(&[(100, 1.0, 1.0)]);
        index.insert(TrackPoint::new(100, 9.0, 9.0, 50.0));
        assert_eq!(index.len(), 1);
        assert_eq!(index.at(100).unwrap().latitude, 9.0);
    }

    #[test]
    fn neighbor_lookup() {
        let index = index_of(&[(100, 1.0, 1.0), (200, 2.0, 2.0)]);
        assert_eq!(index.at_or_before(150).unwrap().timestamp, 100);
        assert_eq!(index.at_or_after(150).unwrap().timestamp, 200);
        assert_eq!(index.at_or_before(100).unwrap().timestamp, 100);
        assert_eq!(index.at_or_after(200).unwrap().timestamp, 200);
        assert!(index.at_or_before(99).is_none());
        assert!(index.at_or_after(201).is_none());
    }

    #[test]
    fn bounding_box_grows_with_points() {
        let mut index = index_of(&[(100, 10.0, 20.0)]);
        let rect = index.bounding_box().unwrap();
        assert_eq!(rect.min(), rect.max());

        index.insert(TrackPoint::new(200, -5.0, 30.0, 0.0));
        let rect = index.bounding_box().unwrap();
        assert_eq!(rect.min().y, -5.0);
        assert_eq!(rect.max().y, 10.0);
        assert_eq!(rect.min().x, 20.0);
        assert_eq!(rect.max().x, 30.0);
    }

    #[test]
    fn clear_resets_everything() {
        let mut index = index_of(&[(100, 1.0, 1.0)]);
        index.segment();
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.segments(), 0);
        assert!(index.bounding_box().is_none());
        assert!(index.earliest().is_none());
    }
}
