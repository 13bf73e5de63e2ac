//! Linear position interpolation between track samples.

use crate::error::{PhototagError, Result};
use crate::models::Fix;
use crate::track::TrackIndex;

/// Estimate where the camera was at `target` (UTC epoch seconds).
///
/// Targets outside the recorded range are clamped to the nearest end of
/// the track. A target landing exactly on a sample returns that sample
/// unchanged. Otherwise latitude, longitude and elevation are each
/// blended linearly between the two neighboring samples, weighted by
/// how close the target is to each.
pub fn interpolate(index: &TrackIndex, target: i64) -> Result<Fix> {
    if index.len() < 2 {
        return Err(PhototagError::InsufficientTrackData);
    }
    // len >= 2 guarantees both ends exist.
    let earliest = index.earliest().ok_or(PhototagError::InsufficientTrackData)?;
    let latest = index.latest().ok_or(PhototagError::InsufficientTrackData)?;
    let clamped = target.clamp(earliest, latest);

    if let Some(point) = index.at(clamped) {
        return Ok(Fix::from(point));
    }

    let before = index
        .at_or_before(clamped)
        .ok_or(PhototagError::InsufficientTrackData)?;
    let after = index
        .at_or_after(clamped)
        .ok_or(PhototagError::InsufficientTrackData)?;

    let span = (after.timestamp - before.timestamp) as f64;
    let hi = (clamped - before.timestamp) as f64 / span;
    let lo = 1.0 - hi;

    Ok(Fix {
        latitude: before.latitude * lo + after.latitude * hi,
        longitude: before.longitude * lo + after.longitude * hi,
        elevation: before.elevation * lo + after.elevation * hi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackPoint;

    fn two_point_track() -> TrackIndex {
        let mut index = TrackIndex::new();
        index.insert(TrackPoint::new(100, 10.0, 20.0, 1000.0));
        index.insert(TrackPoint::new(200, 11.0, 21.0, 1100.0));
        index
    }

    #[test]
    fn exact_match_returns_sample_unchanged() {
        let index = two_point_track();
        let fix = interpolate(&index, 100).unwrap();
        assert_eq!(fix.latitude, 10.0);
        assert_eq!(fix.longitude, 20.0);
        assert_eq!(fix.elevation, 1000.0);
    }

    #[test]
    fn midpoint_blends_evenly() {
        let index = two_point_track();
        let fix = interpolate(&index, 150).unwrap();
        assert!((fix.latitude - 10.5).abs() < 1e-12);
        assert!((fix.longitude - 20.5).abs() < 1e-12);
        assert!((fix.elevation - 1050.0).abs() < 1e-9);
    }

    #[test]
    fn quarter_point_weights_toward_nearer_sample() {
        let index = two_point_track();
        let fix = interpolate(&index, 125).unwrap();
        assert!((fix.latitude - 10.25).abs() < 1e-12);
        assert!((fix.longitude - 20.25).abs() < 1e-12);
    }

    #[test]
    fn targets_outside_range_clamp_to_track_ends() {
        let index = two_point_track();
        let before = interpolate(&index, 50).unwrap();
        assert_eq!(before.latitude, 10.0);
        assert_eq!(before.longitude, 20.0);

        let after = interpolate(&index, 9_999).unwrap();
        assert_eq!(after.latitude, 11.0);
        assert_eq!(after.longitude, 21.0);
    }

    #[test]
    fn fewer_than_two_points_is_an_error() {
        let empty = TrackIndex::new();
        assert!(matches!(
            interpolate(&empty, 100),
            Err(PhototagError::InsufficientTrackData)
        ));

        let mut single = TrackIndex::new();
        single.insert(TrackPoint::new(100, 10.0, 20.0, 0.0));
        assert!(matches!(
            interpolate(&single, 100),
            Err(PhototagError::InsufficientTrackData)
        ));
    }

    #[test]
    fn result_stays_within_sample_bounds() {
        let index = two_point_track();
        for target in (90..=210).step_by(7) {
            let fix = interpolate(&index, target).unwrap();
            assert!((10.0..=11.0).contains(&fix.latitude));
            assert!((20.0..=21.0).contains(&fix.longitude));
        }
    }
}
