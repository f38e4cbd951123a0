//! Line-segment helpers for map construction
//!
//! Turns outline segments into a cloud of evenly spaced collision points.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Most points a single segment may resample into
pub const MAX_POINTS_PER_SEGMENT: usize = 10_000;

/// A straight wall edge in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

impl Segment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }

    /// Same edge regardless of endpoint order
    pub fn same_edge(&self, other: &Segment) -> bool {
        (self.start == other.start && self.end == other.end)
            || (self.start == other.end && self.end == other.start)
    }

    /// Move from drawing space (y down) into world space (y up)
    pub fn to_world(&self, origin: Vec2) -> Segment {
        let flip = |p: Vec2| Vec2::new(p.x + origin.x, -p.y + origin.y);
        Segment::new(flip(self.start), flip(self.end))
    }

    /// Number of points `resample(gap)` yields
    ///
    /// `None` when the length is not finite or the count would exceed
    /// `MAX_POINTS_PER_SEGMENT`.
    pub fn sample_count(&self, gap: f32) -> Option<usize> {
        let length = self.length();
        if !length.is_finite() {
            return None;
        }
        if length <= 0.0 || gap <= 0.0 {
            return Some(1);
        }
        let steps = (length / gap).floor();
        if !(steps < MAX_POINTS_PER_SEGMENT as f32) {
            return None;
        }
        Some(steps as usize + 1)
    }

    /// Points every `gap` units from `start`, start inclusive
    ///
    /// A segment of length `L` yields `floor(L / gap) + 1` points; a
    /// zero-length segment yields its start point alone. Segments that
    /// `sample_count` rejects yield nothing.
    pub fn resample(&self, gap: f32) -> Vec<Vec2> {
        let Some(count) = self.sample_count(gap) else {
            return Vec::new();
        };
        if count == 1 {
            return vec![self.start];
        }

        let dir = (self.end - self.start) / self.length();
        (0..count)
            .map(|k| self.start + dir * (k as f32 * gap))
            .collect()
    }
}

/// Keep the first occurrence of every edge, ignoring endpoint order
pub fn dedup_segments(segments: &[Segment]) -> Vec<Segment> {
    let mut unique: Vec<Segment> = Vec::with_capacity(segments.len());
    for seg in segments {
        if !unique.iter().any(|u| u.same_edge(seg)) {
            unique.push(*seg);
        }
    }
    unique
}

/// Resample every segment and concatenate, preserving segment order
pub fn resample_all(segments: &[Segment], gap: f32) -> Vec<Vec2> {
    segments.iter().flat_map(|s| s.resample(gap)).collect()
}

/// Drop points that sit within `min_distance` (per axis) of an earlier point
///
/// Tolerance-based and order-dependent: a point survives only if no point
/// before it in the input is that close. Not a clustering.
pub fn merge_close(points: &[Vec2], min_distance: f32) -> Vec<Vec2> {
    points
        .iter()
        .enumerate()
        .filter(|&(i, p)| {
            !points[..i].iter().any(|q| {
                (q.x - p.x).abs() < min_distance && (q.y - p.y).abs() < min_distance
            })
        })
        .map(|(_, p)| *p)
        .collect()
}

/// Nudge every point by up to `amount / 2` per axis
pub fn jitter_points<R: Rng>(points: &mut [Vec2], amount: f32, rng: &mut R) {
    for p in points.iter_mut() {
        p.x += amount * (rng.random::<f32>() - 0.5);
        p.y += amount * (rng.random::<f32>() - 0.5);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_resample_horizontal() {
        let seg = Segment::new(Vec2::ZERO, Vec2::new(2.2, 0.0));
        let pts = seg.resample(0.5);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], Vec2::ZERO);
        assert!((pts[4].x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_resample_zero_length() {
        let seg = Segment::new(Vec2::new(3.0, 4.0), Vec2::new(3.0, 4.0));
        assert_eq!(seg.resample(0.5), vec![Vec2::new(3.0, 4.0)]);
    }

    #[test]
    fn test_resample_rejects_unbounded_segments() {
        // Endpoints are finite but the length overflows
        let huge = Segment::new(Vec2::new(-3.0e38, 0.0), Vec2::new(3.0e38, 0.0));
        assert_eq!(huge.sample_count(0.5), None);
        assert!(huge.resample(0.5).is_empty());

        let long = Segment::new(Vec2::ZERO, Vec2::new(1.0e6, 0.0));
        assert_eq!(long.sample_count(0.5), None);
        assert!(long.resample(0.5).is_empty());

        let nan_gap = Segment::new(Vec2::ZERO, Vec2::new(1.0, 0.0));
        assert_eq!(nan_gap.sample_count(f32::NAN), None);
    }

    #[test]
    fn test_sample_count_at_the_cap() {
        let gap = 1.0;
        let under = Segment::new(Vec2::ZERO, Vec2::new((MAX_POINTS_PER_SEGMENT - 1) as f32, 0.0));
        assert_eq!(under.sample_count(gap), Some(MAX_POINTS_PER_SEGMENT));
        assert_eq!(under.resample(gap).len(), MAX_POINTS_PER_SEGMENT);

        let over = Segment::new(Vec2::ZERO, Vec2::new(MAX_POINTS_PER_SEGMENT as f32, 0.0));
        assert_eq!(over.sample_count(gap), None);
    }

    #[test]
    fn test_to_world_flips_y() {
        let seg = Segment::new(Vec2::new(10.0, 20.0), Vec2::new(30.0, 40.0));
        let world = seg.to_world(Vec2::new(-120.0, 230.0));
        assert_eq!(world.start, Vec2::new(-110.0, 210.0));
        assert_eq!(world.end, Vec2::new(-90.0, 190.0));
    }

    #[test]
    fn test_dedup_ignores_endpoint_order() {
        let a = Segment::new(Vec2::ZERO, Vec2::X);
        let b = Segment::new(Vec2::X, Vec2::ZERO);
        let c = Segment::new(Vec2::ZERO, Vec2::Y);
        let unique = dedup_segments(&[a, b, c, a]);
        assert_eq!(unique, vec![a, c]);
    }

    #[test]
    fn test_merge_is_per_axis_and_first_seen() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.2, 0.2),  // within 0.3 on both axes of the first
            Vec2::new(0.2, 0.6),  // far enough on y
            Vec2::new(0.25, 0.0), // close to the first
        ];
        let merged = merge_close(&points, 0.3);
        assert_eq!(merged, vec![Vec2::new(0.0, 0.0), Vec2::new(0.2, 0.6)]);

        // Euclidean distance 0.396, but both axes are under the tolerance
        let merged = merge_close(&[Vec2::ZERO, Vec2::new(0.28, 0.28)], 0.3);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_jitter_is_bounded_and_seeded() {
        let mut a = vec![Vec2::ZERO; 50];
        let mut b = a.clone();
        jitter_points(&mut a, 0.2, &mut Pcg32::seed_from_u64(1));
        jitter_points(&mut b, 0.2, &mut Pcg32::seed_from_u64(1));
        assert_eq!(a, b);
        assert!(a.iter().all(|p| p.x.abs() <= 0.1 && p.y.abs() <= 0.1));
    }

    proptest! {
        #[test]
        fn prop_resample_count(
            x1 in -100.0f32..100.0,
            y1 in -100.0f32..100.0,
            dx in -50.0f32..50.0,
            dy in -50.0f32..50.0,
            gap in 0.05f32..5.0,
        ) {
            let seg = Segment::new(Vec2::new(x1, y1), Vec2::new(x1 + dx, y1 + dy));
            let length = seg.length();
            let expected = if length > 0.0 { (length / gap).floor() as usize + 1 } else { 1 };
            let pts = seg.resample(gap);
            prop_assert_eq!(pts.len(), expected);
            prop_assert_eq!(pts[0], seg.start);
            // Never overshoots the far end
            for p in &pts {
                prop_assert!((*p - seg.start).length() <= length + 1e-3);
            }
        }

        #[test]
        fn prop_merge_leaves_no_close_pairs(
            raw in proptest::collection::vec((-5.0f32..5.0, -5.0f32..5.0), 0..60),
            d in 0.0f32..1.0,
        ) {
            let points: Vec<Vec2> = raw.into_iter().map(|(x, y)| Vec2::new(x, y)).collect();
            let merged = merge_close(&points, d);
            prop_assert!(merged.len() <= points.len());
            for (i, p) in merged.iter().enumerate() {
                for q in &merged[..i] {
                    prop_assert!(!((q.x - p.x).abs() < d && (q.y - p.y).abs() < d));
                }
            }
        }
    }
}
