//! Pure geometry helpers: arc-length polyline sampling and the
//! upper-boundary hull
//!
//! Screen coordinates throughout: y grows downward, so "visually upper"
//! means lower y.

use glam::Vec2;
use smallvec::SmallVec;

/// Total length of a polyline
pub fn polyline_length(points: &[Vec2]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Point at fraction `t` (0..=1) of a polyline's arc length
///
/// Degenerate inputs: empty slice returns `None` (callers fall back to the
/// anchor centroid), a single point returns that point, zero total length
/// returns the first point.
pub fn sample_polyline(points: &[Vec2], t: f32) -> Option<Vec2> {
    let (&first, rest) = points.split_first()?;
    if rest.is_empty() {
        return Some(first);
    }

    let mut segment_lengths: SmallVec<[f32; 8]> = SmallVec::new();
    let mut total = 0.0;
    for w in points.windows(2) {
        let len = w[0].distance(w[1]);
        segment_lengths.push(len);
        total += len;
    }
    if total <= 0.0 {
        return Some(first);
    }

    let target = t.clamp(0.0, 1.0) * total;
    let mut walked = 0.0;
    for (i, &len) in segment_lengths.iter().enumerate() {
        if walked + len >= target && len > 0.0 {
            let seg_t = (target - walked) / len;
            return Some(points[i].lerp(points[i + 1], seg_t));
        }
        walked += len;
    }
    points.last().copied()
}

/// Upper-boundary hull of a point cloud via one monotone-chain pass
///
/// Keeps only the chain on the upper-screen (lower-y) side, approximating
/// the ridge of the back of a hand. Points are sorted by x; for each
/// consecutive triple the turn rule pops interior points exactly as the
/// cross-product test dictates for screen coordinates.
pub fn upper_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut sorted: Vec<Vec2> = points.iter().filter(|p| p.is_finite()).copied().collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let mut chain: Vec<Vec2> = Vec::with_capacity(sorted.len());
    for p in sorted {
        while chain.len() >= 2 {
            let b = chain[chain.len() - 1];
            let a = chain[chain.len() - 2];
            let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            if cross <= 0.0 {
                chain.pop();
            } else {
                break;
            }
        }
        chain.push(p);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_endpoints() {
        // t=0 is the first point and t=1 the last, for 2- and 3-point
        // polylines with positive segment lengths
        let two = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        assert_eq!(sample_polyline(&two, 0.0), Some(two[0]));
        assert_eq!(sample_polyline(&two, 1.0), Some(two[1]));

        let three = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 3.0),
            Vec2::new(10.0, 3.0),
        ];
        assert_eq!(sample_polyline(&three, 0.0), Some(three[0]));
        assert_eq!(sample_polyline(&three, 1.0), Some(three[2]));
    }

    #[test]
    fn test_sample_midpoint_by_arc_length() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        assert_eq!(sample_polyline(&points, 0.5), Some(Vec2::new(5.0, 0.0)));

        // Uneven segments: t=0.5 lands inside the longer one
        let uneven = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(10.0, 0.0),
        ];
        assert_eq!(sample_polyline(&uneven, 0.5), Some(Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn test_sample_degenerate_inputs() {
        assert_eq!(sample_polyline(&[], 0.5), None);

        let single = [Vec2::new(3.0, 4.0)];
        assert_eq!(sample_polyline(&single, 0.7), Some(single[0]));

        let collapsed = [Vec2::new(3.0, 4.0), Vec2::new(3.0, 4.0)];
        assert_eq!(sample_polyline(&collapsed, 0.7), Some(collapsed[0]));
    }

    #[test]
    fn test_sample_clamps_t() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        assert_eq!(sample_polyline(&points, -1.0), Some(points[0]));
        assert_eq!(sample_polyline(&points, 2.0), Some(points[1]));
    }

    #[test]
    fn test_upper_hull_keeps_ridge() {
        // A w-shaped cloud: the hull must keep only the visually upper ridge
        let points = [
            Vec2::new(0.0, 50.0),
            Vec2::new(25.0, 10.0),
            Vec2::new(50.0, 60.0),
            Vec2::new(75.0, 10.0),
            Vec2::new(100.0, 50.0),
            Vec2::new(50.0, 90.0), // well below, must be dropped
        ];
        let hull = upper_hull(&points);
        assert!(hull.len() >= 3);
        assert!(!hull.contains(&Vec2::new(50.0, 90.0)));
        // Interior dip at (50, 60) lies below the ridge between the peaks
        assert!(!hull.contains(&Vec2::new(50.0, 60.0)));
        // Endpoints and peaks survive
        assert!(hull.contains(&Vec2::new(25.0, 10.0)));
        assert!(hull.contains(&Vec2::new(75.0, 10.0)));
        // Output stays sorted by x
        for w in hull.windows(2) {
            assert!(w[0].x <= w[1].x);
        }
    }

    #[test]
    fn test_upper_hull_drops_non_finite() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(f32::NAN, 5.0),
            Vec2::new(10.0, 0.0),
        ];
        let hull = upper_hull(&points);
        assert_eq!(hull.len(), 2);
        assert!(hull.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_polyline_length() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 4.0),
            Vec2::new(3.0, 10.0),
        ];
        assert!((polyline_length(&points) - 11.0).abs() < 1e-6);
    }
}
