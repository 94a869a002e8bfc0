use super::{cross_2d, Point2, TOLERANCE};

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += cross_2d(&points[i].coords, &points[j].coords);
    }
    sum * 0.5
}

/// Signed first moment of area about the `x = 0` axis, `∫∫ x dA`.
///
/// Same orientation convention as [`signed_area`]. Dividing by the area gives
/// the centroid's distance from the axis.
#[must_use]
pub fn first_moment_x(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        let (a, b) = (&points[i], &points[j]);
        sum += (a.x + b.x) * cross_2d(&a.coords, &b.coords);
    }
    sum / 6.0
}

/// Returns the parameter of `p` on segment `a`-`b` if it lies on it.
#[must_use]
pub fn point_on_segment(p: &Point2, a: &Point2, b: &Point2) -> Option<f64> {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return None;
    }
    let t = (p - a).dot(&d) / len_sq;
    if !(-TOLERANCE..=1.0 + TOLERANCE).contains(&t) {
        return None;
    }
    let closest = a + d * t;
    ((p - closest).norm() < TOLERANCE).then_some(t.clamp(0.0, 1.0))
}

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(t, u)` with both in `[0, 1]` when the segments meet, endpoints
/// included. Parallel segments only report when they overlap.
#[must_use]
pub fn segment_segment_intersect(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;

    let cross = cross_2d(&da, &db);
    if cross.abs() < TOLERANCE {
        // Collinear overlap, or touching end to end.
        return point_on_segment(b0, a0, a1)
            .map(|t| (t, 0.0))
            .or_else(|| point_on_segment(b1, a0, a1).map(|t| (t, 1.0)))
            .or_else(|| point_on_segment(a0, b0, b1).map(|u| (0.0, u)));
    }

    let dd = b0 - a0;
    let t = cross_2d(&dd, &db) / cross;
    let u = cross_2d(&dd, &da) / cross;

    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        Some((t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Returns whether two open polylines share any point.
#[must_use]
pub fn polylines_touch(a: &[Point2], b: &[Point2]) -> bool {
    a.windows(2).any(|sa| {
        b.windows(2)
            .any(|sb| segment_segment_intersect(&sa[0], &sa[1], &sb[0], &sb[1]).is_some())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn unit_square() -> Vec<Point2> {
        vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]
    }

    #[test]
    fn signed_area_ccw_square() {
        assert!((signed_area(&unit_square()) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = unit_square();
        pts.reverse();
        assert!((signed_area(&pts) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!(signed_area(&[p(0.0, 0.0)]).abs() < TOLERANCE);
        assert!(signed_area(&[]).abs() < TOLERANCE);
    }

    #[test]
    fn first_moment_of_offset_rectangle() {
        // Rectangle x in [2, 4], y in [0, 3]: area 6, centroid x = 3.
        let pts = vec![p(2.0, 0.0), p(4.0, 0.0), p(4.0, 3.0), p(2.0, 3.0)];
        assert!((first_moment_x(&pts) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn point_on_segment_interior_and_outside() {
        let t = point_on_segment(&p(17.5, -115.0), &p(17.5, -155.0), &p(17.5, -100.0)).unwrap();
        assert!((t - 40.0 / 55.0).abs() < 1e-12);
        assert!(point_on_segment(&p(17.6, -115.0), &p(17.5, -155.0), &p(17.5, -100.0)).is_none());
        assert!(point_on_segment(&p(17.5, -99.0), &p(17.5, -155.0), &p(17.5, -100.0)).is_none());
    }

    #[test]
    fn crossing_segments_intersect() {
        let hit = segment_segment_intersect(&p(0.0, 0.0), &p(2.0, 2.0), &p(0.0, 2.0), &p(2.0, 0.0));
        let (t, u) = hit.unwrap();
        assert!((t - 0.5).abs() < TOLERANCE);
        assert!((u - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn shared_endpoint_counts_as_touching() {
        let a = [p(0.0, 0.0), p(1.0, 1.0)];
        let b = [p(1.0, 1.0), p(2.0, 0.0)];
        assert!(polylines_touch(&a, &b));
        let c = [p(3.0, 0.0), p(4.0, 1.0)];
        assert!(!polylines_touch(&a, &c));
    }
}
