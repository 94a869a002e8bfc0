use super::{cross_2d, Point2, Vector2, TOLERANCE};

/// A quadratic Bézier curve in a plane.
///
/// `B(t) = (1-t)^2 p0 + 2t(1-t) p1 + t^2 p2` for `t` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticBezier {
    /// Start point.
    pub p0: Point2,
    /// Control point.
    pub p1: Point2,
    /// End point.
    pub p2: Point2,
}

impl QuadraticBezier {
    /// Creates a curve from its three control points.
    #[must_use]
    pub fn new(p0: Point2, p1: Point2, p2: Point2) -> Self {
        Self { p0, p1, p2 }
    }

    /// Evaluates the curve at parameter `t`.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> Point2 {
        let s = 1.0 - t;
        Point2::from(self.p0.coords * (s * s) + self.p1.coords * (2.0 * s * t) + self.p2.coords * (t * t))
    }

    /// Derivative at parameter `t`.
    #[must_use]
    pub fn derivative(&self, t: f64) -> Vector2 {
        (self.p1 - self.p0) * (2.0 * (1.0 - t)) + (self.p2 - self.p1) * (2.0 * t)
    }

    /// The same curve traversed from `p2` to `p0`.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.p2, self.p1, self.p0)
    }

    /// Returns whether the curve collapses to a point.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        (self.p2 - self.p0).norm() < TOLERANCE && (self.p1 - self.p0).norm() < TOLERANCE
    }

    /// Samples `segments + 1` points at uniform parameter steps, endpoints exact.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sample(&self, segments: usize) -> Vec<Point2> {
        let n = segments.max(1);
        (0..=n)
            .map(|i| match i {
                0 => self.p0,
                i if i == n => self.p2,
                i => self.evaluate(i as f64 / n as f64),
            })
            .collect()
    }

    /// Exact contribution of this curve to a closed loop's signed area,
    /// `1/2 ∮ (x dy - y dx)`.
    #[must_use]
    pub fn area_term(&self) -> f64 {
        let (a, b, c) = (self.p0.coords, self.p1.coords, self.p2.coords);
        (cross_2d(&a, &b) + cross_2d(&b, &c)) / 3.0 + cross_2d(&a, &c) / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn endpoints_are_exact() {
        let arc = QuadraticBezier::new(p(0.0, -100.0), p(17.5, -100.0), p(17.5, -115.0));
        assert_eq!(arc.evaluate(0.0), p(0.0, -100.0));
        assert_eq!(arc.evaluate(1.0), p(17.5, -115.0));
        let pts = arc.sample(16);
        assert_eq!(pts.len(), 17);
        assert_eq!(pts[16], arc.p2);
    }

    #[test]
    fn straight_curve_area_term_matches_chord() {
        let a = p(1.0, 2.0);
        let c = p(5.0, -3.0);
        let mid = Point2::from((a.coords + c.coords) / 2.0);
        let arc = QuadraticBezier::new(a, mid, c);
        assert_relative_eq!(arc.area_term(), cross_2d(&a.coords, &c.coords) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn parabolic_corner_area() {
        // Triangle (0,0),(r,0),(r,-a) minus the parabolic segment leaves r*a/6.
        let (r, a) = (17.5, 15.0);
        let arc = QuadraticBezier::new(p(0.0, 0.0), p(r, 0.0), p(r, -a));
        // Closing the corner region: arc reversed, then (0,0) -> (r,0) -> (r,-a).
        let loop_area = arc.reversed().area_term()
            + cross_2d(&p(0.0, 0.0).coords, &p(r, 0.0).coords) / 2.0
            + cross_2d(&p(r, 0.0).coords, &p(r, -a).coords) / 2.0;
        assert_relative_eq!(loop_area.abs(), r * a / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn derivative_at_start_points_to_control() {
        let arc = QuadraticBezier::new(p(0.0, 0.0), p(2.0, 0.0), p(2.0, -1.0));
        let d = arc.derivative(0.0);
        assert_relative_eq!(d.x, 4.0);
        assert_relative_eq!(d.y, 0.0);
    }
}
