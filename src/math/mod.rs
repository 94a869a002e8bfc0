pub mod aabb;
pub mod bezier;
pub mod polygon_2d;

pub use aabb::Aabb;
pub use bezier::QuadraticBezier;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns whether two 2D points coincide within [`TOLERANCE`].
#[must_use]
pub fn same_point_2d(a: &Point2, b: &Point2) -> bool {
    (a - b).norm() < TOLERANCE
}

/// Returns whether two 3D points coincide within [`TOLERANCE`].
#[must_use]
pub fn same_point(a: &Point3, b: &Point3) -> bool {
    (a - b).norm() < TOLERANCE
}

/// 2D cross product (z component of the 3D cross product).
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}
