use crate::math::{Point3, Vector3, TOLERANCE};

slotmap::new_key_type! {
    /// Unique identifier for an entity in the topology store.
    pub struct EntityId;
}

/// The geometric carrier an entity lies on.
///
/// Only flat carriers take part in coincidence tests; curved entities are
/// compared by their sample points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Carrier {
    /// A vertex.
    Point,
    /// An infinite line through `origin` along a unit `direction`.
    Line { origin: Point3, direction: Vector3 },
    /// An infinite plane through `origin` with a unit `normal`.
    Plane { origin: Point3, normal: Vector3 },
    /// Any curved carrier (Bézier arc, circle, surface of revolution).
    Curved,
    /// The carrier of a domain, which fills its boundary.
    Volume,
}

impl Carrier {
    /// Line through two points.
    #[must_use]
    pub fn line(a: &Point3, b: &Point3) -> Self {
        let d = b - a;
        let len = d.norm();
        if len < TOLERANCE {
            return Self::Point;
        }
        Self::Line {
            origin: *a,
            direction: d / len,
        }
    }

    /// Plane through `origin` with the given normal.
    #[must_use]
    pub fn plane(origin: Point3, normal: Vector3) -> Self {
        let len = normal.norm();
        if len < TOLERANCE {
            return Self::Curved;
        }
        Self::Plane {
            origin,
            normal: normal / len,
        }
    }

    /// Returns whether `p` lies on the carrier.
    ///
    /// Always `false` for curved carriers and domains.
    #[must_use]
    pub fn contains(&self, p: &Point3, tolerance: f64) -> bool {
        match self {
            Self::Line { origin, direction } => {
                let v = p - origin;
                (v - direction * v.dot(direction)).norm() < tolerance
            }
            Self::Plane { origin, normal } => (p - origin).dot(normal).abs() < tolerance,
            Self::Point | Self::Curved | Self::Volume => false,
        }
    }
}

/// Data associated with a topological entity of any dimension.
///
/// Vertices carry their position as the single sample point. Higher
/// dimensional entities carry samples of their own interior and reference
/// their bounding entities of one dimension lower.
#[derive(Debug, Clone)]
pub struct EntityData {
    /// Raw entity dimension (0 vertex, 1 edge, 2 face, 3 solid).
    pub dim: u8,
    /// The carrier the entity lies on.
    pub carrier: Carrier,
    /// Bounding entities of dimension `dim - 1`.
    pub boundary: Vec<EntityId>,
    /// Sample points used for bounding boxes and coincidence tests.
    pub samples: Vec<Point3>,
    /// Length, area or volume. Zero for vertices.
    pub measure: f64,
    /// Tag of the geometry object this entity was created by.
    pub origin: Option<String>,
}

impl EntityData {
    /// Creates a vertex at the given point.
    #[must_use]
    pub fn vertex(point: Point3) -> Self {
        Self {
            dim: 0,
            carrier: Carrier::Point,
            boundary: Vec::new(),
            samples: vec![point],
            measure: 0.0,
            origin: None,
        }
    }

    /// Creates an entity of dimension `dim` with the given boundary.
    #[must_use]
    pub fn new(dim: u8, carrier: Carrier, boundary: Vec<EntityId>, samples: Vec<Point3>, measure: f64) -> Self {
        Self {
            dim,
            carrier,
            boundary,
            samples,
            measure,
            origin: None,
        }
    }

    /// Sets the originating object tag.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Position of a vertex, `None` for other entities.
    #[must_use]
    pub fn point(&self) -> Option<Point3> {
        (self.dim == 0).then(|| self.samples.first().copied()).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_carrier_contains_collinear_points() {
        let c = Carrier::line(&Point3::new(0.0, 0.0, 0.0), &Point3::new(0.0, 0.0, -250.0));
        assert!(c.contains(&Point3::new(0.0, 0.0, -100.0), 1e-9));
        assert!(c.contains(&Point3::new(0.0, 0.0, 30.0), 1e-9));
        assert!(!c.contains(&Point3::new(1.0, 0.0, -100.0), 1e-9));
    }

    #[test]
    fn plane_carrier_contains_coplanar_points() {
        let c = Carrier::plane(Point3::origin(), Vector3::new(0.0, 2.0, 0.0));
        assert!(c.contains(&Point3::new(17.5, 0.0, -115.0), 1e-9));
        assert!(!c.contains(&Point3::new(17.5, 0.1, -115.0), 1e-9));
    }

    #[test]
    fn degenerate_carriers() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(Carrier::line(&p, &p), Carrier::Point);
        assert_eq!(Carrier::plane(p, Vector3::zeros()), Carrier::Curved);
    }
}
