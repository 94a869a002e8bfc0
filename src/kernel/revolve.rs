use std::f64::consts::TAU;

use super::profile::{embed_region, Frame, Region, Segment};
use crate::error::GeometryError;
use crate::math::{Point2, Point3, Vector3, TOLERANCE};
use crate::topology::{Carrier, EntityData, EntityId, TopologyStore};

/// Angular steps used to sample revolved edges and faces.
const ANGULAR_SAMPLES: usize = 16;

/// Revolves planar profile regions about the vertical axis `u = 0`.
///
/// The profile lives in the `xz` plane (`(u, v)` maps to `(u, 0, v)`) and
/// turns towards `+y`. A partial revolution produces a start face at the
/// profile and an end face at the final angle; profile vertices on the axis
/// stay single points and profile segments on the axis stay single edges.
pub struct Revolve<'a> {
    regions: &'a [Region],
    angle: f64,
    origin: String,
}

impl<'a> Revolve<'a> {
    /// Creates a new `Revolve` operation; `angle` is in radians.
    #[must_use]
    pub fn new(regions: &'a [Region], angle: f64, origin: impl Into<String>) -> Self {
        Self {
            regions,
            angle,
            origin: origin.into(),
        }
    }

    /// Executes the revolution, creating one solid per region.
    ///
    /// # Errors
    ///
    /// Returns an error if the angle is not in `(0, 2π)` or a region crosses
    /// the axis.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<Vec<EntityId>, GeometryError> {
        if !(self.angle > TOLERANCE && self.angle < TAU - TOLERANCE) {
            return Err(GeometryError::InvalidInput {
                feature: self.origin.clone(),
                reason: format!("revolution angle {} rad must lie strictly between 0 and 2π", self.angle),
            });
        }
        self.regions
            .iter()
            .map(|region| self.revolve_region(store, region))
            .collect()
    }

    fn revolve_region(&self, store: &mut TopologyStore, region: &Region) -> Result<EntityId, GeometryError> {
        if region.outline().iter().any(|p| p.x < -TOLERANCE) {
            return Err(GeometryError::InvalidInput {
                feature: self.origin.clone(),
                reason: "profile crosses the revolution axis".into(),
            });
        }

        let start = Frame::revolved(0.0);
        let end = Frame::revolved(self.angle);
        let (start_face, start_edges) = embed_region(store, region, &start, None)?;
        let (end_face, end_edges) = embed_region(store, region, &end, None)?;

        let mut faces = vec![start_face, end_face];
        for (i, segment) in region.segments().iter().enumerate() {
            // Axis segments map to the same edge at both angles.
            if segment.on_axis() {
                continue;
            }
            let mut boundary = vec![start_edges[i], end_edges[i]];
            for p in [segment.start(), segment.end()] {
                if p.x > TOLERANCE {
                    let circle = self.circle_edge(store, &p);
                    if !boundary.contains(&circle) {
                        boundary.push(circle);
                    }
                }
            }
            let carrier = if segment.is_horizontal() {
                Carrier::plane(Point3::new(0.0, 0.0, segment.start().y), Vector3::z())
            } else {
                Carrier::Curved
            };
            faces.push(store.add(EntityData::new(
                2,
                carrier,
                boundary,
                self.sweep(&segment.samples()),
                self.angle * swept_moment(segment),
            )));
        }

        // Pappus: the swept volume is the angle times the first moment.
        let volume = self.angle * region.first_moment();
        Ok(store.add(EntityData::new(3, Carrier::Volume, faces, Vec::new(), volume).with_origin(self.origin.clone())))
    }

    /// The circular edge traced by profile point `p`.
    fn circle_edge(&self, store: &mut TopologyStore, p: &Point2) -> EntityId {
        let samples = self.sweep(std::slice::from_ref(p));
        let a = store.vertex_at(Frame::revolved(0.0).embed(p));
        let b = store.vertex_at(Frame::revolved(self.angle).embed(p));
        if let Some(existing) = store.find_matching(1, &[a, b], &samples) {
            return existing;
        }
        store.add(EntityData::new(1, Carrier::Curved, vec![a, b], samples, p.x * self.angle))
    }

    /// Profile points at every angular step, start and end angle included.
    #[allow(clippy::cast_precision_loss)]
    fn sweep(&self, points: &[Point2]) -> Vec<Point3> {
        (0..=ANGULAR_SAMPLES)
            .flat_map(|k| {
                let frame = Frame::revolved(self.angle * k as f64 / ANGULAR_SAMPLES as f64);
                points.iter().map(move |p| frame.embed(p))
            })
            .collect()
    }
}

/// `∫ u ds` along the segment, exact for straight pieces.
fn swept_moment(segment: &Segment) -> f64 {
    segment
        .samples()
        .windows(2)
        .map(|w| (w[1] - w[0]).norm() * (w[0].x + w[1].x) / 2.0)
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn quarter_cylinder_topology() {
        let mut store = TopologyStore::new();
        let profile = [Region::rectangle(Point2::new(0.0, -155.0), [17.5, 55.0])];
        let solids = Revolve::new(&profile, FRAC_PI_2, "rev1").execute(&mut store).unwrap();
        assert_eq!(solids.len(), 1);
        let solid = store.entity(solids[0]).unwrap();
        // start, end, floor, wall, roof
        assert_eq!(solid.boundary.len(), 5);
        assert_relative_eq!(solid.measure, FRAC_PI_2 / 2.0 * 17.5 * 17.5 * 55.0, epsilon = 1e-6);
        // two axis points, two start corners, two end corners
        assert_eq!(store.count(0), 6);
        // axis, 3 start edges, 3 end edges, 2 circular edges
        assert_eq!(store.count(1), 9);
    }

    #[test]
    fn wall_area_follows_pappus() {
        let mut store = TopologyStore::new();
        let profile = [Region::rectangle(Point2::new(0.0, -155.0), [17.5, 55.0])];
        Revolve::new(&profile, FRAC_PI_2, "rev1").execute(&mut store).unwrap();
        let wall = store
            .ids(2)
            .into_iter()
            .find(|&f| store.entity(f).unwrap().carrier == Carrier::Curved)
            .unwrap();
        assert_relative_eq!(store.entity(wall).unwrap().measure, FRAC_PI_2 * 17.5 * 55.0, epsilon = 1e-9);
    }

    #[test]
    fn full_turn_is_rejected() {
        let mut store = TopologyStore::new();
        let profile = [Region::rectangle(Point2::new(0.0, 0.0), [1.0, 1.0])];
        assert!(Revolve::new(&profile, TAU, "rev1").execute(&mut store).is_err());
    }

    #[test]
    fn profile_across_the_axis_is_rejected() {
        let mut store = TopologyStore::new();
        let profile = [Region::rectangle(Point2::new(-1.0, 0.0), [2.0, 1.0])];
        assert!(Revolve::new(&profile, FRAC_PI_2, "rev1").execute(&mut store).is_err());
    }
}
