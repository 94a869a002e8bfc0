use crate::error::GeometryError;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::topology::{Carrier, EntityData, EntityId, TopologyStore};

/// Creates an axis-aligned block solid from its lowest corner and size.
pub struct MakeBlock {
    pos: Point3,
    size: Vector3,
    origin: String,
}

impl MakeBlock {
    /// Creates a new `MakeBlock` operation for object `origin`.
    #[must_use]
    pub fn new(pos: Point3, size: Vector3, origin: impl Into<String>) -> Self {
        Self {
            pos,
            size,
            origin: origin.into(),
        }
    }

    /// Executes the operation, creating the block in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if any side length is not positive.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<EntityId, GeometryError> {
        if self.size.iter().any(|&s| s < TOLERANCE) {
            return Err(GeometryError::InvalidInput {
                feature: self.origin.clone(),
                reason: format!("block size {:?} must be positive", self.size.as_slice()),
            });
        }

        // Corner i has bit 0 set for +x, bit 1 for +y, bit 2 for +z.
        let corner = |i: usize| {
            Point3::new(
                self.pos.x + if i & 1 == 0 { 0.0 } else { self.size.x },
                self.pos.y + if i & 2 == 0 { 0.0 } else { self.size.y },
                self.pos.z + if i & 4 == 0 { 0.0 } else { self.size.z },
            )
        };
        let vertices: Vec<EntityId> = (0..8).map(|i| store.vertex_at(corner(i))).collect();

        // Edges join corners differing in exactly one bit.
        let mut edges = Vec::with_capacity(12);
        for i in 0..8usize {
            for bit in [1usize, 2, 4] {
                let j = i | bit;
                if j != i {
                    let (a, b) = (corner(i), corner(j));
                    let id = store.add(EntityData::new(
                        1,
                        Carrier::line(&a, &b),
                        vec![vertices[i], vertices[j]],
                        vec![a, b],
                        (b - a).norm(),
                    ));
                    edges.push((i, j, id));
                }
            }
        }

        // Each face fixes one bit to 0 or 1.
        let mut faces = Vec::with_capacity(6);
        for (axis, bit) in [1usize, 2, 4].into_iter().enumerate() {
            for high in [false, true] {
                let on_face = |c: usize| (c & bit != 0) == high;
                let boundary: Vec<EntityId> = edges
                    .iter()
                    .filter(|(i, j, _)| on_face(*i) && on_face(*j))
                    .map(|(_, _, id)| *id)
                    .collect();
                let mut normal = Vector3::zeros();
                normal[axis] = if high { 1.0 } else { -1.0 };
                let origin = corner(if high { bit } else { 0 });
                let area: f64 = self.size.iter().enumerate().filter(|(k, _)| *k != axis).map(|(_, s)| s).product();
                faces.push(store.add(EntityData::new(
                    2,
                    Carrier::plane(origin, normal),
                    boundary,
                    Vec::new(),
                    area,
                )));
            }
        }

        let volume = self.size.x * self.size.y * self.size.z;
        Ok(store.add(EntityData::new(3, Carrier::Volume, faces, Vec::new(), volume).with_origin(self.origin.clone())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn block_topology_counts() {
        let mut store = TopologyStore::new();
        let solid = MakeBlock::new(Point3::new(0.0, 0.0, -250.0), Vector3::new(100.0, 100.0, 250.0), "blk1")
            .execute(&mut store)
            .unwrap();
        assert_eq!(store.count(0), 8);
        assert_eq!(store.count(1), 12);
        assert_eq!(store.count(2), 6);
        assert_relative_eq!(store.entity(solid).unwrap().measure, 2.5e6);
        for face in store.ids(2) {
            assert_eq!(store.entity(face).unwrap().boundary.len(), 4);
        }
        let bbox = store.bbox(solid).unwrap();
        assert_relative_eq!(bbox.min.z, -250.0);
        assert_relative_eq!(bbox.max.x, 100.0);
    }

    #[test]
    fn flat_block_is_rejected() {
        let mut store = TopologyStore::new();
        let err = MakeBlock::new(Point3::origin(), Vector3::new(1.0, 0.0, 1.0), "blk1")
            .execute(&mut store)
            .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidInput { .. }));
    }
}
