pub mod entity;

pub use entity::{Carrier, EntityData, EntityId};

use std::collections::BTreeSet;

use slotmap::SlotMap;

use crate::error::TopologyError;
use crate::math::{same_point, Aabb, Point3};

/// Grid used to quantize sort keys, so that round-off never reorders
/// entities that share a corner.
const ORDER_RESOLUTION: f64 = 1e-6;

/// Central arena that owns all topological entities of one geometry.
///
/// Entities reference each other via typed IDs (generational indices), so
/// splitting and merging only rewrites boundary lists.
#[derive(Debug, Default, Clone)]
pub struct TopologyStore {
    entities: SlotMap<EntityId, EntityData>,
}

impl TopologyStore {
    /// Creates a new, empty topology store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity and returns its ID.
    pub fn add(&mut self, data: EntityData) -> EntityId {
        self.entities.insert(data)
    }

    /// Returns a reference to the entity data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn entity(&self, id: EntityId) -> Result<&EntityData, TopologyError> {
        self.entities
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound(format!("{id:?}")))
    }

    /// Returns a mutable reference to the entity data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut EntityData, TopologyError> {
        self.entities
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound(format!("{id:?}")))
    }

    /// Removes an entity. References to it in boundary lists are left alone.
    pub fn remove(&mut self, id: EntityId) -> Option<EntityData> {
        self.entities.remove(id)
    }

    /// IDs of all entities of raw dimension `dim`, in insertion order.
    #[must_use]
    pub fn ids(&self, dim: u8) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.dim == dim)
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of entities of raw dimension `dim`.
    #[must_use]
    pub fn count(&self, dim: u8) -> usize {
        self.entities.values().filter(|e| e.dim == dim).count()
    }

    /// Returns the vertex at `point`, if one exists.
    #[must_use]
    pub fn find_vertex(&self, point: &Point3) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, e)| e.point().is_some_and(|p| same_point(&p, point)))
            .map(|(id, _)| id)
    }

    /// Returns the vertex at `point`, inserting it if needed.
    pub fn vertex_at(&mut self, point: Point3) -> EntityId {
        match self.find_vertex(&point) {
            Some(id) => id,
            None => self.add(EntityData::vertex(point)),
        }
    }

    /// Finds an entity of dimension `dim` with exactly this boundary whose
    /// samples coincide with `samples`.
    #[must_use]
    pub fn find_matching(&self, dim: u8, boundary: &[EntityId], samples: &[Point3]) -> Option<EntityId> {
        let wanted: BTreeSet<_> = boundary.iter().copied().collect();
        self.entities
            .iter()
            .find(|(_, e)| {
                e.dim == dim
                    && e.boundary.iter().copied().collect::<BTreeSet<_>>() == wanted
                    && same_samples(&e.samples, samples)
            })
            .map(|(id, _)| id)
    }

    /// Entities whose boundary lists reference `id`.
    #[must_use]
    pub fn parents(&self, id: EntityId) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.boundary.contains(&id))
            .map(|(pid, _)| pid)
            .collect()
    }

    /// Replaces `old` by `new` in every boundary list.
    pub fn replace(&mut self, old: EntityId, new: &[EntityId]) {
        for entity in self.entities.values_mut() {
            if let Some(pos) = entity.boundary.iter().position(|&b| b == old) {
                entity.boundary.remove(pos);
                let fresh: Vec<_> = new
                    .iter()
                    .copied()
                    .filter(|n| !entity.boundary.contains(n))
                    .collect();
                entity.boundary.splice(pos..pos, fresh);
            }
        }
    }

    /// The entity itself and every entity reachable through boundary lists.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    pub fn closure(&self, id: EntityId) -> Result<BTreeSet<EntityId>, TopologyError> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if seen.insert(current) {
                stack.extend(self.entity(current)?.boundary.iter().copied());
            }
        }
        Ok(seen)
    }

    /// Positions of all vertices in the closure of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    pub fn vertices(&self, id: EntityId) -> Result<Vec<Point3>, TopologyError> {
        let mut points = Vec::new();
        for member in self.closure(id)? {
            if let Some(p) = self.entity(member)?.point() {
                points.push(p);
            }
        }
        Ok(points)
    }

    /// All sample points in the closure of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    pub fn samples(&self, id: EntityId) -> Result<Vec<Point3>, TopologyError> {
        let mut points = Vec::new();
        for member in self.closure(id)? {
            points.extend_from_slice(&self.entity(member)?.samples);
        }
        Ok(points)
    }

    /// Bounding box of the entity and everything bounding it.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing or has no samples.
    pub fn bbox(&self, id: EntityId) -> Result<Aabb, TopologyError> {
        Aabb::from_points(&self.samples(id)?)
            .ok_or_else(|| TopologyError::EntityNotFound(format!("samples of {id:?}")))
    }

    /// Entities of dimension `dim` in reporting order: by lowest corner
    /// (x, then y, then z), ties broken by highest corner.
    ///
    /// Entity number `n` is `numbered(dim)[n - 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    pub fn numbered(&self, dim: u8) -> Result<Vec<EntityId>, TopologyError> {
        let mut keyed = self
            .ids(dim)
            .into_iter()
            .map(|id| Ok((order_key(&self.bbox(id)?), id)))
            .collect::<Result<Vec<_>, TopologyError>>()?;
        keyed.sort_by_key(|(key, _)| *key);
        Ok(keyed.into_iter().map(|(_, id)| id).collect())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn order_key(bbox: &Aabb) -> [i64; 6] {
    let q = |v: f64| (v / ORDER_RESOLUTION).round() as i64;
    [
        q(bbox.min.x),
        q(bbox.min.y),
        q(bbox.min.z),
        q(bbox.max.x),
        q(bbox.max.y),
        q(bbox.max.z),
    ]
}

fn same_samples(a: &[Point3], b: &[Point3]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).all(|(p, q)| same_point(p, q)) || a.iter().rev().zip(b).all(|(p, q)| same_point(p, q))
}
