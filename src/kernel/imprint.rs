use std::collections::BTreeSet;

use crate::error::{GeometryError, TopologyError};
use crate::math::{same_point, Point3, TOLERANCE};
use crate::topology::{Carrier, EntityData, EntityId, TopologyStore};

/// Unites a solid with another solid nested inside it.
///
/// The inner solid keeps its entities. The outer solid loses the inner
/// volume: straight outer edges are split where inner vertices lie on them,
/// coincident entities are merged, and outer faces that carry an inner face
/// are notched around it. Inner boundary entities lying on the outer boundary
/// bound only the inner solid afterwards.
pub struct Imprint {
    outer: EntityId,
    inner: EntityId,
}

impl Imprint {
    #[must_use]
    pub fn new(outer: EntityId, inner: EntityId) -> Self {
        Self { outer, inner }
    }

    /// Executes the union in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the solids differ in dimension or the inner solid
    /// is not inside the outer one.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<(), GeometryError> {
        let dim = store.entity(self.outer)?.dim;
        let inner_dim = store.entity(self.inner)?.dim;
        if dim != inner_dim {
            return Err(TopologyError::WrongDimension {
                expected: dim,
                found: inner_dim,
            }
            .into());
        }
        if !store.bbox(self.outer)?.contains_box(&store.bbox(self.inner)?, TOLERANCE) {
            return Err(GeometryError::InvalidInput {
                feature: "union".into(),
                reason: "objects overlap without one containing the other".into(),
            });
        }

        self.split_lines(store)?;
        for k in 1..dim {
            self.merge_coincident(store, k)?;
        }
        self.attach_boundary(store)?;

        let inner_measure = store.entity(self.inner)?.measure;
        store.entity_mut(self.outer)?.measure -= inner_measure;
        Ok(())
    }

    /// Splits straight outer edges at inner vertices lying inside them.
    fn split_lines(&self, store: &mut TopologyStore) -> Result<(), GeometryError> {
        loop {
            let vertices = of_dim(store, self.inner, 0)?;
            let lines = of_dim(store, self.outer, 1)?;
            let mut hit = None;
            'search: for &edge in &lines {
                let data = store.entity(edge)?;
                if !matches!(data.carrier, Carrier::Line { .. }) {
                    continue;
                }
                let (a, b) = endpoints(store, data)?;
                for &v in &vertices {
                    let Some(p) = store.entity(v)?.point() else { continue };
                    if strictly_between(&p, &a, &b) {
                        hit = Some((edge, v));
                        break 'search;
                    }
                }
            }
            let Some((edge, v)) = hit else { return Ok(()) };
            split_edge(store, edge, v)?;
        }
    }

    /// Replaces outer entities of dimension `k` by identical inner ones.
    fn merge_coincident(&self, store: &mut TopologyStore, k: u8) -> Result<(), GeometryError> {
        loop {
            let inner = of_dim(store, self.inner, k)?;
            let outer: Vec<_> = of_dim(store, self.outer, k)?
                .into_iter()
                .filter(|g| !inner.contains(g))
                .collect();
            let mut pair = None;
            'search: for &f in &inner {
                for &g in &outer {
                    if identical(store, f, g)? {
                        pair = Some((f, g));
                        break 'search;
                    }
                }
            }
            let Some((keep, gone)) = pair else { return Ok(()) };
            store.replace(gone, &[keep]);
            store.remove(gone);
        }
    }

    /// Decides, per inner boundary entity, whether it bounds the outer solid.
    fn attach_boundary(&self, store: &mut TopologyStore) -> Result<(), GeometryError> {
        let inner_boundary = store.entity(self.inner)?.boundary.clone();
        for f in inner_boundary {
            let outer_boundary = store.entity(self.outer)?.boundary.clone();
            if outer_boundary.contains(&f) {
                // Shared with the outer boundary: only the inner solid keeps it.
                store.entity_mut(self.outer)?.boundary.retain(|&g| g != f);
                continue;
            }
            let mut host = None;
            for &g in &outer_boundary {
                if lies_on(store, f, g)? {
                    host = Some(g);
                    break;
                }
            }
            match host {
                Some(g) => {
                    let (f_boundary, f_measure) = {
                        let data = store.entity(f)?;
                        (data.boundary.clone(), data.measure)
                    };
                    let host = store.entity_mut(g)?;
                    let shared: Vec<_> = host
                        .boundary
                        .iter()
                        .copied()
                        .filter(|e| f_boundary.contains(e))
                        .collect();
                    host.boundary.retain(|e| !shared.contains(e));
                    host.boundary.extend(f_boundary.into_iter().filter(|e| !shared.contains(e)));
                    host.measure -= f_measure;
                }
                None => store.entity_mut(self.outer)?.boundary.push(f),
            }
        }
        Ok(())
    }
}

fn of_dim(store: &TopologyStore, id: EntityId, dim: u8) -> Result<Vec<EntityId>, TopologyError> {
    let mut out = Vec::new();
    for member in store.closure(id)? {
        if store.entity(member)?.dim == dim {
            out.push(member);
        }
    }
    Ok(out)
}

fn endpoints(store: &TopologyStore, edge: &EntityData) -> Result<(Point3, Point3), TopologyError> {
    let point = |i: usize| -> Result<Point3, TopologyError> {
        let id = edge
            .boundary
            .get(i)
            .copied()
            .ok_or_else(|| TopologyError::EntityNotFound("edge endpoint".into()))?;
        store
            .entity(id)?
            .point()
            .ok_or(TopologyError::WrongDimension { expected: 0, found: 1 })
    };
    Ok((point(0)?, point(1)?))
}

fn strictly_between(p: &Point3, a: &Point3, b: &Point3) -> bool {
    if same_point(p, a) || same_point(p, b) {
        return false;
    }
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return false;
    }
    let t = (p - a).dot(&d) / len_sq;
    t > 0.0 && t < 1.0 && (p - (a + d * t)).norm() < TOLERANCE
}

fn split_edge(store: &mut TopologyStore, edge: EntityId, at: EntityId) -> Result<(), GeometryError> {
    let data = store.entity(edge)?.clone();
    let (a, b) = endpoints(store, &data)?;
    let p = store
        .entity(at)?
        .point()
        .ok_or(TopologyError::WrongDimension { expected: 0, found: 1 })?;
    let (va, vb) = (data.boundary[0], data.boundary[1]);
    let first = store.add(EntityData::new(1, data.carrier, vec![va, at], vec![a, p], (p - a).norm()));
    let second = store.add(EntityData::new(1, data.carrier, vec![at, vb], vec![p, b], (b - p).norm()));
    store.replace(edge, &[first, second]);
    store.remove(edge);
    Ok(())
}

/// Same boundary and, for faces, the same carrier plane.
fn identical(store: &TopologyStore, f: EntityId, g: EntityId) -> Result<bool, TopologyError> {
    let (fd, gd) = (store.entity(f)?, store.entity(g)?);
    let fb: BTreeSet<_> = fd.boundary.iter().collect();
    let gb: BTreeSet<_> = gd.boundary.iter().collect();
    if fb != gb {
        return Ok(false);
    }
    Ok(match (fd.carrier, gd.carrier) {
        (Carrier::Line { .. }, Carrier::Line { .. }) => true,
        (Carrier::Plane { origin, normal }, Carrier::Plane { normal: other_normal, .. }) => {
            gd.carrier.contains(&origin, TOLERANCE) && normal.cross(&other_normal).norm() < TOLERANCE
        }
        _ => fd.samples.len() == gd.samples.len()
            && fd.samples.iter().zip(&gd.samples).all(|(p, q)| same_point(p, q)),
    })
}

/// Returns whether `f` lies entirely on the flat entity `g`.
fn lies_on(store: &TopologyStore, f: EntityId, g: EntityId) -> Result<bool, TopologyError> {
    let carrier = store.entity(g)?.carrier;
    if !matches!(carrier, Carrier::Line { .. } | Carrier::Plane { .. }) {
        return Ok(false);
    }
    let samples = store.samples(f)?;
    if !samples.iter().all(|p| carrier.contains(p, TOLERANCE * 1e3)) {
        return Ok(false);
    }
    Ok(store.bbox(g)?.contains_box(&store.bbox(f)?, TOLERANCE * 1e3))
}
