use std::collections::BTreeSet;

use serde::Serialize;

use super::{EntitySource, SELECTION_TOLERANCE};
use crate::error::{ParameterError, SelectionError};
use crate::geometry::{RegionEntry, RegionTable};
use crate::math::{Aabb, Point3};
use crate::params::{Expr, ParameterTable};

/// When an entity counts as inside a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    /// The entity and everything bounding it lie in the box.
    Inside,
    /// At least one vertex of the entity lies in the box.
    SomeVertex,
}

/// Axis-aligned box over parameter expressions.
///
/// The `z` range is present exactly when the box lives in a 3D scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxBounds {
    pub x: [Expr; 2],
    pub y: [Expr; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<[Expr; 2]>,
}

impl BoxBounds {
    #[must_use]
    pub fn planar(x: [Expr; 2], y: [Expr; 2]) -> Self {
        Self { x, y, z: None }
    }

    #[must_use]
    pub fn spatial(x: [Expr; 2], y: [Expr; 2], z: [Expr; 2]) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Number of axes the box constrains.
    #[must_use]
    pub fn axes(&self) -> usize {
        if self.z.is_some() {
            3
        } else {
            2
        }
    }

    /// Evaluates the bounds; a planar box lies in `z = 0`.
    ///
    /// # Errors
    ///
    /// Returns an error if an expression references an unknown parameter.
    pub fn evaluate(&self, table: &ParameterTable) -> Result<Aabb, ParameterError> {
        let pair = |r: &[Expr; 2]| -> Result<(f64, f64), ParameterError> { Ok((r[0].eval(table)?, r[1].eval(table)?)) };
        let (x0, x1) = pair(&self.x)?;
        let (y0, y1) = pair(&self.y)?;
        let (z0, z1) = match &self.z {
            Some(z) => pair(z)?,
            None => (0.0, 0.0),
        };
        Ok(Aabb::new(Point3::new(x0, y0, z0), Point3::new(x1, y1, z1)))
    }
}

/// A box predicate tagging the entities of one named region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionPredicate {
    pub region: String,
    pub entry: RegionEntry,
    pub bounds: BoxBounds,
    pub condition: Condition,
}

impl RegionPredicate {
    /// Creates a predicate for a registered region.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownRegion`] for an unregistered region and
    /// [`SelectionError::BoxMismatch`] when the box has a `z` range outside a
    /// 3D scope or lacks one inside it.
    pub fn new(
        region: &str,
        regions: &RegionTable,
        bounds: BoxBounds,
        condition: Condition,
    ) -> Result<Self, SelectionError> {
        let entry = regions.resolve(region)?;
        let scope_dim = entry.scope.dimension(regions.model_dimension());
        if bounds.axes() != scope_dim.axes() {
            return Err(SelectionError::BoxMismatch {
                region: region.to_owned(),
                found: bounds.axes(),
                expected: scope_dim.axes(),
                dimension: scope_dim,
            });
        }
        Ok(Self {
            region: region.to_owned(),
            entry,
            bounds,
            condition,
        })
    }

    /// Numbers of the matching entities.
    ///
    /// # Errors
    ///
    /// Returns an error if the box bounds cannot be evaluated.
    pub fn evaluate(&self, table: &ParameterTable, source: &dyn EntitySource) -> Result<BTreeSet<usize>, SelectionError> {
        let bbox = self.bounds.evaluate(table)?;
        Ok(source
            .entities(self.entry.raw_dim)
            .iter()
            .filter(|e| match self.condition {
                Condition::Inside => bbox.contains_box(&e.bbox, SELECTION_TOLERANCE),
                Condition::SomeVertex => e.vertices.iter().any(|v| bbox.contains_point(v, SELECTION_TOLERANCE)),
            })
            .map(|e| e.number)
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dimension::{EntityKind, ModelDimension};
    use crate::geometry::Scope;
    use crate::selection::tests::{square_source, table};

    fn regions() -> RegionTable {
        let mut regions = RegionTable::new(ModelDimension::Two);
        regions.insert("left", Scope::Model, EntityKind::Boundary).unwrap();
        regions.insert("corner", Scope::Model, EntityKind::Domain).unwrap();
        regions
    }

    #[test]
    fn inside_matches_whole_entities_only() {
        let p = RegionPredicate::new(
            "left",
            &regions(),
            BoxBounds::planar([0.0.into(), 0.0.into()], [(-1.0).into(), 0.0.into()]),
            Condition::Inside,
        )
        .unwrap();
        let hits = p.evaluate(&table(), &square_source()).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn some_vertex_matches_on_a_corner() {
        let p = RegionPredicate::new(
            "corner",
            &regions(),
            BoxBounds::planar([1.0.into(), 1.0.into()], [0.0.into(), 0.0.into()]),
            Condition::SomeVertex,
        )
        .unwrap();
        assert_eq!(p.evaluate(&table(), &square_source()).unwrap().len(), 1);
    }

    #[test]
    fn box_axes_must_match_the_scope() {
        let err = RegionPredicate::new(
            "left",
            &regions(),
            BoxBounds::spatial([0.0.into(), 0.0.into()], [0.0.into(), 1.0.into()], [0.0.into(), 1.0.into()]),
            Condition::Inside,
        )
        .unwrap_err();
        assert!(matches!(err, SelectionError::BoxMismatch { found: 3, expected: 2, .. }));
    }

    #[test]
    fn unknown_parameter_in_bounds() {
        let p = RegionPredicate::new(
            "left",
            &regions(),
            BoxBounds::planar(["no_such".into(), 0.0.into()], [0.0.into(), 0.0.into()]),
            Condition::Inside,
        )
        .unwrap();
        assert!(matches!(
            p.evaluate(&table(), &square_source()),
            Err(SelectionError::Parameter(ParameterError::Undefined(_)))
        ));
    }
}
