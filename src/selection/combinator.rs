use std::collections::BTreeSet;

use serde::Serialize;

use super::named::SelectionSet;
use super::EntitySource;
use crate::dimension::{EntityKind, ModelDimension};
use crate::error::SelectionError;
use crate::geometry::Scope;

/// Where a cumulative union takes entities from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "from", content = "name", rename_all = "lowercase")]
pub enum UnionSource {
    /// The entities a region predicate tagged.
    Region(String),
    /// The object a geometry feature produced, with its whole boundary.
    Feature(String),
}

/// Cumulative union into a named selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Union {
    pub into: String,
    pub scope: Scope,
    pub sources: Vec<UnionSource>,
}

impl Union {
    #[must_use]
    pub fn new(into: impl Into<String>, scope: Scope, sources: Vec<UnionSource>) -> Self {
        Self {
            into: into.into(),
            scope,
            sources,
        }
    }

    /// Adds every source to the target selection.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::ForwardReference`] for a region that has not
    /// been tagged, or the source's error for a feature without a result.
    pub fn apply(&self, set: &mut SelectionSet, source: &dyn EntitySource) -> Result<(), SelectionError> {
        for from in &self.sources {
            let (label, contribution) = match from {
                UnionSource::Region(name) => {
                    let tagged = set
                        .get(name)
                        .ok_or_else(|| SelectionError::ForwardReference { name: name.clone() })?;
                    (name.as_str(), tagged.sets().clone())
                }
                UnionSource::Feature(tag) => (tag.as_str(), source.feature_result(tag)?),
            };
            let target = set.entry(&self.into);
            for (dim, entities) in contribution {
                target.add(dim, entities, label);
            }
        }
        Ok(())
    }
}

/// `add − subtract` at one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    pub into: String,
    pub add: Vec<String>,
    pub subtract: Vec<String>,
    pub kind: EntityKind,
}

impl Difference {
    #[must_use]
    pub fn new(into: impl Into<String>, add: Vec<String>, subtract: Vec<String>, kind: EntityKind) -> Self {
        Self {
            into: into.into(),
            add,
            subtract,
            kind,
        }
    }

    /// Stores the difference as the target selection.
    ///
    /// # Errors
    ///
    /// Returns an error if an operand is undefined or the kind does not exist
    /// in a scope of `dimension`.
    pub fn apply(&self, set: &mut SelectionSet, dimension: ModelDimension) -> Result<(), SelectionError> {
        let raw = self
            .kind
            .raw_dimension(dimension)
            .ok_or_else(|| SelectionError::DimensionMismatch {
                region: self.into.clone(),
                kind: self.kind,
                dimension,
            })?;
        let gather = |names: &[String]| -> Result<BTreeSet<usize>, SelectionError> {
            let mut out = BTreeSet::new();
            for name in names {
                let named = set
                    .get(name)
                    .ok_or_else(|| SelectionError::ForwardReference { name: name.clone() })?;
                out.extend(named.entities(raw));
            }
            Ok(out)
        };
        let add = gather(&self.add)?;
        let subtract = gather(&self.subtract)?;
        let result: BTreeSet<usize> = add.difference(&subtract).copied().collect();
        set.entry(&self.into).add(raw, result, "difference");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::selection::tests::square_source;

    #[test]
    fn union_collects_regions_and_features() {
        let mut set = SelectionSet::new(ModelDimension::Two);
        set.entry("left").add(1, [1], "box");
        set.entry("right").add(1, [4], "box");
        Union::new(
            "sides",
            Scope::Model,
            vec![UnionSource::Region("left".into()), UnionSource::Region("right".into())],
        )
        .apply(&mut set, &square_source())
        .unwrap();
        assert_eq!(set.get("sides").unwrap().entities(1).collect::<Vec<_>>(), [1, 4]);

        Union::new("whole", Scope::Model, vec![UnionSource::Feature("sq".into())])
            .apply(&mut set, &square_source())
            .unwrap();
        let whole = set.get("whole").unwrap();
        assert_eq!(whole.entities(2).count(), 1);
        assert_eq!(whole.entities(1).count(), 4);
    }

    #[test]
    fn union_of_untagged_region_is_a_forward_reference() {
        let mut set = SelectionSet::new(ModelDimension::Two);
        let err = Union::new("x", Scope::Model, vec![UnionSource::Region("later".into())])
            .apply(&mut set, &square_source())
            .unwrap_err();
        assert!(matches!(err, SelectionError::ForwardReference { name } if name == "later"));
    }

    #[test]
    fn difference_works_at_one_dimension() {
        let mut set = SelectionSet::new(ModelDimension::Two);
        set.entry("cavity").add(1, [1, 2, 3, 4], "feature");
        set.entry("cavity").add(2, [1], "feature");
        set.entry("symmetry").add(1, [1], "box");
        Difference::new("outer", vec!["cavity".into()], vec!["symmetry".into()], EntityKind::Boundary)
            .apply(&mut set, ModelDimension::Two)
            .unwrap();
        let outer = set.get("outer").unwrap();
        assert_eq!(outer.entities(1).collect::<Vec<_>>(), [2, 3, 4]);
        assert_eq!(outer.entities(2).count(), 0);
    }

    #[test]
    fn difference_at_edges_in_2d_is_a_mismatch() {
        let mut set = SelectionSet::new(ModelDimension::Two);
        let err = Difference::new("x", vec![], vec![], EntityKind::Edge)
            .apply(&mut set, ModelDimension::Two)
            .unwrap_err();
        assert!(matches!(err, SelectionError::DimensionMismatch { .. }));
    }
}
