//! Named entity sets: box predicates over the materialized geometry,
//! cumulative unions and differences, frozen before later stages read them.

pub mod combinator;
pub mod named;
pub mod plan;
pub mod predicate;

pub use combinator::{Difference, Union, UnionSource};
pub use named::{FrozenSelections, NamedSelection, SelectionSet, Target};
pub use plan::{SelectionPlan, SelectionStep};
pub use predicate::{BoxBounds, Condition, RegionPredicate};

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use tracing::debug;

use crate::error::SelectionError;
use crate::geometry::Scope;
use crate::math::{Aabb, Point3};
use crate::params::ParameterTable;

pub const SYMMETRY_BOUNDARY: &str = "symmetry_boundary";
pub const FARAWAY_BOUNDARY: &str = "faraway_boundary";
pub const BOTTOM_BOUNDARY: &str = "bottom_boundary";
pub const CAVITY_BOUNDARY: &str = "cavity_boundary";
pub const STORAGE_OUTER_BOUNDARY: &str = "storage_outer_boundary";

/// Selections later stages may consume.
pub const EXPORTED: [&str; 5] = [
    SYMMETRY_BOUNDARY,
    FARAWAY_BOUNDARY,
    BOTTOM_BOUNDARY,
    CAVITY_BOUNDARY,
    STORAGE_OUTER_BOUNDARY,
];

/// Box tolerance. Coarser than the kernel tolerance so that points produced
/// by trigonometry still land on their planes.
pub const SELECTION_TOLERANCE: f64 = 1e-6;

/// A numbered entity as box predicates see it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityView {
    /// Entity number, starting at 1 per raw dimension.
    pub number: usize,
    pub bbox: Aabb,
    pub vertices: Vec<Point3>,
}

/// Read access to one materialized geometry scope.
pub trait EntitySource: Sync {
    /// Entities of raw dimension `dim` in numbering order.
    fn entities(&self, dim: u8) -> &[EntityView];

    /// Domains created by feature `tag` together with their whole boundary,
    /// per raw dimension.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::NoSelectionResult`] if the feature does not
    /// report its result as a selection.
    fn feature_result(&self, tag: &str) -> Result<BTreeMap<u8, BTreeSet<usize>>, SelectionError>;
}

/// Evaluates the steps of one scope against its materialized geometry.
///
/// All predicates of the scope run in parallel. Their contributions are
/// applied in plan order, then unions and differences run sequentially.
///
/// # Errors
///
/// Returns the first predicate or combinator failure.
pub fn tag(
    plan: &SelectionPlan,
    scope: Scope,
    table: &ParameterTable,
    source: &dyn EntitySource,
) -> Result<SelectionSet, SelectionError> {
    let predicates: Vec<&RegionPredicate> = plan.predicates(scope).collect();
    let tagged = predicates
        .par_iter()
        .map(|p| p.evaluate(table, source))
        .collect::<Result<Vec<_>, _>>()?;

    let dimension = scope.dimension(plan.dimension());
    let mut set = SelectionSet::new(dimension);
    for (predicate, entities) in predicates.iter().zip(tagged) {
        debug!(region = %predicate.region, matched = entities.len(), "box selection");
        set.entry(&predicate.region)
            .add(predicate.entry.raw_dim, entities, "box");
    }

    for step in plan.combinators(scope) {
        match step {
            SelectionStep::Union(union) => union.apply(&mut set, source)?,
            SelectionStep::Difference(difference) => difference.apply(&mut set, dimension)?,
            SelectionStep::Predicate(_) => {}
        }
        debug!(selection = step.target(), "combined");
    }
    Ok(set)
}
