use std::collections::HashSet;

use serde::Serialize;

use super::combinator::{Difference, Union, UnionSource};
use super::predicate::{BoxBounds, Condition, RegionPredicate};
use super::{
    BOTTOM_BOUNDARY, CAVITY_BOUNDARY, FARAWAY_BOUNDARY, STORAGE_OUTER_BOUNDARY, SYMMETRY_BOUNDARY,
};
use crate::dimension::{EntityKind, ModelDimension};
use crate::error::SelectionError;
use crate::geometry::{GeometryDescription, Scope, ARC_CORNERS};
use crate::params::Expr;

/// One step of the selection sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum SelectionStep {
    Predicate(RegionPredicate),
    Union(Union),
    Difference(Difference),
}

impl SelectionStep {
    /// Scope the step reads and writes. Differences act on the finished model.
    #[must_use]
    pub fn scope(&self) -> Scope {
        match self {
            Self::Predicate(p) => p.entry.scope,
            Self::Union(u) => u.scope,
            Self::Difference(_) => Scope::Model,
        }
    }

    /// Name of the selection the step populates.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Predicate(p) => &p.region,
            Self::Union(u) => &u.into,
            Self::Difference(d) => &d.into,
        }
    }
}

/// The ordered selection sequence of one model, checked for forward
/// references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionPlan {
    dimension: ModelDimension,
    steps: Vec<SelectionStep>,
}

impl SelectionPlan {
    /// Validates an explicit step sequence.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::ForwardReference`] when a step consumes a
    /// selection that no earlier step of the same scope populated.
    pub fn new(dimension: ModelDimension, steps: Vec<SelectionStep>) -> Result<Self, SelectionError> {
        validate(&steps)?;
        Ok(Self { dimension, steps })
    }

    /// The selection sequence every cavern model uses.
    ///
    /// Region predicates tag the profile corners and the outer boundaries,
    /// unions collect them under the exported names and the lining boundary
    /// is the cavity boundary without the symmetry planes.
    ///
    /// # Errors
    ///
    /// Returns an error if a region is missing from the geometry's region
    /// table or addressed with the wrong number of axes.
    pub fn for_geometry(geometry: &GeometryDescription) -> Result<Self, SelectionError> {
        let regions = geometry.regions();
        let dimension = geometry.dimension();
        let mut steps = Vec::new();
        let mut predicate = |name: &str, bounds: BoxBounds, condition: Condition| -> Result<(), SelectionError> {
            steps.push(SelectionStep::Predicate(RegionPredicate::new(
                name, regions, bounds, condition,
            )?));
            Ok(())
        };

        if geometry.has_arcs() {
            let top = p("storage_depth");
            let floor = p("storage_depth") - p("storage_height");
            predicate("top_arc", point_box(p("storage_radius"), top), Condition::SomeVertex)?;
            predicate("bottom_arc", point_box(p("storage_radius"), floor), Condition::SomeVertex)?;
        }

        let unions: Vec<(&str, Vec<&str>)> = match dimension {
            ModelDimension::Two => {
                let full_height = || [-p("H_model"), zero()];
                predicate("symmetry", BoxBounds::planar(pair(zero()), full_height()), Condition::Inside)?;
                predicate("faraway", BoxBounds::planar(pair(p("W_model")), full_height()), Condition::Inside)?;
                predicate(
                    "bottom",
                    BoxBounds::planar([zero(), p("W_model")], pair(-p("H_model"))),
                    Condition::Inside,
                )?;
                vec![
                    (SYMMETRY_BOUNDARY, vec!["symmetry"]),
                    (FARAWAY_BOUNDARY, vec!["faraway"]),
                    (BOTTOM_BOUNDARY, vec!["bottom"]),
                ]
            }
            ModelDimension::Three => {
                let span = || [zero(), p("W_model")];
                let full_height = || [-p("H_model"), zero()];
                predicate(
                    "symmetry_xz",
                    BoxBounds::spatial(span(), pair(zero()), full_height()),
                    Condition::Inside,
                )?;
                predicate(
                    "symmetry_yz",
                    BoxBounds::spatial(pair(zero()), span(), full_height()),
                    Condition::Inside,
                )?;
                predicate(
                    "faraway_xz",
                    BoxBounds::spatial(span(), pair(p("W_model")), full_height()),
                    Condition::Inside,
                )?;
                predicate(
                    "faraway_yz",
                    BoxBounds::spatial(pair(p("W_model")), span(), full_height()),
                    Condition::Inside,
                )?;
                predicate(
                    "bottom",
                    BoxBounds::spatial(span(), span(), pair(-p("H_model"))),
                    Condition::Inside,
                )?;
                vec![
                    (SYMMETRY_BOUNDARY, vec!["symmetry_xz", "symmetry_yz"]),
                    (FARAWAY_BOUNDARY, vec!["faraway_xz", "faraway_yz"]),
                    (BOTTOM_BOUNDARY, vec!["bottom"]),
                ]
            }
        };

        if geometry.has_arcs() {
            steps.push(SelectionStep::Union(Union::new(
                ARC_CORNERS,
                Scope::Profile,
                vec![
                    UnionSource::Region("top_arc".into()),
                    UnionSource::Region("bottom_arc".into()),
                ],
            )));
        }
        for (into, sources) in unions {
            steps.push(SelectionStep::Union(Union::new(
                into,
                Scope::Model,
                sources.into_iter().map(|s| UnionSource::Region(s.to_owned())).collect(),
            )));
        }
        steps.push(SelectionStep::Union(Union::new(
            CAVITY_BOUNDARY,
            Scope::Model,
            vec![UnionSource::Feature(geometry.cavity_feature().to_owned())],
        )));
        steps.push(SelectionStep::Difference(Difference::new(
            STORAGE_OUTER_BOUNDARY,
            vec![CAVITY_BOUNDARY.into()],
            vec![SYMMETRY_BOUNDARY.into()],
            EntityKind::Boundary,
        )));

        Self::new(dimension, steps)
    }

    #[must_use]
    pub fn dimension(&self) -> ModelDimension {
        self.dimension
    }

    #[must_use]
    pub fn steps(&self) -> &[SelectionStep] {
        &self.steps
    }

    /// Predicates of one scope, in order.
    pub fn predicates(&self, scope: Scope) -> impl Iterator<Item = &RegionPredicate> {
        self.steps.iter().filter_map(move |s| match s {
            SelectionStep::Predicate(p) if p.entry.scope == scope => Some(p),
            _ => None,
        })
    }

    /// Unions and differences of one scope, in order.
    pub fn combinators(&self, scope: Scope) -> impl Iterator<Item = &SelectionStep> {
        self.steps
            .iter()
            .filter(move |s| !matches!(s, SelectionStep::Predicate(_)) && s.scope() == scope)
    }
}

fn validate(steps: &[SelectionStep]) -> Result<(), SelectionError> {
    let mut defined: HashSet<(Scope, &str)> = HashSet::new();
    for step in steps {
        let scope = step.scope();
        let consumed: Vec<&str> = match step {
            SelectionStep::Predicate(_) => Vec::new(),
            SelectionStep::Union(u) => u
                .sources
                .iter()
                .filter_map(|s| match s {
                    UnionSource::Region(name) => Some(name.as_str()),
                    UnionSource::Feature(_) => None,
                })
                .collect(),
            SelectionStep::Difference(d) => d.add.iter().chain(&d.subtract).map(String::as_str).collect(),
        };
        if let Some(name) = consumed.into_iter().find(|n| !defined.contains(&(scope, *n))) {
            return Err(SelectionError::ForwardReference { name: name.to_owned() });
        }
        defined.insert((scope, step.target()));
    }
    Ok(())
}

fn p(name: &str) -> Expr {
    Expr::param(name)
}

fn zero() -> Expr {
    Expr::Literal(0.0)
}

fn pair(e: Expr) -> [Expr; 2] {
    [e.clone(), e]
}

/// Zero-size box at one profile point.
fn point_box(x: Expr, y: Expr) -> BoxBounds {
    BoxBounds::planar(pair(x), pair(y))
}
