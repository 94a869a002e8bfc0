use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::block::MakeBlock;
use super::imprint::Imprint;
use super::profile::{Frame, Region, Sketch, SketchObject};
use super::revolve::Revolve;
use super::ScopeIndex;
use crate::dimension::{EntityKind, ModelDimension};
use crate::error::{EngineError, GeometryError, Stage};
use crate::geometry::{Feature, Primitive, QuickPlane, Scope};
use crate::math::{Point2, Point3, QuadraticBezier, Vector3};
use crate::params::{Expr, ParameterTable};
use crate::selection::{self, SelectionPlan};
use crate::topology::{EntityId, TopologyStore};

/// Runs a feature sequence against the topology kernel.
///
/// Deletions read their profile selection from `plan`, evaluated on the
/// sketch as it stands when the deletion runs.
pub struct Materializer<'a> {
    table: &'a ParameterTable,
    plan: &'a SelectionPlan,
}

impl<'a> Materializer<'a> {
    #[must_use]
    pub fn new(table: &'a ParameterTable, plan: &'a SelectionPlan) -> Self {
        Self { table, plan }
    }

    /// Builds the model geometry and unites nested solids.
    ///
    /// # Errors
    ///
    /// Returns a geometry error for invalid or unsupported features and a
    /// selection error when a deletion's selection cannot be resolved.
    pub fn run(&self, dimension: ModelDimension, features: &[Feature]) -> Result<TopologyStore, EngineError> {
        let mut store = match dimension {
            ModelDimension::Two => {
                let sketch = self.sketch(features)?;
                sketch.to_store(&Frame::xy())?.0
            }
            ModelDimension::Three => self.solids(features)?,
        };
        let top = match dimension {
            ModelDimension::Two => 2,
            ModelDimension::Three => 3,
        };
        unite(&mut store, top)?;
        Ok(store)
    }

    fn solids(&self, features: &[Feature]) -> Result<TopologyStore, EngineError> {
        let mut store = TopologyStore::new();
        let mut work_planes: HashMap<&str, Sketch> = HashMap::new();
        for feature in features {
            debug!(tag = %feature.tag, kind = feature.primitive.type_name(), "materializing");
            match &feature.primitive {
                Primitive::Block { pos, size } => {
                    let [x, y, z] = self.eval3(pos)?;
                    let [w, d, h] = self.eval3(size)?;
                    MakeBlock::new(Point3::new(x, y, z), Vector3::new(w, d, h), &feature.tag).execute(&mut store)?;
                }
                Primitive::WorkPlane {
                    plane: QuickPlane::Xz,
                    features,
                } => {
                    work_planes.insert(&feature.tag, self.sketch(features)?);
                }
                Primitive::Revolve { input, angle } => {
                    let sketch = work_planes
                        .remove(input.as_str())
                        .ok_or_else(|| GeometryError::UnknownFeature(format!("{input} (input of {})", feature.tag)))?;
                    let regions: Vec<Region> = sketch.solids().flat_map(|(_, r)| r.iter().cloned()).collect();
                    let radians = self.eval(angle)?.to_radians();
                    Revolve::new(&regions, radians, &feature.tag).execute(&mut store)?;
                }
                other => {
                    return Err(GeometryError::InvalidInput {
                        feature: feature.tag.clone(),
                        reason: format!("{} is a sketch feature, not available in 3D", other.type_name()),
                    }
                    .into());
                }
            }
        }
        Ok(store)
    }

    fn sketch(&self, features: &[Feature]) -> Result<Sketch, EngineError> {
        let mut sketch = Sketch::new();
        for feature in features {
            debug!(tag = %feature.tag, kind = feature.primitive.type_name(), "sketching");
            match &feature.primitive {
                Primitive::Rectangle { pos, size } => {
                    let [x, y] = self.eval2(pos)?;
                    let [w, h] = self.eval2(size)?;
                    if w <= 0.0 || h <= 0.0 {
                        return Err(GeometryError::InvalidInput {
                            feature: feature.tag.clone(),
                            reason: format!("rectangle size ({w}, {h}) must be positive"),
                        }
                        .into());
                    }
                    let region = Region::rectangle(Point2::new(x, y), [w, h]);
                    sketch.add(&feature.tag, SketchObject::Solid(vec![region]));
                }
                Primitive::QuadraticBezier { points } => {
                    let [p0, p1, p2] = [&points[0], &points[1], &points[2]]
                        .map(|p| self.eval2(p).map(|[x, y]| Point2::new(x, y)));
                    sketch.add(&feature.tag, SketchObject::Curve(QuadraticBezier::new(p0?, p1?, p2?)));
                }
                Primitive::ConvertToSolid { inputs } => sketch.convert_to_solid(&feature.tag, inputs)?,
                Primitive::Delete { input, selection, kind } => {
                    let regions = self.selected_regions(&sketch, &feature.tag, input, selection, *kind)?;
                    sketch.delete(&feature.tag, input, &regions)?;
                }
                other => {
                    return Err(GeometryError::InvalidInput {
                        feature: feature.tag.clone(),
                        reason: format!("{} is not available in a planar sketch", other.type_name()),
                    }
                    .into());
                }
            }
        }
        Ok(sketch)
    }

    /// Region indices of `input` tagged by the profile selection `selection`.
    fn selected_regions(
        &self,
        sketch: &Sketch,
        tag: &str,
        input: &str,
        selection: &str,
        kind: EntityKind,
    ) -> Result<BTreeSet<usize>, EngineError> {
        if kind != EntityKind::Domain {
            return Err(GeometryError::InvalidInput {
                feature: tag.to_owned(),
                reason: format!("only domains can be deleted from a sketch, not {kind} entities"),
            }
            .into());
        }
        let (store, owners) = sketch.to_store(&Frame::xy())?;
        let index = ScopeIndex::new(&store, 2, Vec::<String>::new()).map_err(GeometryError::from)?;
        let tagged = selection::tag(self.plan, Scope::Profile, self.table, &index)?;
        let numbers = tagged.require(selection, kind, Stage::Geometry)?;

        let mut regions = BTreeSet::new();
        for (face, owner, i) in &owners {
            if !index.number_of(*face).is_some_and(|n| numbers.contains(&n)) {
                continue;
            }
            if owner != input {
                return Err(GeometryError::InvalidInput {
                    feature: tag.to_owned(),
                    reason: format!("selection {selection} reaches object {owner}, outside {input}"),
                }
                .into());
            }
            regions.insert(*i);
        }
        debug!(feature = tag, selection, deleted = regions.len(), "profile deletion");
        Ok(regions)
    }

    fn eval(&self, expr: &Expr) -> Result<f64, GeometryError> {
        Ok(expr.eval(self.table)?)
    }

    fn eval2(&self, exprs: &[Expr; 2]) -> Result<[f64; 2], GeometryError> {
        Ok([self.eval(&exprs[0])?, self.eval(&exprs[1])?])
    }

    fn eval3(&self, exprs: &[Expr; 3]) -> Result<[f64; 3], GeometryError> {
        Ok([self.eval(&exprs[0])?, self.eval(&exprs[1])?, self.eval(&exprs[2])?])
    }
}

/// Unites every domain with the largest one, which must contain them.
fn unite(store: &mut TopologyStore, top: u8) -> Result<(), GeometryError> {
    let mut domains: Vec<(EntityId, f64)> = Vec::new();
    for id in store.ids(top) {
        domains.push((id, store.entity(id)?.measure));
    }
    let Some(&(outer, _)) = domains.iter().max_by(|a, b| a.1.total_cmp(&b.1)) else {
        return Err(GeometryError::Degenerate("model has no domain".into()));
    };
    for (inner, _) in domains.into_iter().filter(|(id, _)| *id != outer) {
        Imprint::new(outer, inner).execute(store)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::criterion::Criterion;
    use crate::geometry::build_geometry;
    use crate::params::CavernConfig;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;
    use uom::si::f64::Length;
    use uom::si::length::meter;

    fn run(dimension: ModelDimension, arc: f64) -> TopologyStore {
        let mut config = CavernConfig::default();
        config.geometry.arc_length = Length::new::<meter>(arc);
        let table = ParameterTable::from_config(&config, Criterion::MohrCoulomb).unwrap();
        let geometry = build_geometry(dimension, &table).unwrap();
        let plan = SelectionPlan::for_geometry(&geometry).unwrap();
        Materializer::new(&table, &plan).run(dimension, geometry.features()).unwrap()
    }

    fn cavity(store: &TopologyStore, dim: u8) -> f64 {
        store
            .ids(dim)
            .into_iter()
            .map(|id| store.entity(id).unwrap().measure)
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn planar_model_has_two_domains() {
        let store = run(ModelDimension::Two, 15.0);
        assert_eq!(store.count(2), 2);
        assert_eq!(store.count(1), 9);
        assert_eq!(store.count(0), 8);
        // Parabolic corners take a third of the arc length from the height.
        assert_relative_eq!(cavity(&store, 2), 17.5 * (55.0 - 15.0 / 3.0), epsilon = 1e-6);
    }

    #[test]
    fn planar_model_without_arcs() {
        let store = run(ModelDimension::Two, 0.0);
        assert_eq!(store.count(2), 2);
        assert_relative_eq!(cavity(&store, 2), 17.5 * 55.0, epsilon = 1e-9);
    }

    #[test]
    fn revolved_cavity_volume_is_bounded() {
        let store = run(ModelDimension::Three, 15.0);
        assert_eq!(store.count(3), 2);
        let (r, h, a) = (17.5_f64, 55.0, 15.0);
        let volume = cavity(&store, 3);
        assert!(volume < FRAC_PI_4 * r * r * h);
        assert!(volume > FRAC_PI_4 * r * r * (h - 2.0 * a));
    }

    #[test]
    fn revolve_of_unknown_work_plane() {
        let table = ParameterTable::from_config(&CavernConfig::default(), Criterion::MohrCoulomb).unwrap();
        let plan = SelectionPlan::new(ModelDimension::Three, Vec::new()).unwrap();
        let features = vec![Feature::new(
            "rev1",
            "revolve",
            Primitive::Revolve {
                input: "wp9".into(),
                angle: Expr::Literal(90.0),
            },
        )];
        let err = Materializer::new(&table, &plan)
            .run(ModelDimension::Three, &features)
            .unwrap_err();
        assert!(matches!(err, EngineError::Geometry(GeometryError::UnknownFeature(_))));
    }
}
