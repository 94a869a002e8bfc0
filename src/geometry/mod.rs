//! Parametric cavern geometry: the ordered feature list handed to the engine
//! and the table of regions selections are evaluated on.

pub mod feature;
pub mod planar;
pub mod region;
pub mod revolved;

pub use feature::{Feature, Primitive, QuickPlane};
pub use planar::Planar;
pub use region::{RegionEntry, RegionTable, Scope};
pub use revolved::QuarterRevolved;

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::dimension::{EntityKind, ModelDimension};
use crate::error::{GeometryError, ParameterError, Result, SelectionError};
use crate::params::{Expr, ParameterTable};
use crate::selection::SELECTION_TOLERANCE;

/// Name of the profile selection holding the arc corner regions.
pub const ARC_CORNERS: &str = "arc_corners";

/// Shortest arc that is built. Shorter arcs are left out and the profile
/// stays a plain rectangle, since the corner boxes would otherwise reach the
/// cavity outline.
pub const MIN_ARC_LENGTH: f64 = 100.0 * SELECTION_TOLERANCE;

/// Dimension-specific construction of the cavern geometry.
///
/// Both implementations describe the same logical regions, so later stages
/// address the model identically in 2D and 3D.
pub trait CavernGeometry {
    /// Ambient dimension of the model.
    fn dimension(&self) -> ModelDimension;

    /// Ordered geometry features. Without arcs the cavern profile is a plain
    /// rectangle.
    fn features(&self, with_arcs: bool) -> Vec<Feature>;

    /// Tag of the feature whose result is the finished cavern.
    fn cavity_feature(&self, with_arcs: bool) -> &'static str;

    /// Model-scope boundary regions, besides the shared profile regions.
    fn boundary_regions(&self) -> &'static [&'static str];

    /// Region table of the model.
    ///
    /// # Errors
    ///
    /// Returns an error if a region cannot be addressed in its scope.
    fn regions(&self, with_arcs: bool) -> std::result::Result<RegionTable, SelectionError> {
        let mut table = RegionTable::new(self.dimension());
        if with_arcs {
            table.insert("top_arc", Scope::Profile, EntityKind::Domain)?;
            table.insert("bottom_arc", Scope::Profile, EntityKind::Domain)?;
        }
        for name in self.boundary_regions() {
            table.insert(name, Scope::Model, EntityKind::Boundary)?;
        }
        Ok(table)
    }
}

/// The constructed geometry of one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryDescription {
    dimension: ModelDimension,
    features: Vec<Feature>,
    regions: RegionTable,
    cavity_feature: String,
    with_arcs: bool,
}

impl GeometryDescription {
    #[must_use]
    pub fn dimension(&self) -> ModelDimension {
        self.dimension
    }

    /// Top-level features in construction order.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    #[must_use]
    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    /// Tag of the feature whose result is the cavern.
    #[must_use]
    pub fn cavity_feature(&self) -> &str {
        &self.cavity_feature
    }

    /// Whether the roof and floor arcs are part of the profile.
    #[must_use]
    pub fn has_arcs(&self) -> bool {
        self.with_arcs
    }

    /// Finds a feature by tag, searching work planes too.
    #[must_use]
    pub fn find(&self, tag: &str) -> Option<&Feature> {
        fn search<'a>(features: &'a [Feature], tag: &str) -> Option<&'a Feature> {
            features
                .iter()
                .find_map(|f| if f.tag == tag { Some(f) } else { search(f.children(), tag) })
        }
        search(&self.features, tag)
    }
}

/// Builds the geometry description of a model.
///
/// # Errors
///
/// Returns a parameter error when the table lacks a geometry quantity or the
/// arcs would overlap, and a geometry error when a feature references an
/// object that does not exist yet.
pub fn build_geometry(dimension: ModelDimension, table: &ParameterTable) -> Result<GeometryDescription> {
    table.require([
        "W_model",
        "H_model",
        "storage_radius",
        "storage_height",
        "storage_depth",
        "arc_length",
    ])?;
    let arc = table.si_value("arc_length")?;
    let height = table.si_value("storage_height")?;
    if !(0.0..height / 2.0).contains(&arc) {
        return Err(ParameterError::Precondition {
            parameter: "arc_length",
            reason: format!("must lie in [0, storage_height/2) = [0, {}), got {arc}", height / 2.0),
        }
        .into());
    }
    let with_arcs = arc >= MIN_ARC_LENGTH;

    let builder: &dyn CavernGeometry = match dimension {
        ModelDimension::Two => &Planar,
        ModelDimension::Three => &QuarterRevolved,
    };
    let features = builder.features(with_arcs);
    check_features(&features, table)?;
    let regions = builder.regions(with_arcs)?;

    info!(%dimension, features = features.len(), with_arcs, "geometry described");
    for feature in &features {
        debug!(tag = %feature.tag, kind = feature.primitive.type_name(), "feature");
    }
    Ok(GeometryDescription {
        dimension,
        features,
        regions,
        cavity_feature: builder.cavity_feature(with_arcs).to_owned(),
        with_arcs,
    })
}

/// Evaluates every expression once and checks that inputs precede their use.
fn check_features(features: &[Feature], table: &ParameterTable) -> std::result::Result<(), GeometryError> {
    let mut seen = HashSet::new();
    for feature in features {
        for expr in feature.expressions() {
            expr.eval(table)?;
        }
        for input in feature.inputs() {
            if !seen.contains(input) {
                return Err(GeometryError::UnknownFeature(format!(
                    "{input} (input of {})",
                    feature.tag
                )));
            }
        }
        if !feature.children().is_empty() {
            check_features(feature.children(), table)?;
        }
        seen.insert(feature.tag.as_str());
    }
    Ok(())
}

fn p(name: &str) -> Expr {
    Expr::param(name)
}

fn zero() -> Expr {
    Expr::Literal(0.0)
}

/// Rectangle spanning the cavern cross-section in profile coordinates.
fn cavity_rectangle(tag: &str) -> Feature {
    Feature::new(
        tag,
        "Storage",
        Primitive::Rectangle {
            pos: [zero(), p("storage_depth") - p("storage_height")],
            size: [p("storage_radius"), p("storage_height")],
        },
    )
}

/// Roof arc, bottom arc, conversion to solid and deletion of the corners.
fn arc_features(rectangle: &str) -> Vec<Feature> {
    let floor = || p("storage_depth") - p("storage_height");
    vec![
        Feature::new(
            "qb1",
            "Top_arc - quadratic bézier",
            Primitive::QuadraticBezier {
                points: [
                    [zero(), p("storage_depth")],
                    [p("storage_radius"), p("storage_depth")],
                    [p("storage_radius"), p("storage_depth") - p("arc_length")],
                ],
            },
        ),
        Feature::new(
            "qb2",
            "Bottom_arc - quadratic bézier",
            Primitive::QuadraticBezier {
                points: [
                    [zero(), floor()],
                    [p("storage_radius"), floor()],
                    [p("storage_radius"), floor() + p("arc_length")],
                ],
            },
        ),
        Feature::new(
            "csol1",
            "intersection_arcs_rectangle_to_domain",
            Primitive::ConvertToSolid {
                inputs: vec!["qb1".into(), "qb2".into(), rectangle.into()],
            },
        ),
        Feature::new(
            "del1",
            "Delete arc corners",
            Primitive::Delete {
                input: "csol1".into(),
                selection: ARC_CORNERS.into(),
                kind: EntityKind::Domain,
            },
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::criterion::Criterion;
    use crate::error::CavernError;
    use crate::params::CavernConfig;
    use uom::si::f64::Length;
    use uom::si::length::meter;

    fn table_with_arc(arc: f64) -> ParameterTable {
        let mut config = CavernConfig::default();
        config.geometry.arc_length = Length::new::<meter>(arc);
        ParameterTable::from_config(&config, Criterion::MohrCoulomb).unwrap()
    }

    #[test]
    fn planar_feature_order() {
        let g = build_geometry(ModelDimension::Two, &table_with_arc(15.0)).unwrap();
        let tags: Vec<_> = g.features().iter().map(|f| f.tag.as_str()).collect();
        assert_eq!(tags, ["r1", "r2", "qb1", "qb2", "csol1", "del1"]);
        assert_eq!(g.cavity_feature(), "del1");
        assert!(g.find("del1").unwrap().select_result);
    }

    #[test]
    fn revolved_feature_order() {
        let g = build_geometry(ModelDimension::Three, &table_with_arc(15.0)).unwrap();
        let tags: Vec<_> = g.features().iter().map(|f| f.tag.as_str()).collect();
        assert_eq!(tags, ["blk1", "wp1", "rev1"]);
        let nested: Vec<_> = g.find("wp1").unwrap().children().iter().map(|f| f.tag.as_str()).collect();
        assert_eq!(nested, ["r1", "qb1", "qb2", "csol1", "del1"]);
        assert_eq!(g.cavity_feature(), "rev1");
    }

    #[test]
    fn zero_arc_omits_the_arcs() {
        let g = build_geometry(ModelDimension::Two, &table_with_arc(0.0)).unwrap();
        assert!(!g.has_arcs());
        assert!(g.find("qb1").is_none());
        assert_eq!(g.cavity_feature(), "r2");
        assert!(g.regions().resolve("top_arc").is_err());

        let g3 = build_geometry(ModelDimension::Three, &table_with_arc(0.0)).unwrap();
        assert_eq!(g3.find("wp1").unwrap().children().len(), 1);
    }

    #[test]
    fn arcs_below_the_minimum_are_omitted() {
        for arc in [1e-9, 1e-7, SELECTION_TOLERANCE, MIN_ARC_LENGTH / 2.0] {
            for dimension in [ModelDimension::Two, ModelDimension::Three] {
                let g = build_geometry(dimension, &table_with_arc(arc)).unwrap();
                assert!(!g.has_arcs(), "{dimension} {arc}");
                assert!(g.find("del1").is_none(), "{dimension} {arc}");
            }
        }
        assert!(build_geometry(ModelDimension::Two, &table_with_arc(MIN_ARC_LENGTH)).unwrap().has_arcs());
    }

    #[test]
    fn arc_precondition_is_checked_on_the_table() {
        let mut group = crate::params::ParameterGroup::new("par1", "geometry");
        for (name, value) in [
            ("W_model", 100.0),
            ("H_model", 250.0),
            ("storage_radius", 17.5),
            ("storage_height", 55.0),
            ("storage_depth", -100.0),
            ("arc_length", 30.0),
        ] {
            group.push(crate::params::Quantity::new(name, value, crate::params::Unit::Meter));
        }
        let table = ParameterTable::from_groups(vec![group]).unwrap();
        let err = build_geometry(ModelDimension::Two, &table).unwrap_err();
        assert!(matches!(
            err,
            CavernError::Parameter(ParameterError::Precondition { parameter: "arc_length", .. })
        ));
    }

    #[test]
    fn region_table_resolves_per_dimension() {
        let g2 = build_geometry(ModelDimension::Two, &table_with_arc(15.0)).unwrap();
        assert_eq!(g2.regions().resolve("symmetry").unwrap().raw_dim, 1);
        assert_eq!(g2.regions().resolve("top_arc").unwrap().raw_dim, 2);
        let g3 = build_geometry(ModelDimension::Three, &table_with_arc(15.0)).unwrap();
        assert_eq!(g3.regions().resolve("symmetry_xz").unwrap().raw_dim, 2);
        assert_eq!(g3.regions().resolve("top_arc").unwrap().raw_dim, 2);
    }

    #[test]
    fn unknown_input_is_reported() {
        let features = vec![Feature::new(
            "csol1",
            "convert",
            Primitive::ConvertToSolid {
                inputs: vec!["qb9".into()],
            },
        )];
        let err = check_features(&features, &table_with_arc(15.0)).unwrap_err();
        assert!(matches!(err, GeometryError::UnknownFeature(msg) if msg.starts_with("qb9")));
    }
}
