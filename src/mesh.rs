//! Mesh sequence: element distributions and size constraints on selections.

use serde::Serialize;
use tracing::{debug, info};

use crate::dimension::{EntityKind, ModelDimension};
use crate::error::{Result, SelectionError, Stage};
use crate::params::{Expr, ParameterTable};
use crate::selection::{FrozenSelections, Target, CAVITY_BOUNDARY, STORAGE_OUTER_BOUNDARY};

/// Size constraint `size1` of a free mesher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeSpec {
    /// Maximum element size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hmax: Option<Expr>,
    /// Maximum element growth rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hgrad: Option<Expr>,
}

impl SizeSpec {
    fn expressions(&self) -> impl Iterator<Item = &Expr> {
        self.hmax.iter().chain(&self.hgrad)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum MeshKind {
    /// Edge mesh with a fixed element count distribution `dis1`.
    Edge { num_elem: Expr },
    FreeTri { size: SizeSpec },
    FreeTet { size: SizeSpec },
}

impl MeshKind {
    /// Engine type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Edge { .. } => "Edge",
            Self::FreeTri { .. } => "FreeTri",
            Self::FreeTet { .. } => "FreeTet",
        }
    }

    fn expressions(&self) -> Vec<&Expr> {
        match self {
            Self::Edge { num_elem } => vec![num_elem],
            Self::FreeTri { size } | Self::FreeTet { size } => size.expressions().collect(),
        }
    }
}

/// One feature of the mesh sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshFeature {
    pub tag: &'static str,
    pub kind: MeshKind,
    pub target: Target,
}

/// The mesh sequence `mesh1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshSpec {
    pub features: Vec<MeshFeature>,
}

impl MeshSpec {
    #[must_use]
    pub fn feature(&self, tag: &str) -> Option<&MeshFeature> {
        self.features.iter().find(|f| f.tag == tag)
    }
}

/// Builds the mesh sequence of a model.
///
/// Planar models refine the lining boundary and fill the rest with
/// triangles. Revolved models refine the cavity edges, mesh the cavity with
/// graded tetrahedra and fill the rock mass with coarser ones.
///
/// # Errors
///
/// Returns a selection error when a target selection is undefined or empty,
/// and a parameter error when a mesh parameter is missing from the table.
pub fn build_mesh(dimension: ModelDimension, selections: &FrozenSelections, table: &ParameterTable) -> Result<MeshSpec> {
    if selections.dimension() != dimension {
        return Err(SelectionError::ScopeMismatch {
            expected: dimension,
            found: selections.dimension(),
            stage: Stage::Mesh,
        }
        .into());
    }
    let num_elem = || Expr::param("num_elem");
    let hmax = || Some(Expr::param("max_elem"));
    let hgrad = || Some(Expr::param("max_growth"));

    let features = match dimension {
        ModelDimension::Two => vec![
            MeshFeature {
                tag: "edg1",
                kind: MeshKind::Edge { num_elem: num_elem() },
                target: selections.target(STORAGE_OUTER_BOUNDARY, EntityKind::Boundary, Stage::Mesh)?,
            },
            MeshFeature {
                tag: "ftri1",
                kind: MeshKind::FreeTri {
                    size: SizeSpec {
                        hmax: hmax(),
                        hgrad: hgrad(),
                    },
                },
                target: Target::Remaining,
            },
        ],
        ModelDimension::Three => vec![
            MeshFeature {
                tag: "edg1",
                kind: MeshKind::Edge { num_elem: num_elem() },
                target: selections.target(CAVITY_BOUNDARY, EntityKind::Edge, Stage::Mesh)?,
            },
            MeshFeature {
                tag: "ftet1",
                kind: MeshKind::FreeTet {
                    size: SizeSpec {
                        hmax: None,
                        hgrad: hgrad(),
                    },
                },
                target: selections.target(CAVITY_BOUNDARY, EntityKind::Domain, Stage::Mesh)?,
            },
            MeshFeature {
                tag: "ftet2",
                kind: MeshKind::FreeTet {
                    size: SizeSpec {
                        hmax: hmax(),
                        hgrad: hgrad(),
                    },
                },
                target: Target::Remaining,
            },
        ],
    };

    table.require(features.iter().flat_map(|f| f.kind.expressions()).flat_map(Expr::params))?;
    for f in &features {
        debug!(tag = f.tag, kind = f.kind.type_name(), on = ?f.target.engine_name(), "mesh feature");
    }
    info!(%dimension, features = features.len(), "mesh sequence built");
    Ok(MeshSpec { features })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::criterion::Criterion;
    use crate::error::{CavernError, ParameterError};
    use crate::params::{CavernConfig, ParameterGroup, Quantity, Unit};
    use crate::physics::tests::frozen;

    fn table() -> ParameterTable {
        ParameterTable::from_config(&CavernConfig::default(), Criterion::MohrCoulomb).unwrap()
    }

    #[test]
    fn planar_mesh() {
        let mesh = build_mesh(ModelDimension::Two, &frozen(ModelDimension::Two), &table()).unwrap();
        let tags: Vec<_> = mesh.features.iter().map(|f| f.tag).collect();
        assert_eq!(tags, ["edg1", "ftri1"]);
        let edge = mesh.feature("edg1").unwrap();
        assert_eq!(edge.target.engine_name().unwrap(), "geom1_storage_outer_boundary_bnd");
        assert_eq!(mesh.feature("ftri1").unwrap().target, Target::Remaining);
    }

    #[test]
    fn revolved_mesh_targets_cavity_edges_and_domain() {
        let mesh = build_mesh(ModelDimension::Three, &frozen(ModelDimension::Three), &table()).unwrap();
        let tags: Vec<_> = mesh.features.iter().map(|f| f.tag).collect();
        assert_eq!(tags, ["edg1", "ftet1", "ftet2"]);
        assert_eq!(
            mesh.feature("edg1").unwrap().target.engine_name().unwrap(),
            "geom1_cavity_boundary_edg"
        );
        let MeshKind::FreeTet { size } = &mesh.feature("ftet1").unwrap().kind else {
            panic!("ftet1 is not a tetrahedral mesher");
        };
        assert!(size.hmax.is_none());
        assert_eq!(size.hgrad.as_ref().unwrap().to_string(), "max_growth");
    }

    #[test]
    fn mesh_parameters_must_exist() {
        let mut group = ParameterGroup::new("par1", "geometry");
        group.push(Quantity::new("num_elem", 50.0, Unit::Dimensionless));
        let table = ParameterTable::from_groups(vec![group]).unwrap();
        let err = build_mesh(ModelDimension::Two, &frozen(ModelDimension::Two), &table).unwrap_err();
        assert!(matches!(err, CavernError::Parameter(ParameterError::Undefined(name)) if name == "max_elem"));
    }
}
