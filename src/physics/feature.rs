use serde::Serialize;

use crate::dimension::ModelDimension;
use crate::params::Expr;
use crate::selection::Target;

/// Tag of the solid mechanics interface.
pub const INTERFACE: &str = "solid";

/// Tag of the default linear elastic material feature nesting the domain laws.
pub const ELASTIC: &str = "lemm1";

/// The solid mechanics interface the features belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhysicsInterface {
    pub tag: &'static str,
    pub kind: &'static str,
    pub geometry: &'static str,
    /// Displacement shape function order, when it deviates from the default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displacement_order: Option<u8>,
}

impl PhysicsInterface {
    /// Solid mechanics on `geom1`; 3D models use linear displacement.
    #[must_use]
    pub fn solid(dimension: ModelDimension) -> Self {
        Self {
            tag: INTERFACE,
            kind: "SolidMechanics",
            geometry: "geom1",
            displacement_order: match dimension {
                ModelDimension::Two => None,
                ModelDimension::Three => Some(1),
            },
        }
    }
}

/// How a boundary load is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadType {
    /// Pressure normal to the deformed boundary.
    FollowerPressure,
}

/// Physics feature variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum FeatureKind {
    /// Hoek-Brown rock law.
    Rocks,
    /// Soil model with an explicit yield criterion.
    SoilModel { yield_criterion: &'static str },
    /// Initial stress tensor, row-major, in engine syntax.
    InitialStressAndStrain { sil: [String; 9] },
    /// Toggles the cavity between rock and void across study phases.
    Activation,
    Roller,
    Fixed,
    Symmetry,
    BoundaryLoad { load_type: LoadType, pressure: Expr },
    ThinLayer { thickness: Expr },
    GravityAcceleration,
}

impl FeatureKind {
    /// Engine type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Rocks => "Rocks",
            Self::SoilModel { .. } => "SoilModel",
            Self::InitialStressAndStrain { .. } => "InitialStressandStrain",
            Self::Activation => "Activation",
            Self::Roller => "Roller",
            Self::Fixed => "Fixed",
            Self::Symmetry => "SymmetrySolid",
            Self::BoundaryLoad { .. } => "BoundaryLoad",
            Self::ThinLayer { .. } => "ThinLayer",
            Self::GravityAcceleration => "GravityAcceleration",
        }
    }

    /// Parameter expressions the feature reads.
    #[must_use]
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            Self::BoundaryLoad { pressure, .. } => vec![pressure],
            Self::ThinLayer { thickness } => vec![thickness],
            _ => Vec::new(),
        }
    }

    /// Whether the feature constrains or loads a boundary.
    #[must_use]
    pub fn is_boundary_condition(&self) -> bool {
        matches!(
            self,
            Self::Roller | Self::Fixed | Self::Symmetry | Self::BoundaryLoad { .. } | Self::ThinLayer { .. }
        )
    }
}

/// A feature of the solid mechanics interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicsFeature {
    pub tag: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
    /// Enclosing feature, for the laws nested in the elastic material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<&'static str>,
    pub kind: FeatureKind,
    pub target: Target,
}

impl PhysicsFeature {
    #[must_use]
    pub fn new(tag: &'static str, kind: FeatureKind, target: Target) -> Self {
        Self {
            tag,
            label: None,
            parent: None,
            kind,
            target,
        }
    }

    #[must_use]
    pub fn labelled(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Nests the feature in the elastic material.
    #[must_use]
    pub fn nested(mut self) -> Self {
        self.parent = Some(ELASTIC);
        self
    }

    /// Path used to disable the feature in a study, e.g. `solid/lemm1/iss1`.
    #[must_use]
    pub fn path(&self) -> String {
        match self.parent {
            Some(parent) => format!("{INTERFACE}/{parent}/{}", self.tag),
            None => format!("{INTERFACE}/{}", self.tag),
        }
    }
}

/// Initial stress read back from `solution`, row-major and symmetric.
///
/// Planar models have no out-of-plane shear, so `sxz` and `syz` are zero.
#[must_use]
pub fn initial_stress(dimension: ModelDimension, solution: &str) -> [String; 9] {
    let read = |component: &str| format!("withsol('{solution}', solid.{component})");
    let shear = |component: &str| match dimension {
        ModelDimension::Two => "0".to_owned(),
        ModelDimension::Three => read(component),
    };
    [
        read("sx"),
        read("sxy"),
        shear("sxz"),
        read("sxy"),
        read("sy"),
        shear("syz"),
        shear("sxz"),
        shear("syz"),
        read("sz"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_include_the_elastic_parent() {
        let iss = PhysicsFeature::new("iss1", FeatureKind::Activation, Target::AllDomains).nested();
        assert_eq!(iss.path(), "solid/lemm1/iss1");
        let tl = PhysicsFeature::new(
            "tl1",
            FeatureKind::ThinLayer {
                thickness: Expr::param("l_thickness"),
            },
            Target::Global,
        );
        assert_eq!(tl.path(), "solid/tl1");
        assert!(tl.kind.is_boundary_condition());
    }

    #[test]
    fn stress_tensor_is_symmetric() {
        let sil = initial_stress(ModelDimension::Three, "sol1");
        assert_eq!(sil[0], "withsol('sol1', solid.sx)");
        for (i, j) in [(1, 3), (2, 6), (5, 7)] {
            assert_eq!(sil[i], sil[j]);
        }
        assert_eq!(sil[5], "withsol('sol1', solid.syz)");
    }

    #[test]
    fn planar_stress_drops_out_of_plane_shear() {
        let sil = initial_stress(ModelDimension::Two, "sol1");
        assert_eq!(sil.iter().filter(|s| *s == "0").count(), 4);
        assert_eq!(sil[8], "withsol('sol1', solid.sz)");
    }

    #[test]
    fn interface_order_only_in_3d() {
        assert_eq!(PhysicsInterface::solid(ModelDimension::Two).displacement_order, None);
        assert_eq!(PhysicsInterface::solid(ModelDimension::Three).displacement_order, Some(1));
    }
}
