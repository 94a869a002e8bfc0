//! Materials and solid mechanics features, bound to the frozen selections.

pub mod feature;
pub mod material;

pub use feature::{initial_stress, FeatureKind, LoadType, PhysicsFeature, PhysicsInterface, ELASTIC, INTERFACE};
pub use material::{lining, rock_mass, Material, Property, PropertyGroup};

use serde::Serialize;
use tracing::{debug, info};

use crate::criterion::Criterion;
use crate::dimension::{EntityKind, ModelDimension};
use crate::error::{Result, SelectionError, Stage};
use crate::params::{Expr, ParameterTable};
use crate::selection::{
    FrozenSelections, Target, BOTTOM_BOUNDARY, CAVITY_BOUNDARY, FARAWAY_BOUNDARY, STORAGE_OUTER_BOUNDARY,
    SYMMETRY_BOUNDARY,
};
use crate::study::StudyPhase;

/// Materials, interface and features of one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicsDescription {
    pub criterion: Criterion,
    pub materials: Vec<Material>,
    pub interface: PhysicsInterface,
    pub features: Vec<PhysicsFeature>,
}

impl PhysicsDescription {
    #[must_use]
    pub fn feature(&self, tag: &str) -> Option<&PhysicsFeature> {
        self.features.iter().find(|f| f.tag == tag)
    }

    #[must_use]
    pub fn material(&self, tag: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.tag == tag)
    }

    /// Number of boundary conditions and loads.
    #[must_use]
    pub fn boundary_conditions(&self) -> usize {
        self.features.iter().filter(|f| f.kind.is_boundary_condition()).count()
    }

    /// Number of domain activations.
    #[must_use]
    pub fn activations(&self) -> usize {
        self.features
            .iter()
            .filter(|f| matches!(f.kind, FeatureKind::Activation))
            .count()
    }
}

/// Binds materials and solid mechanics features to the exported selections.
///
/// The rock law is the one branch of `criterion`: a Hoek-Brown `Rocks`
/// feature or a Mohr-Coulomb `SoilModel`.
///
/// # Errors
///
/// Returns a selection error naming the selection and stage when a target is
/// undefined or empty, and a parameter error when a referenced parameter is
/// missing from the table.
pub fn bind_physics(
    criterion: Criterion,
    dimension: ModelDimension,
    selections: &FrozenSelections,
    table: &ParameterTable,
) -> Result<PhysicsDescription> {
    if selections.dimension() != dimension {
        return Err(SelectionError::ScopeMismatch {
            expected: dimension,
            found: selections.dimension(),
            stage: Stage::Physics,
        }
        .into());
    }
    let boundary = |name: &str| selections.target(name, EntityKind::Boundary, Stage::Physics);

    let materials = vec![
        rock_mass(criterion),
        lining(selections.target(STORAGE_OUTER_BOUNDARY, EntityKind::Boundary, Stage::Material)?),
    ];

    let law = match criterion {
        Criterion::HoekBrown => {
            PhysicsFeature::new("rock1", FeatureKind::Rocks, Target::AllDomains).labelled("Rock mass - Hoek-Brown")
        }
        Criterion::MohrCoulomb => PhysicsFeature::new(
            "soil1",
            FeatureKind::SoilModel {
                yield_criterion: "MohrCoulomb",
            },
            Target::AllDomains,
        )
        .labelled("Rock mass - Mohr-Coulomb"),
    };
    let features = vec![
        law.nested(),
        PhysicsFeature::new(
            "iss1",
            FeatureKind::InitialStressAndStrain {
                sil: initial_stress(dimension, StudyPhase::Initial.solution()),
            },
            Target::AllDomains,
        )
        .nested(),
        PhysicsFeature::new(
            "act1",
            FeatureKind::Activation,
            selections.target(CAVITY_BOUNDARY, EntityKind::Domain, Stage::Physics)?,
        )
        .nested(),
        PhysicsFeature::new("roll1", FeatureKind::Roller, boundary(FARAWAY_BOUNDARY)?),
        PhysicsFeature::new("fix1", FeatureKind::Fixed, boundary(BOTTOM_BOUNDARY)?),
        PhysicsFeature::new("sym1", FeatureKind::Symmetry, boundary(SYMMETRY_BOUNDARY)?),
        PhysicsFeature::new(
            "bndl1",
            FeatureKind::BoundaryLoad {
                load_type: LoadType::FollowerPressure,
                pressure: -Expr::param("int_pressure"),
            },
            boundary(STORAGE_OUTER_BOUNDARY)?,
        )
        .labelled("Storage internal pressure load"),
        PhysicsFeature::new(
            "tl1",
            FeatureKind::ThinLayer {
                thickness: Expr::param("l_thickness"),
            },
            boundary(STORAGE_OUTER_BOUNDARY)?,
        )
        .labelled("Lining_boundary_condition"),
        PhysicsFeature::new("gacc1", FeatureKind::GravityAcceleration, Target::Global),
    ];

    let params: Vec<&str> = materials
        .iter()
        .flat_map(Material::parameters)
        .chain(features.iter().flat_map(|f| f.kind.expressions()).flat_map(Expr::params))
        .collect();
    table.require(params)?;

    for f in &features {
        debug!(path = %f.path(), kind = f.kind.type_name(), on = ?f.target.engine_name(), "physics feature");
    }
    let description = PhysicsDescription {
        criterion,
        materials,
        interface: PhysicsInterface::solid(dimension),
        features,
    };
    info!(
        %criterion,
        %dimension,
        boundary_conditions = description.boundary_conditions(),
        "physics bound"
    );
    Ok(description)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::error::CavernError;
    use crate::params::CavernConfig;
    use crate::selection::{SelectionSet, EXPORTED};

    /// Exported selections as a 2D or 3D model tags them.
    pub(crate) fn frozen(dimension: ModelDimension) -> FrozenSelections {
        let (dom, bnd, edg) = match dimension {
            ModelDimension::Two => (2, 1, None),
            ModelDimension::Three => (3, 2, Some(1)),
        };
        let mut set = SelectionSet::new(dimension);
        set.entry(SYMMETRY_BOUNDARY).add(bnd, [1, 2, 3], "symmetry");
        set.entry(FARAWAY_BOUNDARY).add(bnd, [9], "faraway");
        set.entry(BOTTOM_BOUNDARY).add(bnd, [4], "bottom");
        let cavity = set.entry(CAVITY_BOUNDARY);
        cavity.add(dom, [1], "del1");
        cavity.add(bnd, [2, 5, 6], "del1");
        if let Some(edg) = edg {
            cavity.add(edg, [3, 7], "rev1");
        }
        set.entry(STORAGE_OUTER_BOUNDARY).add(bnd, [5, 6], "difference");
        set.freeze(&EXPORTED)
    }

    fn table(criterion: Criterion) -> ParameterTable {
        ParameterTable::from_config(&CavernConfig::default(), criterion).unwrap()
    }

    #[test]
    fn mohr_coulomb_planar_binding() {
        let physics = bind_physics(
            Criterion::MohrCoulomb,
            ModelDimension::Two,
            &frozen(ModelDimension::Two),
            &table(Criterion::MohrCoulomb),
        )
        .unwrap();
        assert_eq!(physics.boundary_conditions(), 5);
        assert_eq!(physics.activations(), 1);
        assert!(physics.feature("soil1").is_some());
        assert!(physics.feature("rock1").is_none());
        assert_eq!(physics.interface.displacement_order, None);

        let act = physics.feature("act1").unwrap();
        assert_eq!(act.target.engine_name().unwrap(), "geom1_cavity_boundary_dom");
        let bndl = physics.feature("bndl1").unwrap();
        assert!(matches!(&bndl.kind, FeatureKind::BoundaryLoad { pressure, .. } if pressure.to_string() == "-int_pressure"));
        let mat2 = physics.material("mat2").unwrap();
        assert_eq!(mat2.target.engine_name().unwrap(), "geom1_storage_outer_boundary_bnd");
    }

    #[test]
    fn hoek_brown_revolved_binding() {
        let physics = bind_physics(
            Criterion::HoekBrown,
            ModelDimension::Three,
            &frozen(ModelDimension::Three),
            &table(Criterion::HoekBrown),
        )
        .unwrap();
        assert_eq!(physics.feature("rock1").unwrap().path(), "solid/lemm1/rock1");
        assert_eq!(physics.interface.displacement_order, Some(1));
        assert!(physics.material("mat1").unwrap().group("HoekBrown").is_some());
    }

    #[test]
    fn missing_criterion_parameters_are_reported() {
        // A Mohr-Coulomb table has no Hoek-Brown constants.
        let err = bind_physics(
            Criterion::HoekBrown,
            ModelDimension::Two,
            &frozen(ModelDimension::Two),
            &table(Criterion::MohrCoulomb),
        )
        .unwrap_err();
        assert!(matches!(err, CavernError::Parameter(_)));
    }

    #[test]
    fn empty_lining_selection_names_the_material_stage() {
        let mut set = SelectionSet::new(ModelDimension::Two);
        set.entry(STORAGE_OUTER_BOUNDARY);
        let err = bind_physics(
            Criterion::MohrCoulomb,
            ModelDimension::Two,
            &set.freeze(&EXPORTED),
            &table(Criterion::MohrCoulomb),
        )
        .unwrap_err();
        assert_eq!(err.stage(), Stage::Material);
        assert!(err.to_string().contains("storage_outer_boundary"));
    }

    #[test]
    fn selections_of_the_other_dimension_are_rejected() {
        let err = bind_physics(
            Criterion::MohrCoulomb,
            ModelDimension::Three,
            &frozen(ModelDimension::Two),
            &table(Criterion::MohrCoulomb),
        )
        .unwrap_err();
        assert!(matches!(err, CavernError::Selection(SelectionError::ScopeMismatch { .. })));
    }
}
