#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::FRAC_PI_4;

use approx::assert_relative_eq;
use cavern_model::error::ParameterError;
use cavern_model::geometry::{build_geometry, MIN_ARC_LENGTH};
use cavern_model::kernel::materialize::Materializer;
use cavern_model::params::ParameterTable;
use cavern_model::selection::{
    FrozenSelections, SelectionPlan, BOTTOM_BOUNDARY, CAVITY_BOUNDARY, EXPORTED, FARAWAY_BOUNDARY,
    STORAGE_OUTER_BOUNDARY, SYMMETRY_BOUNDARY,
};
use cavern_model::study::StudyPhase;
use cavern_model::topology::TopologyStore;
use cavern_model::{
    build_model, logging, BuiltModel, CavernConfig, CavernError, Criterion, EntityKind, ModelDimension,
    ReferenceKernel,
};
use uom::si::f64::Length;
use uom::si::length::meter;

const DIMENSIONS: [ModelDimension; 2] = [ModelDimension::Two, ModelDimension::Three];
const CRITERIA: [Criterion; 2] = [Criterion::HoekBrown, Criterion::MohrCoulomb];

fn config_with_arc(arc: f64) -> CavernConfig {
    let mut config = CavernConfig::default();
    config.geometry.arc_length = Length::new::<meter>(arc);
    config
}

fn build(config: &CavernConfig, criterion: Criterion, dimension: ModelDimension) -> (BuiltModel, ReferenceKernel) {
    logging::init_test();
    let mut kernel = ReferenceKernel::new(dimension, criterion);
    let model = build_model(&mut kernel, config, criterion, dimension).unwrap();
    (model, kernel)
}

/// Named geometries away from the reference case.
fn off_default_configs() -> Vec<(&'static str, CavernConfig)> {
    let with = |edit: fn(&mut CavernConfig)| {
        let mut config = CavernConfig::default();
        edit(&mut config);
        config
    };
    vec![
        ("reference", CavernConfig::default()),
        ("shortest arcs", config_with_arc(MIN_ARC_LENGTH)),
        ("millimetre arcs", config_with_arc(1e-3)),
        ("arcs just under half the height", config_with_arc(27.49)),
        (
            "roof near the surface",
            with(|c| c.geometry.storage_depth = Length::new::<meter>(-0.5)),
        ),
        (
            "floor near the model base",
            with(|c| c.geometry.model_height = Length::new::<meter>(155.5)),
        ),
        (
            "radius near the model width",
            with(|c| c.geometry.storage_diameter = Length::new::<meter>(199.0)),
        ),
        (
            "flat wide cavern",
            with(|c| {
                c.geometry.storage_diameter = Length::new::<meter>(150.0);
                c.geometry.storage_height = Length::new::<meter>(10.0);
                c.geometry.arc_length = Length::new::<meter>(4.0);
            }),
        ),
    ]
}

fn boundary(selections: &FrozenSelections, name: &str) -> BTreeSet<usize> {
    let raw = EntityKind::Boundary.raw_dimension(selections.dimension()).unwrap();
    selections.get(name).unwrap().entities(raw).collect()
}

fn materialize(config: &CavernConfig, dimension: ModelDimension) -> TopologyStore {
    let table = ParameterTable::from_config(config, Criterion::HoekBrown).unwrap();
    let geometry = build_geometry(dimension, &table).unwrap();
    let plan = SelectionPlan::for_geometry(&geometry).unwrap();
    Materializer::new(&table, &plan)
        .run(dimension, geometry.features())
        .unwrap()
}

fn smallest_domain(store: &TopologyStore, dim: u8) -> f64 {
    store
        .ids(dim)
        .into_iter()
        .map(|id| store.entity(id).unwrap().measure)
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn lining_boundary_is_cavity_without_symmetry() {
    for dimension in DIMENSIONS {
        for criterion in CRITERIA {
            let (model, _) = build(&CavernConfig::default(), criterion, dimension);
            let cavity = boundary(&model.selections, CAVITY_BOUNDARY);
            let symmetry = boundary(&model.selections, SYMMETRY_BOUNDARY);
            let outer = boundary(&model.selections, STORAGE_OUTER_BOUNDARY);
            assert!(!outer.is_empty(), "{dimension} {criterion}");
            assert_eq!(outer, cavity.difference(&symmetry).copied().collect(), "{dimension} {criterion}");
            assert!(outer.is_disjoint(&symmetry));
        }
    }
}

#[test]
fn lining_invariant_holds_across_geometries() {
    for (case, config) in off_default_configs() {
        for dimension in DIMENSIONS {
            for criterion in CRITERIA {
                let (model, kernel) = build(&config, criterion, dimension);
                let top = EntityKind::Domain.raw_dimension(dimension).unwrap();
                assert_eq!(kernel.entities().unwrap()[&top], 2, "{case} {dimension} {criterion}");
                let cavity = boundary(&model.selections, CAVITY_BOUNDARY);
                let symmetry = boundary(&model.selections, SYMMETRY_BOUNDARY);
                let outer = boundary(&model.selections, STORAGE_OUTER_BOUNDARY);
                assert!(!outer.is_empty(), "{case} {dimension} {criterion}");
                assert_eq!(
                    outer,
                    cavity.difference(&symmetry).copied().collect(),
                    "{case} {dimension} {criterion}"
                );
            }
        }
    }
}

#[test]
fn repeated_builds_tag_the_same_entities() {
    for dimension in DIMENSIONS {
        let counts = |model: &BuiltModel| -> BTreeMap<String, usize> {
            model
                .selections
                .iter()
                .map(|s| (s.name().to_owned(), s.sets().values().map(BTreeSet::len).sum()))
                .collect()
        };
        let (first, _) = build(&CavernConfig::default(), Criterion::MohrCoulomb, dimension);
        let (second, _) = build(&CavernConfig::default(), Criterion::MohrCoulomb, dimension);
        assert_eq!(counts(&first), counts(&second));
        assert_eq!(first.selections, second.selections);
    }
}

#[test]
fn zero_arc_length_builds_a_plain_cavity() {
    for dimension in DIMENSIONS {
        let (model, kernel) = build(&config_with_arc(0.0), Criterion::MohrCoulomb, dimension);
        assert!(!model.geometry.has_arcs());
        let top = EntityKind::Domain.raw_dimension(dimension).unwrap();
        assert_eq!(kernel.entities().unwrap()[&top], 2);
        assert!(!boundary(&model.selections, STORAGE_OUTER_BOUNDARY).is_empty());
    }

    let store = materialize(&config_with_arc(0.0), ModelDimension::Two);
    assert_relative_eq!(smallest_domain(&store, 2), 17.5 * 55.0, epsilon = 1e-9);
}

#[test]
fn near_zero_arc_lengths_build_a_plain_cavity() {
    for arc in [1e-9, 1e-7, 1e-6, MIN_ARC_LENGTH / 2.0] {
        for dimension in DIMENSIONS {
            let (model, kernel) = build(&config_with_arc(arc), Criterion::MohrCoulomb, dimension);
            assert!(!model.geometry.has_arcs(), "{dimension} {arc}");
            let top = EntityKind::Domain.raw_dimension(dimension).unwrap();
            assert_eq!(kernel.entities().unwrap()[&top], 2, "{dimension} {arc}");
            assert!(!boundary(&model.selections, STORAGE_OUTER_BOUNDARY).is_empty());
        }
    }
}

#[test]
fn arcs_of_half_the_height_are_rejected() {
    for dimension in DIMENSIONS {
        let mut kernel = ReferenceKernel::new(dimension, Criterion::HoekBrown);
        let err = build_model(&mut kernel, &config_with_arc(27.5), Criterion::HoekBrown, dimension).unwrap_err();
        assert!(matches!(
            err,
            CavernError::Parameter(ParameterError::Precondition {
                parameter: "arc_length",
                ..
            })
        ));
        assert!(kernel.journal().is_empty());
    }
}

#[test]
fn planar_mohr_coulomb_scenario() {
    let (model, kernel) = build(&CavernConfig::default(), Criterion::MohrCoulomb, ModelDimension::Two);
    assert_eq!(kernel.entities().unwrap()[&2], 2);

    let exported: Vec<_> = model.selections.iter().map(|s| s.name()).collect();
    assert_eq!(exported.len(), EXPORTED.len());
    for name in [SYMMETRY_BOUNDARY, FARAWAY_BOUNDARY, BOTTOM_BOUNDARY, CAVITY_BOUNDARY, STORAGE_OUTER_BOUNDARY] {
        assert!(!model.selections.get(name).unwrap().is_empty(), "{name}");
    }

    assert_eq!(model.physics.boundary_conditions(), 5);
    assert_eq!(model.physics.activations(), 1);
    assert_eq!(model.study.steps.len(), 2);
    assert_eq!(model.study.step(StudyPhase::Initial).unwrap().disabled.len(), 4);
    assert!(model.study.step(StudyPhase::Excavated).unwrap().disabled.is_empty());
}

#[test]
fn revolved_hoek_brown_scenario() {
    let (model, kernel) = build(&CavernConfig::default(), Criterion::HoekBrown, ModelDimension::Three);
    assert_eq!(kernel.entities().unwrap()[&3], 2);
    assert!(model.physics.feature("rock1").is_some());
    assert_eq!(model.physics.interface.displacement_order, Some(1));
    assert_eq!(model.mesh.features.len(), 3);

    let store = materialize(&CavernConfig::default(), ModelDimension::Three);
    let (r, h, a) = (17.5_f64, 55.0, 15.0);
    let volume = smallest_domain(&store, 3);
    assert!(volume < FRAC_PI_4 * r * r * h);
    assert!(volume > FRAC_PI_4 * r * r * (h - 2.0 * a));
}

#[test]
fn planar_cavity_area_has_parabolic_corners() {
    let store = materialize(&CavernConfig::default(), ModelDimension::Two);
    let (r, h, a) = (17.5, 55.0, 15.0);
    assert_relative_eq!(smallest_domain(&store, 2), r * (h - a / 3.0), epsilon = 1e-6);
}
