//! The build pipeline and the engine contract it drives.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use crate::criterion::Criterion;
use crate::dimension::ModelDimension;
use crate::error::{EngineError, Result};
use crate::geometry::{build_geometry, Feature, GeometryDescription};
use crate::mesh::{build_mesh, MeshFeature, MeshSpec};
use crate::params::{CavernConfig, ParameterGroup, ParameterTable};
use crate::physics::{bind_physics, Material, PhysicsDescription, PhysicsFeature, PhysicsInterface};
use crate::selection::{FrozenSelections, SelectionPlan, SelectionSet, SelectionStep, EXPORTED};
use crate::study::{build_study, StudyPlan, StudyStep};

/// One instruction to the model engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    Parameters(ParameterGroup),
    Geometry(Feature),
    Selection(SelectionStep),
    Material(Material),
    Interface(PhysicsInterface),
    Physics(PhysicsFeature),
    Mesh(MeshFeature),
    Study(StudyStep),
}

impl Command {
    /// Command kind, as used in the journal.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parameters(_) => "parameters",
            Self::Geometry(_) => "geometry",
            Self::Selection(_) => "selection",
            Self::Material(_) => "material",
            Self::Interface(_) => "interface",
            Self::Physics(_) => "physics",
            Self::Mesh(_) => "mesh",
            Self::Study(_) => "study",
        }
    }
}

/// The engine a model is built in.
///
/// Parameters, geometry features and selection steps are submitted first;
/// `finalize` materializes them and returns the model-scope selections.
/// Everything submitted afterwards refers to those selections.
pub trait ModelEngine {
    /// Submits one command.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the command.
    fn submit(&mut self, command: Command) -> std::result::Result<(), EngineError>;

    /// Builds the geometry and evaluates the selections.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry or a selection cannot be built.
    fn finalize(&mut self) -> std::result::Result<SelectionSet, EngineError>;

    /// Saves the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is incomplete or cannot be written.
    fn save(&self, path: &Path) -> std::result::Result<(), EngineError>;
}

/// Everything one build produced, stage by stage.
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub criterion: Criterion,
    pub dimension: ModelDimension,
    pub table: ParameterTable,
    pub geometry: GeometryDescription,
    pub plan: SelectionPlan,
    pub selections: FrozenSelections,
    pub physics: PhysicsDescription,
    pub mesh: MeshSpec,
    pub study: StudyPlan,
}

/// Builds a model in `engine`.
///
/// Stages run in order: parameters, geometry, selections, materials and
/// physics, mesh, study. Each stage's output is submitted before the next
/// stage starts.
///
/// # Errors
///
/// Returns the first failure, tagged with the stage it originated in.
pub fn build_model<E: ModelEngine>(
    engine: &mut E,
    config: &CavernConfig,
    criterion: Criterion,
    dimension: ModelDimension,
) -> Result<BuiltModel> {
    info!(%criterion, %dimension, "building model");
    let table = ParameterTable::from_config(config, criterion)?;
    for group in table.groups() {
        engine.submit(Command::Parameters(group.clone()))?;
    }

    let geometry = build_geometry(dimension, &table)?;
    for feature in geometry.features() {
        engine.submit(Command::Geometry(feature.clone()))?;
    }

    let plan = SelectionPlan::for_geometry(&geometry)?;
    for step in plan.steps() {
        engine.submit(Command::Selection(step.clone()))?;
    }
    let selections = engine.finalize()?.freeze(&EXPORTED);
    for selection in selections.iter() {
        info!(
            selection = selection.name(),
            entities = selection.sets().values().map(BTreeSet::len).sum::<usize>(),
            "selection exported"
        );
    }

    let physics = bind_physics(criterion, dimension, &selections, &table)?;
    for material in &physics.materials {
        engine.submit(Command::Material(material.clone()))?;
    }
    engine.submit(Command::Interface(physics.interface.clone()))?;
    for feature in &physics.features {
        engine.submit(Command::Physics(feature.clone()))?;
    }

    let mesh = build_mesh(dimension, &selections, &table)?;
    for feature in &mesh.features {
        engine.submit(Command::Mesh(feature.clone()))?;
    }

    let study = build_study(&physics)?;
    for step in &study.steps {
        engine.submit(Command::Study(step.clone()))?;
    }

    info!(%criterion, %dimension, "model built");
    Ok(BuiltModel {
        criterion,
        dimension,
        table,
        geometry,
        plan,
        selections,
        physics,
        mesh,
        study,
    })
}

/// Builds a model and saves it as `<dir>/<stem>.json`.
///
/// Nothing is written when any stage fails.
///
/// # Errors
///
/// Returns the first build failure, or the save failure.
pub fn build_and_save<E: ModelEngine>(
    engine: &mut E,
    config: &CavernConfig,
    criterion: Criterion,
    dimension: ModelDimension,
    dir: &Path,
) -> Result<(BuiltModel, PathBuf)> {
    let model = build_model(engine, config, criterion, dimension).map_err(|err| {
        error!(stage = %err.stage(), %err, "model build aborted, nothing saved");
        err
    })?;
    let path = dir.join(format!("{}.json", dimension.model_file_stem()));
    engine.save(&path)?;
    Ok((model, path))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{CavernError, ParameterError, Stage};
    use crate::kernel::ReferenceKernel;
    use crate::logging;
    use uom::si::f64::Length;
    use uom::si::length::meter;

    /// Records commands and fails on request.
    #[derive(Default)]
    struct Recorder {
        names: Vec<&'static str>,
        fail_on: Option<&'static str>,
    }

    impl ModelEngine for Recorder {
        fn submit(&mut self, command: Command) -> std::result::Result<(), EngineError> {
            if self.fail_on == Some(command.name()) {
                return Err(EngineError::Rejected {
                    command: command.name().into(),
                    reason: "refused".into(),
                });
            }
            self.names.push(command.name());
            Ok(())
        }

        fn finalize(&mut self) -> std::result::Result<SelectionSet, EngineError> {
            let mut kernel = ReferenceKernel::new(ModelDimension::Two, Criterion::MohrCoulomb);
            let table = ParameterTable::from_config(&CavernConfig::default(), Criterion::MohrCoulomb).unwrap();
            for group in table.groups() {
                kernel.submit(Command::Parameters(group.clone()))?;
            }
            let geometry = build_geometry(ModelDimension::Two, &table).unwrap();
            for feature in geometry.features() {
                kernel.submit(Command::Geometry(feature.clone()))?;
            }
            for step in SelectionPlan::for_geometry(&geometry)?.steps() {
                kernel.submit(Command::Selection(step.clone()))?;
            }
            kernel.finalize()
        }

        fn save(&self, _path: &Path) -> std::result::Result<(), EngineError> {
            Ok(())
        }
    }

    #[test]
    fn stages_submit_in_order() {
        logging::init_test();
        let mut engine = Recorder::default();
        let model = build_model(
            &mut engine,
            &CavernConfig::default(),
            Criterion::MohrCoulomb,
            ModelDimension::Two,
        )
        .unwrap();
        let first_material = engine.names.iter().position(|n| *n == "material").unwrap();
        let last_selection = engine.names.iter().rposition(|n| *n == "selection").unwrap();
        assert!(last_selection < first_material);
        assert_eq!(engine.names.last(), Some(&"study"));
        assert_eq!(engine.names.iter().filter(|n| **n == "study").count(), 2);
        assert_eq!(model.selections.iter().count(), EXPORTED.len());
    }

    #[test]
    fn precondition_fails_before_any_command() {
        let mut config = CavernConfig::default();
        config.geometry.arc_length = Length::new::<meter>(27.5);
        let mut engine = Recorder::default();
        let err = build_model(&mut engine, &config, Criterion::MohrCoulomb, ModelDimension::Two).unwrap_err();
        assert!(matches!(err, CavernError::Parameter(ParameterError::Precondition { parameter: "arc_length", .. })));
        assert!(engine.names.is_empty());
    }

    #[test]
    fn engine_failure_aborts_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = Recorder {
            fail_on: Some("mesh"),
            ..Recorder::default()
        };
        let err = build_and_save(
            &mut engine,
            &CavernConfig::default(),
            Criterion::MohrCoulomb,
            ModelDimension::Two,
            dir.path(),
        )
        .unwrap_err();
        assert_eq!(err.stage(), Stage::Session);
        assert!(!engine.names.contains(&"study"));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn reference_kernel_build_is_saved_under_the_model_stem() {
        let dir = tempfile::tempdir().unwrap();
        let mut kernel = ReferenceKernel::new(ModelDimension::Two, Criterion::HoekBrown);
        let (model, path) = build_and_save(
            &mut kernel,
            &CavernConfig::default(),
            Criterion::HoekBrown,
            ModelDimension::Two,
            dir.path(),
        )
        .unwrap();
        assert!(path.ends_with("2d_h2storage_model.json"));
        assert!(path.exists());
        assert!(model.physics.feature("rock1").is_some());
    }
}
