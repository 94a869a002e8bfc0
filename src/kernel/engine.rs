use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use super::materialize::Materializer;
use super::ScopeIndex;
use crate::criterion::Criterion;
use crate::dimension::ModelDimension;
use crate::error::{EngineError, GeometryError, Stage};
use crate::geometry::{Feature, Scope};
use crate::params::{ParameterGroup, ParameterTable};
use crate::persist::ModelDocument;
use crate::selection::{self, SelectionPlan, SelectionSet, SelectionStep, Target};
use crate::session::{Command, ModelEngine};

/// Geometry state after finalization.
#[derive(Debug, Clone)]
struct Finalized {
    selections: SelectionSet,
    entities: BTreeMap<u8, usize>,
}

/// In-process model engine.
///
/// Accepts the geometry commands, materializes them on `finalize` and then
/// validates every later command against the tagged selections. Accepted
/// commands are journaled in order and saved with the selections.
#[derive(Debug, Clone)]
pub struct ReferenceKernel {
    dimension: ModelDimension,
    criterion: Criterion,
    groups: Vec<ParameterGroup>,
    features: Vec<Feature>,
    steps: Vec<SelectionStep>,
    finalized: Option<Finalized>,
    interface: Option<&'static str>,
    physics: Vec<String>,
    journal: Vec<serde_json::Value>,
}

impl ReferenceKernel {
    #[must_use]
    pub fn new(dimension: ModelDimension, criterion: Criterion) -> Self {
        Self {
            dimension,
            criterion,
            groups: Vec::new(),
            features: Vec::new(),
            steps: Vec::new(),
            finalized: None,
            interface: None,
            physics: Vec::new(),
            journal: Vec::new(),
        }
    }

    /// Accepted commands, in submission order.
    #[must_use]
    pub fn journal(&self) -> &[serde_json::Value] {
        &self.journal
    }

    /// Model-scope selections, once finalized.
    #[must_use]
    pub fn selections(&self) -> Option<&SelectionSet> {
        self.finalized.as_ref().map(|f| &f.selections)
    }

    /// Entity count per raw dimension, once finalized.
    #[must_use]
    pub fn entities(&self) -> Option<&BTreeMap<u8, usize>> {
        self.finalized.as_ref().map(|f| &f.entities)
    }

    fn open(&self, command: &str) -> Result<(), EngineError> {
        match self.finalized {
            Some(_) => Err(EngineError::Rejected {
                command: command.to_owned(),
                reason: "geometry is already finalized".into(),
            }),
            None => Ok(()),
        }
    }

    fn model(&self) -> Result<&Finalized, EngineError> {
        self.finalized.as_ref().ok_or(EngineError::NotFinalized)
    }

    fn check_target(&self, target: &Target, stage: Stage) -> Result<(), EngineError> {
        let model = self.model()?;
        if let Target::Named { selection, kind, .. } = target {
            model.selections.require(selection, *kind, stage)?;
        }
        Ok(())
    }

    /// Tags of every feature reporting its result, work plane contents included.
    fn reporting(&self) -> Vec<String> {
        fn collect(features: &[Feature], out: &mut Vec<String>) {
            for feature in features {
                if feature.select_result {
                    out.push(feature.tag.clone());
                }
                collect(feature.children(), out);
            }
        }
        let mut tags = Vec::new();
        collect(&self.features, &mut tags);
        tags
    }
}

impl ModelEngine for ReferenceKernel {
    fn submit(&mut self, command: Command) -> Result<(), EngineError> {
        let name = command.name();
        let value = serde_json::to_value(&command)?;
        match command {
            Command::Parameters(group) => {
                self.open(name)?;
                self.groups.push(group);
            }
            Command::Geometry(feature) => {
                self.open(name)?;
                self.features.push(feature);
            }
            Command::Selection(step) => {
                self.open(name)?;
                self.steps.push(step);
            }
            Command::Material(material) => self.check_target(&material.target, Stage::Material)?,
            Command::Interface(interface) => {
                self.model()?;
                self.interface = Some(interface.tag);
            }
            Command::Physics(feature) => {
                self.check_target(&feature.target, Stage::Physics)?;
                if self.interface.is_none() {
                    return Err(EngineError::Rejected {
                        command: name.to_owned(),
                        reason: format!("{} has no physics interface to belong to", feature.tag),
                    });
                }
                self.physics.push(feature.path());
            }
            Command::Mesh(feature) => self.check_target(&feature.target, Stage::Mesh)?,
            Command::Study(step) => {
                self.model()?;
                if let Some(unknown) = step.disabled.iter().find(|p| !self.physics.contains(p)) {
                    return Err(EngineError::UnknownFeature {
                        feature: unknown.clone(),
                        stage: Stage::Study,
                    });
                }
            }
        }
        debug!(command = name, journal = self.journal.len(), "accepted");
        self.journal.push(value);
        Ok(())
    }

    fn finalize(&mut self) -> Result<SelectionSet, EngineError> {
        self.open("finalize")?;
        let table = ParameterTable::from_groups(self.groups.clone()).map_err(GeometryError::from)?;
        let plan = SelectionPlan::new(self.dimension, self.steps.clone())?;
        let store = Materializer::new(&table, &plan).run(self.dimension, &self.features)?;

        let top = match self.dimension {
            ModelDimension::Two => 2,
            ModelDimension::Three => 3,
        };
        let index = ScopeIndex::new(&store, top, self.reporting()).map_err(GeometryError::from)?;
        let selections = selection::tag(&plan, Scope::Model, &table, &index)?;
        let entities = index.counts();
        info!(
            dimension = %self.dimension,
            domains = entities.get(&top).copied().unwrap_or_default(),
            selections = selections.iter().count(),
            "geometry finalized"
        );
        self.finalized = Some(Finalized {
            selections: selections.clone(),
            entities,
        });
        Ok(selections)
    }

    fn save(&self, path: &Path) -> Result<(), EngineError> {
        let model = self.model()?;
        ModelDocument::new(
            self.dimension,
            self.criterion,
            self.journal.clone(),
            &model.selections,
            model.entities.clone(),
        )
        .write(path)
    }
}
