use std::fmt;

use thiserror::Error;

use crate::dimension::{EntityKind, ModelDimension};

/// Top-level error type for cavern model construction.
#[derive(Debug, Error)]
pub enum CavernError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CavernError {
    /// Returns the pipeline stage the error originated in.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Parameter(_) | Self::Config(_) => Stage::Parameters,
            Self::Geometry(_) => Stage::Geometry,
            Self::Selection(err) => err.stage().unwrap_or(Stage::Selection),
            Self::Engine(err) => err.stage().unwrap_or(Stage::Session),
        }
    }
}

/// Pipeline stage, used to report where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Parameters,
    Geometry,
    Selection,
    Material,
    Physics,
    Mesh,
    Study,
    Session,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parameters => "parameters",
            Self::Geometry => "geometry",
            Self::Selection => "selection",
            Self::Material => "material",
            Self::Physics => "physics",
            Self::Mesh => "mesh",
            Self::Study => "study",
            Self::Session => "session",
        };
        f.write_str(name)
    }
}

/// Parameter precondition violations, raised before any geometry is built.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("parameter {parameter} violates a precondition: {reason}")]
    Precondition {
        parameter: &'static str,
        reason: String,
    },

    #[error("parameter {parameter} is not a finite number")]
    NonFinite { parameter: &'static str },

    #[error("undefined parameter: {0}")]
    Undefined(String),

    #[error("parameter {0} is defined twice")]
    Duplicate(String),
}

/// Errors raised while constructing or materializing geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("feature {feature}: curves touch or cross each other")]
    SelfIntersecting { feature: String },

    #[error("feature {feature}: profile is not closed at ({x}, {y})")]
    OpenProfile { feature: String, x: f64, y: f64 },

    #[error("feature {feature}: {reason}")]
    InvalidInput { feature: String, reason: String },

    #[error("unknown geometry feature: {0}")]
    UnknownFeature(String),

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Errors from topology store operations.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("expected a {expected}-dimensional entity, found {found}")]
    WrongDimension { expected: u8, found: u8 },
}

/// Errors raised while resolving or consuming named selections.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("unknown selection region: {0}")]
    UnknownRegion(String),

    #[error("region {region}: {kind} entities do not exist in a {dimension} scope")]
    DimensionMismatch {
        region: String,
        kind: EntityKind,
        dimension: ModelDimension,
    },

    #[error("region {region}: box has {found} axes, the {dimension} scope needs {expected}")]
    BoxMismatch {
        region: String,
        found: usize,
        expected: usize,
        dimension: ModelDimension,
    },

    #[error("selection {name} is not defined when the {stage} stage needs it ({dimension} model)")]
    Undefined {
        name: String,
        stage: Stage,
        dimension: ModelDimension,
    },

    #[error("selection {name} has no {kind} entities when the {stage} stage needs it ({dimension} model)")]
    Empty {
        name: String,
        kind: EntityKind,
        stage: Stage,
        dimension: ModelDimension,
    },

    #[error("selection {name} is referenced before it is populated")]
    ForwardReference { name: String },

    #[error("selection {0} is declared twice")]
    Duplicate(String),

    #[error("feature {0} does not report its result as a selection")]
    NoSelectionResult(String),

    #[error("selections were tagged on a {found} model, the {stage} stage builds a {expected} model")]
    ScopeMismatch {
        expected: ModelDimension,
        found: ModelDimension,
        stage: Stage,
    },

    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

impl SelectionError {
    fn stage(&self) -> Option<Stage> {
        match self {
            Self::Undefined { stage, .. } | Self::Empty { stage, .. } | Self::ScopeMismatch { stage, .. } => {
                Some(*stage)
            }
            _ => None,
        }
    }
}

/// Failures reported by the engine collaborator or the session around it.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine rejected {command}: {reason}")]
    Rejected { command: String, reason: String },

    #[error("engine geometry failure: {0}")]
    Geometry(#[from] GeometryError),

    #[error("engine selection failure: {0}")]
    Selection(#[from] SelectionError),

    #[error("geometry has not been finalized")]
    NotFinalized,

    #[error("study step {step} did not converge")]
    Solve { step: String },

    #[error("unknown physics feature {feature} referenced by {stage}")]
    UnknownFeature { feature: String, stage: Stage },

    #[error("failed to write model: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("not a cavern model document: format is {0:?}")]
    UnknownFormat(String),

    #[error("model document version {file_version} is newer than supported version {supported_version}")]
    FutureVersion { file_version: u32, supported_version: u32 },
}

impl EngineError {
    fn stage(&self) -> Option<Stage> {
        match self {
            Self::Geometry(_) | Self::NotFinalized => Some(Stage::Geometry),
            Self::Selection(err) => err.stage().or(Some(Stage::Selection)),
            Self::Solve { .. } => Some(Stage::Study),
            Self::UnknownFeature { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience type alias for results using [`CavernError`].
pub type Result<T> = std::result::Result<T, CavernError>;
