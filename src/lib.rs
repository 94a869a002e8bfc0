pub mod criterion;
pub mod dimension;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod logging;
pub mod math;
pub mod mesh;
pub mod params;
pub mod persist;
pub mod physics;
pub mod selection;
pub mod session;
pub mod study;
pub mod topology;

pub use criterion::Criterion;
pub use dimension::{EntityKind, ModelDimension};
pub use error::{CavernError, Result};
pub use kernel::ReferenceKernel;
pub use params::CavernConfig;
pub use session::{build_and_save, build_model, BuiltModel, Command, ModelEngine};
