//! Saved model documents: the command journal plus the tagged selections.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::criterion::Criterion;
use crate::dimension::ModelDimension;
use crate::error::EngineError;
use crate::selection::SelectionSet;

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// Format identifier written into every document.
pub const FORMAT: &str = "cavern-model";

/// A saved model, as written by the reference kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub format: String,
    pub version: u32,
    pub dimension: ModelDimension,
    pub criterion: Criterion,
    /// Every accepted command, in submission order.
    pub journal: Vec<serde_json::Value>,
    /// Entity numbers per selection and raw dimension.
    pub selections: BTreeMap<String, BTreeMap<u8, Vec<usize>>>,
    /// Entity count per raw dimension of the finished geometry.
    pub entities: BTreeMap<u8, usize>,
}

impl ModelDocument {
    #[must_use]
    pub fn new(
        dimension: ModelDimension,
        criterion: Criterion,
        journal: Vec<serde_json::Value>,
        selections: &SelectionSet,
        entities: BTreeMap<u8, usize>,
    ) -> Self {
        let selections = selections
            .iter()
            .map(|s| {
                let sets = s
                    .sets()
                    .iter()
                    .map(|(dim, set)| (*dim, set.iter().copied().collect()))
                    .collect();
                (s.name().to_owned(), sets)
            })
            .collect();
        Self {
            format: FORMAT.to_owned(),
            version: FORMAT_VERSION,
            dimension,
            criterion,
            journal,
            selections,
            entities,
        }
    }

    /// Serializes the document to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the document to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write(&self, path: &Path) -> Result<(), EngineError> {
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), commands = self.journal.len(), "model saved");
        Ok(())
    }

    /// Parses a document, checking its format identifier and version.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownFormat`] for foreign documents and
    /// [`EngineError::FutureVersion`] for documents newer than this build.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let document: Self = serde_json::from_str(json)?;
        if document.format != FORMAT {
            return Err(EngineError::UnknownFormat(document.format));
        }
        if document.version > FORMAT_VERSION {
            return Err(EngineError::FutureVersion {
                file_version: document.version,
                supported_version: FORMAT_VERSION,
            });
        }
        Ok(document)
    }

    /// Reads a document from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid document.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}
