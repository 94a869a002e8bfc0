use std::collections::BTreeMap;

use serde::Serialize;

use crate::dimension::{EntityKind, ModelDimension};
use crate::error::SelectionError;

/// Where a region lives: the model geometry or the cavern profile sketch.
///
/// In 2D both scopes are the same plane; in 3D the profile is the work
/// plane the cavern is revolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Model,
    Profile,
}

impl Scope {
    /// Ambient dimension of the scope in a model of the given dimension.
    #[must_use]
    pub fn dimension(self, model: ModelDimension) -> ModelDimension {
        match self {
            Self::Model => model,
            Self::Profile => ModelDimension::Two,
        }
    }
}

/// Resolved addressing of one named region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionEntry {
    pub scope: Scope,
    pub kind: EntityKind,
    /// Raw entity dimension inside the scope.
    pub raw_dim: u8,
}

/// Region name to `(scope, entity kind, raw dimension)`, one lookup per region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionTable {
    dimension: ModelDimension,
    entries: BTreeMap<String, RegionEntry>,
}

impl RegionTable {
    #[must_use]
    pub fn new(dimension: ModelDimension) -> Self {
        Self {
            dimension,
            entries: BTreeMap::new(),
        }
    }

    /// Registers a region, resolving its raw dimension now.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::DimensionMismatch`] when the kind has no
    /// entities in the scope, or [`SelectionError::Duplicate`] for a name
    /// registered twice.
    pub fn insert(&mut self, name: &str, scope: Scope, kind: EntityKind) -> Result<(), SelectionError> {
        let model = self.model_dimension();
        let scope_dim = scope.dimension(model);
        let raw_dim = kind
            .raw_dimension(scope_dim)
            .ok_or_else(|| SelectionError::DimensionMismatch {
                region: name.to_owned(),
                kind,
                dimension: scope_dim,
            })?;
        if self.entries.contains_key(name) {
            return Err(SelectionError::Duplicate(name.to_owned()));
        }
        self.entries.insert(name.to_owned(), RegionEntry { scope, kind, raw_dim });
        Ok(())
    }

    /// Looks a region up.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownRegion`] for an unregistered name.
    pub fn resolve(&self, name: &str) -> Result<RegionEntry, SelectionError> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| SelectionError::UnknownRegion(name.to_owned()))
    }

    #[must_use]
    pub fn model_dimension(&self) -> ModelDimension {
        self.dimension
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegionEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
