use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::dimension::{EntityKind, ModelDimension};
use crate::error::{SelectionError, Stage};

/// A persistent, named accumulation of entity numbers per raw dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamedSelection {
    name: String,
    sets: BTreeMap<u8, BTreeSet<usize>>,
    /// Labels of everything that contributed, in order.
    contributions: Vec<String>,
}

impl NamedSelection {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds entities of raw dimension `dim`, recording who contributed.
    pub fn add(&mut self, dim: u8, entities: impl IntoIterator<Item = usize>, contributor: &str) {
        self.sets.entry(dim).or_default().extend(entities);
        self.contributions.push(contributor.to_owned());
    }

    /// Entity numbers of raw dimension `dim`, ascending.
    pub fn entities(&self, dim: u8) -> impl Iterator<Item = usize> + '_ {
        self.sets.get(&dim).into_iter().flatten().copied()
    }

    #[must_use]
    pub fn sets(&self) -> &BTreeMap<u8, BTreeSet<usize>> {
        &self.sets
    }

    #[must_use]
    pub fn contributions(&self) -> &[String] {
        &self.contributions
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.values().all(BTreeSet::is_empty)
    }
}

/// Selections of one scope while they are being populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    dimension: ModelDimension,
    selections: BTreeMap<String, NamedSelection>,
}

impl SelectionSet {
    #[must_use]
    pub fn new(dimension: ModelDimension) -> Self {
        Self {
            dimension,
            selections: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn dimension(&self) -> ModelDimension {
        self.dimension
    }

    /// The selection called `name`, created empty on first use.
    pub fn entry(&mut self, name: &str) -> &mut NamedSelection {
        self.selections
            .entry(name.to_owned())
            .or_insert_with(|| NamedSelection::new(name))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NamedSelection> {
        self.selections.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedSelection> {
        self.selections.values()
    }

    /// Non-empty entities of `name` at `kind`, for a consumer in `stage`.
    ///
    /// # Errors
    ///
    /// See [`FrozenSelections::require`].
    pub fn require(&self, name: &str, kind: EntityKind, stage: Stage) -> Result<&BTreeSet<usize>, SelectionError> {
        require(&self.selections, self.dimension, name, kind, stage)
    }

    /// Ends population, keeping only the listed selections.
    #[must_use]
    pub fn freeze(mut self, keep: &[&str]) -> FrozenSelections {
        self.selections.retain(|name, _| keep.contains(&name.as_str()));
        FrozenSelections {
            dimension: self.dimension,
            selections: self.selections,
        }
    }
}

/// Read-only selections handed to materials, physics and mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrozenSelections {
    dimension: ModelDimension,
    selections: BTreeMap<String, NamedSelection>,
}

impl FrozenSelections {
    #[must_use]
    pub fn dimension(&self) -> ModelDimension {
        self.dimension
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NamedSelection> {
        self.selections.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedSelection> {
        self.selections.values()
    }

    /// Non-empty entities of `name` at `kind`, for a consumer in `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Undefined`] for an unknown name,
    /// [`SelectionError::DimensionMismatch`] when the kind does not exist in
    /// the model, and [`SelectionError::Empty`] when nothing of that kind was
    /// tagged.
    pub fn require(&self, name: &str, kind: EntityKind, stage: Stage) -> Result<&BTreeSet<usize>, SelectionError> {
        require(&self.selections, self.dimension, name, kind, stage)
    }

    /// A checked reference to `name` at `kind`, for a consumer in `stage`.
    ///
    /// # Errors
    ///
    /// Same as [`FrozenSelections::require`].
    pub fn target(&self, name: &str, kind: EntityKind, stage: Stage) -> Result<Target, SelectionError> {
        let entities = self.require(name, kind, stage)?.len();
        Ok(Target::Named {
            selection: name.to_owned(),
            kind,
            entities,
        })
    }
}

/// What a material, physics feature or mesh feature applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "on", rename_all = "kebab-case")]
pub enum Target {
    /// The whole model, no geometric selection.
    Global,
    /// Every domain.
    AllDomains,
    /// Whatever earlier features of the same sequence left untouched.
    Remaining,
    /// A frozen named selection at one entity kind.
    Named {
        selection: String,
        kind: EntityKind,
        entities: usize,
    },
}

impl Target {
    /// Engine name of the selection, `geom1_<name>_<suffix>`.
    #[must_use]
    pub fn engine_name(&self) -> Option<String> {
        match self {
            Self::Named { selection, kind, .. } => Some(format!("geom1_{selection}_{}", kind.suffix())),
            _ => None,
        }
    }

    /// Name of the referenced selection, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        match self {
            Self::Named { selection, .. } => Some(selection),
            _ => None,
        }
    }
}

fn require<'a>(
    selections: &'a BTreeMap<String, NamedSelection>,
    dimension: ModelDimension,
    name: &str,
    kind: EntityKind,
    stage: Stage,
) -> Result<&'a BTreeSet<usize>, SelectionError> {
    let selection = selections.get(name).ok_or_else(|| SelectionError::Undefined {
        name: name.to_owned(),
        stage,
        dimension,
    })?;
    let raw = kind
        .raw_dimension(dimension)
        .ok_or_else(|| SelectionError::DimensionMismatch {
            region: name.to_owned(),
            kind,
            dimension,
        })?;
    selection
        .sets
        .get(&raw)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SelectionError::Empty {
            name: name.to_owned(),
            kind,
            stage,
            dimension,
        })
}
