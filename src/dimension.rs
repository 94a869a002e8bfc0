use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ambient dimension of a model or of a sketch scope inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelDimension {
    #[serde(rename = "2d")]
    Two,
    #[serde(rename = "3d")]
    Three,
}

impl ModelDimension {
    /// Number of spatial axes.
    #[must_use]
    pub fn axes(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Stem of the persisted model file.
    #[must_use]
    pub fn model_file_stem(self) -> &'static str {
        match self {
            Self::Two => "2d_h2storage_model",
            Self::Three => "3d_h2storage_model",
        }
    }
}

impl fmt::Display for ModelDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Two => f.write_str("2d"),
            Self::Three => f.write_str("3d"),
        }
    }
}

impl FromStr for ModelDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "2d" => Ok(Self::Two),
            "3d" => Ok(Self::Three),
            other => Err(format!("unknown model dimension '{other}', expected 2d or 3d")),
        }
    }
}

/// Logical entity kind, relative to the ambient dimension.
///
/// The raw entity dimension of a kind depends on the scope: a boundary is a
/// curve in 2D and a face in 3D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Domain,
    Boundary,
    Edge,
    Vertex,
}

impl EntityKind {
    /// Resolves the raw entity dimension in a scope of the given dimension.
    ///
    /// Returns `None` when the kind has no entities in that scope (edges in 2D
    /// coincide with boundaries and are not addressable on their own).
    #[must_use]
    pub fn raw_dimension(self, scope: ModelDimension) -> Option<u8> {
        match (self, scope) {
            (Self::Domain, ModelDimension::Two) => Some(2),
            (Self::Domain, ModelDimension::Three) => Some(3),
            (Self::Boundary, ModelDimension::Two) => Some(1),
            (Self::Boundary, ModelDimension::Three) => Some(2),
            (Self::Edge, ModelDimension::Two) => None,
            (Self::Edge, ModelDimension::Three) => Some(1),
            (Self::Vertex, _) => Some(0),
        }
    }

    /// Engine suffix used when a selection is addressed at this kind.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Domain => "dom",
            Self::Boundary => "bnd",
            Self::Edge => "edg",
            Self::Vertex => "pnt",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Domain => "domain",
            Self::Boundary => "boundary",
            Self::Edge => "edge",
            Self::Vertex => "vertex",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_curve_in_2d_and_face_in_3d() {
        assert_eq!(EntityKind::Boundary.raw_dimension(ModelDimension::Two), Some(1));
        assert_eq!(EntityKind::Boundary.raw_dimension(ModelDimension::Three), Some(2));
        assert_eq!(EntityKind::Domain.raw_dimension(ModelDimension::Three), Some(3));
    }

    #[test]
    fn edges_do_not_exist_in_2d() {
        assert_eq!(EntityKind::Edge.raw_dimension(ModelDimension::Two), None);
    }

    #[test]
    fn dimension_parses_case_insensitively() {
        assert_eq!("3D".parse::<ModelDimension>(), Ok(ModelDimension::Three));
        assert!("4d".parse::<ModelDimension>().is_err());
    }
}
