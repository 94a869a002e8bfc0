use serde::Serialize;

use crate::dimension::EntityKind;
use crate::params::Expr;

/// A geometry construction step, identified by a tag such as `r1` or `qb2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub tag: String,
    pub label: String,
    pub primitive: Primitive,
    /// Whether the feature's resulting object is usable as a selection.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub select_result: bool,
}

impl Feature {
    #[must_use]
    pub fn new(tag: impl Into<String>, label: impl Into<String>, primitive: Primitive) -> Self {
        Self {
            tag: tag.into(),
            label: label.into(),
            primitive,
            select_result: false,
        }
    }

    /// Turns on the selection result of this feature.
    #[must_use]
    pub fn with_select_result(mut self) -> Self {
        self.select_result = true;
        self
    }

    /// Features nested in a work plane, empty for every other primitive.
    #[must_use]
    pub fn children(&self) -> &[Feature] {
        match &self.primitive {
            Primitive::WorkPlane { features, .. } => features,
            _ => &[],
        }
    }

    /// Tags of earlier objects this feature consumes.
    #[must_use]
    pub fn inputs(&self) -> Vec<&str> {
        match &self.primitive {
            Primitive::ConvertToSolid { inputs } => inputs.iter().map(String::as_str).collect(),
            Primitive::Delete { input, .. } | Primitive::Revolve { input, .. } => vec![input.as_str()],
            _ => Vec::new(),
        }
    }

    /// Every expression the feature evaluates, nested features included.
    #[must_use]
    pub fn expressions(&self) -> Vec<&Expr> {
        match &self.primitive {
            Primitive::Rectangle { pos, size } => pos.iter().chain(size).collect(),
            Primitive::Block { pos, size } => pos.iter().chain(size).collect(),
            Primitive::QuadraticBezier { points } => points.iter().flatten().collect(),
            Primitive::Revolve { angle, .. } => vec![angle],
            Primitive::WorkPlane { features, .. } => features.iter().flat_map(Feature::expressions).collect(),
            Primitive::ConvertToSolid { .. } | Primitive::Delete { .. } => Vec::new(),
        }
    }
}

/// Standard plane a work plane is aligned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickPlane {
    /// Local `(u, v)` maps to global `(u, 0, v)`.
    Xz,
}

/// Geometry primitive with its parameter expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Primitive {
    /// Axis-aligned rectangle with lower-left corner `pos`.
    Rectangle { pos: [Expr; 2], size: [Expr; 2] },
    /// Axis-aligned block with lowest corner `pos`.
    Block { pos: [Expr; 3], size: [Expr; 3] },
    /// A planar sketch embedded in 3D.
    WorkPlane { plane: QuickPlane, features: Vec<Feature> },
    /// Quadratic Bézier curve through three control points `(x, y)`.
    QuadraticBezier { points: [[Expr; 2]; 3] },
    /// Partitions the solid among `inputs` by the curves among them.
    ConvertToSolid { inputs: Vec<String> },
    /// Removes the entities of `input` selected by a named selection.
    Delete {
        input: String,
        selection: String,
        kind: EntityKind,
    },
    /// Revolves the result of a work plane about its vertical axis.
    Revolve { input: String, angle: Expr },
}

impl Primitive {
    /// Engine type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Rectangle { .. } => "Rectangle",
            Self::Block { .. } => "Block",
            Self::WorkPlane { .. } => "WorkPlane",
            Self::QuadraticBezier { .. } => "QuadraticBezier",
            Self::ConvertToSolid { .. } => "ConvertToSolid",
            Self::Delete { .. } => "Delete",
            Self::Revolve { .. } => "Revolve",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_expressions_in_engine_syntax() {
        let f = Feature::new(
            "r2",
            "Storage",
            Primitive::Rectangle {
                pos: [Expr::Literal(0.0), Expr::param("storage_depth") - Expr::param("storage_height")],
                size: [Expr::param("storage_radius"), Expr::param("storage_height")],
            },
        );
        let json = serde_json::to_value(&f).unwrap_or_default();
        assert_eq!(json["primitive"]["type"], "Rectangle");
        assert_eq!(json["primitive"]["pos"][1], "storage_depth-storage_height");
        assert!(json.get("select_result").is_none());
    }

    #[test]
    fn inputs_and_children() {
        let del = Feature::new(
            "del1",
            "Delete",
            Primitive::Delete {
                input: "csol1".into(),
                selection: "arc_corners".into(),
                kind: EntityKind::Domain,
            },
        );
        assert_eq!(del.inputs(), vec!["csol1"]);
        assert!(del.children().is_empty());
    }
}
