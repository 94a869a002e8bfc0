use super::{arc_features, cavity_rectangle, p, zero, CavernGeometry, Feature, Primitive};
use crate::dimension::ModelDimension;

/// Axisymmetric half cross-section in the `xy` plane, symmetry axis at `x = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Planar;

impl CavernGeometry for Planar {
    fn dimension(&self) -> ModelDimension {
        ModelDimension::Two
    }

    fn features(&self, with_arcs: bool) -> Vec<Feature> {
        let rock = Feature::new(
            "r1",
            "Rock_mass",
            Primitive::Rectangle {
                pos: [zero(), -p("H_model")],
                size: [p("W_model"), p("H_model")],
            },
        );
        let mut features = vec![rock];
        if with_arcs {
            features.push(cavity_rectangle("r2"));
            features.extend(arc_features("r2"));
            if let Some(del) = features.last_mut() {
                del.select_result = true;
            }
        } else {
            features.push(cavity_rectangle("r2").with_select_result());
        }
        features
    }

    fn cavity_feature(&self, with_arcs: bool) -> &'static str {
        if with_arcs {
            "del1"
        } else {
            "r2"
        }
    }

    fn boundary_regions(&self) -> &'static [&'static str] {
        &["symmetry", "faraway", "bottom"]
    }
}
