use super::{arc_features, cavity_rectangle, p, zero, CavernGeometry, Feature, Primitive, QuickPlane};
use crate::dimension::ModelDimension;
use crate::params::Expr;

/// Quarter-symmetry block with the cavern revolved by 90 degrees about the
/// vertical axis `x = y = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuarterRevolved;

impl CavernGeometry for QuarterRevolved {
    fn dimension(&self) -> ModelDimension {
        ModelDimension::Three
    }

    fn features(&self, with_arcs: bool) -> Vec<Feature> {
        let rock = Feature::new(
            "blk1",
            "Rock_mass",
            Primitive::Block {
                pos: [zero(), zero(), -p("H_model")],
                size: [p("W_model"), p("W_model"), p("H_model")],
            },
        );

        // The work plane holds its own feature sequence; tags restart there.
        let mut profile = vec![cavity_rectangle("r1")];
        if with_arcs {
            profile.extend(arc_features("r1"));
        }
        let work_plane = Feature::new(
            "wp1",
            "Work Plane for creating storage geom.",
            Primitive::WorkPlane {
                plane: QuickPlane::Xz,
                features: profile,
            },
        );

        let revolve = Feature::new(
            "rev1",
            "3D_storage [1/4]",
            Primitive::Revolve {
                input: "wp1".into(),
                angle: Expr::Literal(90.0),
            },
        )
        .with_select_result();

        vec![rock, work_plane, revolve]
    }

    fn cavity_feature(&self, _with_arcs: bool) -> &'static str {
        "rev1"
    }

    fn boundary_regions(&self) -> &'static [&'static str] {
        &["symmetry_xz", "symmetry_yz", "faraway_xz", "faraway_yz", "bottom"]
    }
}
