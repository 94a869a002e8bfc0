//! Two-phase study: the initial stress state, then excavation and
//! pressurization.

use serde::Serialize;
use tracing::{error, info};

use crate::error::{EngineError, Result, Stage};
use crate::physics::{PhysicsDescription, PhysicsFeature, INTERFACE};

/// Study phase, `Initial` then `Excavated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyPhase {
    Initial,
    Excavated,
}

impl StudyPhase {
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Initial => "std1",
            Self::Excavated => "std2",
        }
    }

    /// Tag of the solution the phase produces.
    #[must_use]
    pub fn solution(self) -> &'static str {
        match self {
            Self::Initial => "sol1",
            Self::Excavated => "sol2",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Initial => "Study: Before h2storage excavation",
            Self::Excavated => "Study: After h2storage excavation",
        }
    }

    /// The following phase; `Excavated` is terminal.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Initial => Some(Self::Excavated),
            Self::Excavated => None,
        }
    }
}

/// A stationary study step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyStep {
    pub phase: StudyPhase,
    pub tag: &'static str,
    pub label: &'static str,
    pub step: &'static str,
    /// Physics interface solved for, e.g. `/physics/solid`.
    pub solve_for: String,
    /// Paths of the physics features switched off in this phase.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,
    /// Solution the initial stress is read from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_stress_from: Option<&'static str>,
}

/// Runs one study step.
pub trait PhaseSolver {
    /// Solves `step`.
    ///
    /// # Errors
    ///
    /// Returns an error if the step does not converge.
    fn solve(&mut self, step: &StudyStep) -> std::result::Result<(), EngineError>;
}

/// The ordered study steps of one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyPlan {
    pub steps: Vec<StudyStep>,
}

impl StudyPlan {
    #[must_use]
    pub fn step(&self, phase: StudyPhase) -> Option<&StudyStep> {
        self.steps.iter().find(|s| s.phase == phase)
    }

    /// Solves the phases in order, stopping at the first failure.
    ///
    /// Returns the last phase solved.
    ///
    /// # Errors
    ///
    /// Returns the solver error of the failing phase.
    pub fn run(&self, solver: &mut dyn PhaseSolver) -> std::result::Result<StudyPhase, EngineError> {
        let mut phase = Some(StudyPhase::Initial);
        let mut solved = None;
        while let Some(current) = phase {
            let step = self.step(current).ok_or_else(|| EngineError::Rejected {
                command: current.tag().to_owned(),
                reason: "study has no step for this phase".into(),
            })?;
            if let Err(err) = solver.solve(step) {
                error!(study = step.tag, %err, "study phase failed");
                return Err(err);
            }
            info!(study = step.tag, "study phase solved");
            solved = Some(current);
            phase = current.next();
        }
        Ok(solved.unwrap_or(StudyPhase::Excavated))
    }
}

/// Features disabled before excavation: the initial stress, the activation,
/// the pressure load and the lining.
const DISABLED_BEFORE_EXCAVATION: [&str; 4] = ["iss1", "act1", "bndl1", "tl1"];

/// Builds the two study phases over `physics`.
///
/// # Errors
///
/// Returns [`EngineError::UnknownFeature`] if a feature to disable is not
/// part of the physics description.
pub fn build_study(physics: &PhysicsDescription) -> Result<StudyPlan> {
    let disabled = DISABLED_BEFORE_EXCAVATION
        .iter()
        .map(|tag| {
            physics
                .feature(tag)
                .map(PhysicsFeature::path)
                .ok_or_else(|| EngineError::UnknownFeature {
                    feature: (*tag).to_owned(),
                    stage: Stage::Study,
                })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let step = |phase: StudyPhase, disabled: Vec<String>, initial_stress_from| StudyStep {
        phase,
        tag: phase.tag(),
        label: phase.label(),
        step: "stat",
        solve_for: format!("/physics/{INTERFACE}"),
        disabled,
        initial_stress_from,
    };
    let plan = StudyPlan {
        steps: vec![
            step(StudyPhase::Initial, disabled, None),
            step(StudyPhase::Excavated, Vec::new(), Some(StudyPhase::Initial.solution())),
        ],
    };
    info!(phases = plan.steps.len(), "study built");
    Ok(plan)
}
