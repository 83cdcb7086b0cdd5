//! Phase transition rules for the experiment lifecycle.

use super::types::ExperimentPhase;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ExperimentPhase,
        to: ExperimentPhase,
    },
    #[error("Cannot transition from terminal phase {phase:?}")]
    FromTerminalPhase { phase: ExperimentPhase },
}

pub struct PhaseTransition;

impl PhaseTransition {
    /// Validate that a phase transition is legal.
    pub fn validate(from: ExperimentPhase, to: ExperimentPhase) -> Result<(), TransitionError> {
        if Self::is_terminal(from) {
            return Err(TransitionError::FromTerminalPhase { phase: from });
        }

        let is_valid = match (from, to) {
            // Validate outcome
            (ExperimentPhase::Created, ExperimentPhase::Validated) => true,
            (ExperimentPhase::Created, ExperimentPhase::ValidationFailed) => true,
            (ExperimentPhase::Validated, ExperimentPhase::ValidationFailed) => true,

            // Inject outcome
            (ExperimentPhase::Validated, ExperimentPhase::Injected) => true,

            // Recover outcome, including retries after a partial failure
            (ExperimentPhase::Injected, ExperimentPhase::Recovered) => true,
            (ExperimentPhase::Injected, ExperimentPhase::PartiallyRecovered) => true,
            (ExperimentPhase::PartiallyRecovered, ExperimentPhase::Recovered) => true,
            (ExperimentPhase::PartiallyRecovered, ExperimentPhase::PartiallyRecovered) => true,

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    /// Terminal phases accept no further transitions.
    pub fn is_terminal(phase: ExperimentPhase) -> bool {
        matches!(
            phase,
            ExperimentPhase::Recovered | ExperimentPhase::ValidationFailed
        )
    }

    pub fn phase_description(phase: ExperimentPhase) -> &'static str {
        match phase {
            ExperimentPhase::Created => "created",
            ExperimentPhase::Validated => "validated",
            ExperimentPhase::ValidationFailed => "validation failed",
            ExperimentPhase::Injected => "injected",
            ExperimentPhase::PartiallyRecovered => "partially recovered",
            ExperimentPhase::Recovered => "recovered",
        }
    }
}
