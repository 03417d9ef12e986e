//! Forward/back state machine over a fixed, ordered list of wizard steps.

use std::fmt;

use crate::{
    draft::Draft,
    error::{WizardError, WizardResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardStep {
    Choose,
    Configure,
    Source,
    Configuration,
    Schema,
    Target,
    Review,
}

impl WizardStep {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Choose => "Choose",
            Self::Configure => "Configure",
            Self::Source => "Source",
            Self::Configuration => "Configuration",
            Self::Schema => "Schema",
            Self::Target => "Target",
            Self::Review => "Review",
        }
    }
}

/// Per-step predicate deciding whether the wizard may move past `step`.
pub type StepGate = fn(WizardStep, &Draft) -> bool;

/// Advisory only: a blocked advance is a no-op, never an error.
#[derive(Clone)]
pub struct StepSequencer {
    steps: Vec<WizardStep>,
    index: usize,
    gate: StepGate,
}

impl fmt::Debug for StepSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepSequencer")
            .field("steps", &self.steps)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl StepSequencer {
    pub fn new(steps: Vec<WizardStep>, gate: StepGate) -> WizardResult<Self> {
        if steps.is_empty() {
            return Err(WizardError::InvalidSteps);
        }
        Ok(Self {
            steps,
            index: 0,
            gate,
        })
    }

    pub fn current(&self) -> WizardStep {
        self.steps[self.index]
    }

    /// Zero-based position of the current step.
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn steps(&self) -> &[WizardStep] {
        &self.steps
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.steps.len()
    }

    pub fn can_advance(&self, draft: &Draft) -> bool {
        !self.is_last() && (self.gate)(self.current(), draft)
    }

    /// Moves one step forward when the gate allows it. Returns whether the
    /// step changed.
    pub fn advance(&mut self, draft: &Draft) -> bool {
        if !self.can_advance(draft) {
            return false;
        }
        self.index += 1;
        true
    }

    /// Moves one step back; no-op on the first step.
    pub fn retreat(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.index -= 1;
        true
    }

    /// First step up to and including the current one whose gate no longer
    /// holds. Edits made after passing a step can invalidate it.
    pub fn first_failing_step(&self, draft: &Draft) -> Option<WizardStep> {
        self.steps[..=self.index]
            .iter()
            .copied()
            .find(|step| !(self.gate)(*step, draft))
    }

    /// Confirm is only offered on the last step, and only when every gate on
    /// the way there still holds.
    pub fn can_confirm(&self, draft: &Draft) -> bool {
        self.is_last() && self.first_failing_step(draft).is_none()
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}
