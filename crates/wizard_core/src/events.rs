//! Notifications for whatever renders the wizard.

use shared::domain::{Resource, ResourceId, ResourceKind};

use crate::{error::CommitStage, sequencer::WizardStep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    StepChanged {
        kind: ResourceKind,
        step: WizardStep,
    },
    CommitStarted {
        kind: ResourceKind,
    },
    CommitStageCompleted {
        stage: CommitStage,
        resource_id: ResourceId,
    },
    CommitSucceeded(Resource),
    CommitFailed {
        stage: Option<CommitStage>,
        message: String,
    },
}
