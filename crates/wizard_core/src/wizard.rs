//! One open creation wizard: the draft being built, where the user is in the
//! step list, and the hand-off to the commit coordinator.

use std::sync::Arc;

use shared::domain::{FieldId, FieldSpec, Resource, ResourceKind, SourceType, Template};
use tracing::{debug, info};

use crate::{
    commit::CommitCoordinator,
    draft::Draft,
    error::{WizardError, WizardResult},
    events::WizardEvent,
    field_editor::{self, FieldPatch},
    flows,
    page::ResourcePage,
    sequencer::{StepSequencer, WizardStep},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStatus {
    Editing,
    Saving,
    Closed,
}

pub struct DraftWizard {
    kind: ResourceKind,
    draft: Option<Draft>,
    sequencer: StepSequencer,
    coordinator: Arc<CommitCoordinator>,
    status: WizardStatus,
    error: Option<String>,
}

impl DraftWizard {
    pub fn open(kind: ResourceKind, coordinator: Arc<CommitCoordinator>) -> WizardResult<Self> {
        let sequencer = flows::sequencer_for(kind)?;
        debug!(%kind, step = sequencer.current().label(), "wizard: opened");
        Ok(Self {
            kind,
            draft: Some(Draft::new(kind)),
            sequencer,
            coordinator,
            status: WizardStatus::Editing,
            error: None,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status != WizardStatus::Closed
    }

    /// `None` once the wizard has closed.
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_step(&self) -> WizardStep {
        self.sequencer.current()
    }

    pub fn steps(&self) -> &[WizardStep] {
        self.sequencer.steps()
    }

    pub fn on_last_step(&self) -> bool {
        self.sequencer.is_last()
    }

    pub fn can_advance(&self) -> bool {
        self.draft
            .as_ref()
            .is_some_and(|draft| self.sequencer.can_advance(draft))
    }

    pub fn can_confirm(&self) -> bool {
        self.status == WizardStatus::Editing
            && !self.coordinator.is_in_flight()
            && self
                .draft
                .as_ref()
                .is_some_and(|draft| self.sequencer.can_confirm(draft))
    }

    /// Starts over from `template`'s defaults.
    pub fn choose_template(&mut self, template: &Template) -> WizardResult<()> {
        if template.kind != self.kind {
            return Err(WizardError::UnknownTemplate(template.template_id));
        }
        self.replace(|_| Draft::from_template(template))
    }

    /// Switches to custom mode; a draft that is already custom keeps its edits.
    pub fn choose_custom(&mut self) -> WizardResult<()> {
        let kind = self.kind;
        self.replace(|draft| {
            if draft.is_custom() {
                draft.clone()
            } else {
                Draft::custom(kind)
            }
        })
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) -> WizardResult<()> {
        let display_name = display_name.into();
        self.replace(|draft| draft.clone().with_display_name(display_name))
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> WizardResult<()> {
        let description = description.into();
        self.replace(|draft| draft.clone().with_description(description))
    }

    pub fn set_source_type(&mut self, source_type: SourceType) -> WizardResult<()> {
        self.replace(|draft| draft.clone().with_source_type(source_type))
    }

    /// Appends a blank field and returns its id.
    pub fn add_field(&mut self) -> WizardResult<FieldId> {
        self.replace(field_editor::add_field)?;
        self.draft
            .as_ref()
            .and_then(|draft| draft.fields().last())
            .map(|field| field.id)
            .ok_or(WizardError::Closed)
    }

    pub fn update_field(&mut self, id: FieldId, patch: &FieldPatch) -> WizardResult<()> {
        self.replace(|draft| field_editor::update_field(draft, id, patch))
    }

    /// Replaces every field, including a template's defaults.
    pub fn replace_fields(&mut self, fields: &[FieldSpec]) -> WizardResult<()> {
        self.replace(|draft| field_editor::replace_fields(draft, fields))
    }

    pub fn remove_field(&mut self, id: FieldId) -> WizardResult<()> {
        self.replace(|draft| field_editor::remove_field(draft, id))
    }

    /// Moves forward if the current step's gate passes. `Ok(false)` means the
    /// gate held the wizard where it was.
    pub fn advance(&mut self) -> WizardResult<bool> {
        let draft = open_draft(&self.draft, self.status)?;
        let moved = self.sequencer.advance(draft);
        if moved {
            self.step_changed();
        }
        Ok(moved)
    }

    pub fn retreat(&mut self) -> WizardResult<bool> {
        open_draft(&self.draft, self.status)?;
        let moved = self.sequencer.retreat();
        if moved {
            self.step_changed();
        }
        Ok(moved)
    }

    /// Commits the draft and merges the result into `page`.
    ///
    /// On success the wizard closes and the draft is dropped. On failure the
    /// draft is kept, the wizard returns to editing and [`Self::error`] holds
    /// the message to show. Dropping the returned future part way through
    /// abandons the remaining backend calls and leaves the wizard in
    /// [`WizardStatus::Saving`]; spawn it if it must run to completion.
    pub async fn confirm(&mut self, page: &mut ResourcePage) -> WizardResult<Resource> {
        let draft = open_draft(&self.draft, self.status)?.clone();
        if !self.sequencer.is_last() {
            return Err(WizardError::NotReady(self.sequencer.current()));
        }
        if let Some(step) = self.sequencer.first_failing_step(&draft) {
            return Err(WizardError::NotReady(step));
        }

        self.status = WizardStatus::Saving;
        self.error = None;
        match self.coordinator.commit(&draft).await {
            Ok(resource) => {
                page.apply_committed(resource.clone());
                self.close();
                info!(
                    kind = %self.kind,
                    resource_id = resource.resource_id.0,
                    "wizard: committed and closed"
                );
                Ok(resource)
            }
            Err(err) => {
                self.status = WizardStatus::Editing;
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Closes without committing. Anything entered is discarded.
    pub fn cancel(&mut self) {
        if self.is_open() {
            debug!(kind = %self.kind, "wizard: cancelled");
        }
        self.close();
    }

    fn close(&mut self) {
        self.status = WizardStatus::Closed;
        self.draft = None;
        self.sequencer.reset();
    }

    fn replace(&mut self, edit: impl FnOnce(&Draft) -> Draft) -> WizardResult<()> {
        let next = edit(open_draft(&self.draft, self.status)?);
        self.draft = Some(next);
        Ok(())
    }

    fn step_changed(&self) {
        let step = self.sequencer.current();
        debug!(kind = %self.kind, step = step.label(), "wizard: step changed");
        self.coordinator.emit(WizardEvent::StepChanged {
            kind: self.kind,
            step,
        });
    }
}

fn open_draft(draft: &Option<Draft>, status: WizardStatus) -> WizardResult<&Draft> {
    match (draft, status) {
        (Some(draft), WizardStatus::Editing | WizardStatus::Saving) => Ok(draft),
        _ => Err(WizardError::Closed),
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
