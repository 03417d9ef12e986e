//! Turns a finished draft into the backend call sequence that creates it.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::domain::{Resource, ResourceId, ResourceKind, TemplateId};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    api::ResourceApi,
    draft::Draft,
    error::{CommitStage, WizardError, WizardResult},
    events::WizardEvent,
};

pub struct CommitCoordinator {
    api: Arc<dyn ResourceApi>,
    in_flight: AtomicBool,
    events: broadcast::Sender<WizardEvent>,
}

/// Releases the single-flight flag on every exit path.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl CommitCoordinator {
    pub fn new(api: Arc<dyn ResourceApi>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            in_flight: AtomicBool::new(false),
            events,
        })
    }

    pub fn api(&self) -> &Arc<dyn ResourceApi> {
        &self.api
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WizardEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: WizardEvent) {
        let _ = self.events.send(event);
    }

    fn begin(&self) -> WizardResult<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WizardError::CommitInFlight)?;
        Ok(InFlightGuard {
            flag: &self.in_flight,
        })
    }

    /// Creates the resource described by `draft` and marks it ready.
    ///
    /// Template drafts take three calls (create from template, update with
    /// the edited schema, mark ready); custom drafts take two (create, mark
    /// ready). Calls run strictly in order and the first failure stops the
    /// sequence. Nothing is rolled back: if a later call fails the created
    /// resource stays on the server and its id is reported in
    /// [`WizardError::PartialCommit`].
    pub async fn commit(&self, draft: &Draft) -> WizardResult<Resource> {
        let _guard = self.begin()?;
        let kind = draft.kind();
        self.emit(WizardEvent::CommitStarted { kind });

        let result = match draft.template_id() {
            Some(template_id) => self.commit_from_template(draft, template_id).await,
            None => self.commit_custom(draft).await,
        };

        match &result {
            Ok(resource) => {
                info!(
                    %kind,
                    resource_id = resource.resource_id.0,
                    "commit: resource ready"
                );
                self.emit(WizardEvent::CommitSucceeded(resource.clone()));
            }
            Err(err) => {
                if let WizardError::PartialCommit {
                    stage, orphaned, ..
                } = err
                {
                    warn!(
                        %kind,
                        %stage,
                        resource_id = orphaned.0,
                        "commit: aborted after resource was created; left on server"
                    );
                } else {
                    warn!(%kind, error = %err, "commit: failed");
                }
                self.emit(WizardEvent::CommitFailed {
                    stage: failed_stage(err),
                    message: err.user_message(),
                });
            }
        }
        result
    }

    async fn commit_from_template(
        &self,
        draft: &Draft,
        template_id: TemplateId,
    ) -> WizardResult<Resource> {
        let kind = draft.kind();
        let created = self
            .api
            .create_from_template(kind, template_id)
            .await
            .map_err(|source| WizardError::api(CommitStage::CreateFromTemplate, source))?;
        self.stage_completed(CommitStage::CreateFromTemplate, created.resource_id);

        let updated = self
            .api
            .update(kind, created.resource_id, draft.field_patch())
            .await
            .map_err(|source| WizardError::PartialCommit {
                stage: CommitStage::Update,
                orphaned: created.resource_id,
                source,
            })?;
        self.stage_completed(CommitStage::Update, updated.resource_id);

        self.finish(kind, updated.resource_id).await
    }

    async fn commit_custom(&self, draft: &Draft) -> WizardResult<Resource> {
        let created = self
            .api
            .create(draft.create_request())
            .await
            .map_err(|source| WizardError::api(CommitStage::Create, source))?;
        self.stage_completed(CommitStage::Create, created.resource_id);

        self.finish(draft.kind(), created.resource_id).await
    }

    async fn finish(&self, kind: ResourceKind, resource_id: ResourceId) -> WizardResult<Resource> {
        let ready = self
            .api
            .mark_ready(kind, resource_id)
            .await
            .map_err(|source| WizardError::PartialCommit {
                stage: CommitStage::MarkReady,
                orphaned: resource_id,
                source,
            })?;
        self.stage_completed(CommitStage::MarkReady, ready.resource_id);
        Ok(ready)
    }

    fn stage_completed(&self, stage: CommitStage, resource_id: ResourceId) {
        self.emit(WizardEvent::CommitStageCompleted { stage, resource_id });
    }
}

fn failed_stage(err: &WizardError) -> Option<CommitStage> {
    match err {
        WizardError::Api { stage, .. } | WizardError::PartialCommit { stage, .. } => Some(*stage),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/commit_tests.rs"]
mod tests;
