//! The list page that owns one kind's resources and the actions run on them.

use std::sync::Arc;

use shared::{
    domain::{Resource, ResourceId, ResourceKind},
    protocol::ResourcePatch,
};
use tracing::warn;

use crate::{
    api::ResourceApi,
    edit::{self, DeleteOutcome},
    error::{CommitStage, WizardError, WizardResult},
    resource_list::ResourceList,
};

pub struct ResourcePage {
    api: Arc<dyn ResourceApi>,
    list: ResourceList,
    loading: bool,
    saving: bool,
    last_error: Option<String>,
}

impl ResourcePage {
    pub fn new(kind: ResourceKind, api: Arc<dyn ResourceApi>) -> Self {
        Self {
            api,
            list: ResourceList::new(kind),
            loading: false,
            saving: false,
            last_error: None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.list.kind()
    }

    pub fn resources(&self) -> &ResourceList {
        &self.list
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub async fn refresh(&mut self) -> WizardResult<()> {
        let kind = self.kind();
        self.loading = true;
        let result = self
            .api
            .list(kind)
            .await
            .map_err(|source| WizardError::api(CommitStage::List, source));
        self.loading = false;

        let items = self.record(result)?;
        self.list.replace_all(items);
        Ok(())
    }

    pub async fn save_edit(
        &mut self,
        resource_id: ResourceId,
        patch: ResourcePatch,
    ) -> WizardResult<Resource> {
        let current = self.lookup(resource_id)?;
        self.saving = true;
        let result = edit::save_edit(self.api.as_ref(), &current, patch).await;
        self.saving = false;

        let saved = self.record(result)?;
        self.list.upsert(saved.clone());
        Ok(saved)
    }

    pub async fn delete(&mut self, resource_id: ResourceId) -> WizardResult<DeleteOutcome> {
        let current = self.lookup(resource_id)?;
        self.saving = true;
        let result = edit::delete_resource(self.api.as_ref(), &current).await;
        self.saving = false;

        let outcome = self.record(result)?;
        match &outcome {
            DeleteOutcome::SoftDeleted(marked) => self.list.upsert(marked.clone()),
            DeleteOutcome::Removed(removed) => {
                self.list.remove(*removed);
            }
        }
        Ok(outcome)
    }

    /// Merges a resource returned by a finished wizard commit.
    pub fn apply_committed(&mut self, resource: Resource) {
        if resource.kind != self.kind() {
            warn!(
                page_kind = %self.kind(),
                resource_kind = %resource.kind,
                resource_id = resource.resource_id.0,
                "page: ignoring committed resource of another kind"
            );
            return;
        }
        self.list.upsert(resource);
    }

    fn lookup(&mut self, resource_id: ResourceId) -> WizardResult<Resource> {
        let found = self
            .list
            .get(resource_id)
            .cloned()
            .ok_or(WizardError::UnknownResource(resource_id));
        self.record(found)
    }

    fn record<T>(&mut self, result: WizardResult<T>) -> WizardResult<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(err) => {
                warn!(kind = %self.kind(), error = %err, "page: action failed");
                self.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }
}
