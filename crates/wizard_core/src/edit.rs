//! Changes to resources that already exist on the server.
//!
//! Live resources are never mutated in place: edits are queued in the
//! deployment bucket and deletions become a status change. Everything that
//! has not been deployed yet is edited or removed directly.

use shared::{
    domain::{Resource, ResourceId},
    protocol::ResourcePatch,
};
use tracing::info;

use crate::{
    api::ResourceApi,
    error::{CommitStage, WizardError, WizardResult},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The resource stays listed with `pending_deletion` status.
    SoftDeleted(Resource),
    /// The resource is gone from the server.
    Removed(ResourceId),
}

pub async fn save_edit(
    api: &dyn ResourceApi,
    resource: &Resource,
    patch: ResourcePatch,
) -> WizardResult<Resource> {
    let kind = resource.kind;
    let resource_id = resource.resource_id;
    if resource.status.is_live() {
        let queued = api
            .add_update_to_bucket(kind, resource_id, patch)
            .await
            .map_err(|source| WizardError::api(CommitStage::AddUpdateToBucket, source))?;
        info!(%kind, resource_id = resource_id.0, "edit: queued update for live resource");
        Ok(queued)
    } else {
        let updated = api
            .update(kind, resource_id, patch)
            .await
            .map_err(|source| WizardError::api(CommitStage::Update, source))?;
        info!(%kind, resource_id = resource_id.0, "edit: applied update");
        Ok(updated)
    }
}

pub async fn delete_resource(
    api: &dyn ResourceApi,
    resource: &Resource,
) -> WizardResult<DeleteOutcome> {
    let kind = resource.kind;
    let resource_id = resource.resource_id;
    if resource.status.is_live() {
        let marked = api
            .mark_pending_deletion(kind, resource_id)
            .await
            .map_err(|source| WizardError::api(CommitStage::MarkPendingDeletion, source))?;
        info!(%kind, resource_id = resource_id.0, "delete: marked pending deletion");
        Ok(DeleteOutcome::SoftDeleted(marked))
    } else {
        api.delete(kind, resource_id)
            .await
            .map_err(|source| WizardError::api(CommitStage::Delete, source))?;
        info!(%kind, resource_id = resource_id.0, "delete: removed");
        Ok(DeleteOutcome::Removed(resource_id))
    }
}
