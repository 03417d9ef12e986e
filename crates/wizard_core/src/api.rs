use async_trait::async_trait;
use shared::{
    domain::{Resource, ResourceId, ResourceKind, Template, TemplateId},
    protocol::{CreateResourceRequest, ResourcePatch},
};

use crate::error::ApiFailure;

pub type ApiResult<T> = std::result::Result<T, ApiFailure>;

/// Backend operations the wizard and resource pages rely on.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn list_templates(&self, kind: ResourceKind) -> ApiResult<Vec<Template>>;
    async fn list(&self, kind: ResourceKind) -> ApiResult<Vec<Resource>>;
    async fn create(&self, request: CreateResourceRequest) -> ApiResult<Resource>;
    async fn create_from_template(
        &self,
        kind: ResourceKind,
        template_id: TemplateId,
    ) -> ApiResult<Resource>;
    async fn update(
        &self,
        kind: ResourceKind,
        resource_id: ResourceId,
        patch: ResourcePatch,
    ) -> ApiResult<Resource>;
    async fn mark_ready(&self, kind: ResourceKind, resource_id: ResourceId) -> ApiResult<Resource>;
    async fn add_update_to_bucket(
        &self,
        kind: ResourceKind,
        resource_id: ResourceId,
        patch: ResourcePatch,
    ) -> ApiResult<Resource>;
    async fn mark_pending_deletion(
        &self,
        kind: ResourceKind,
        resource_id: ResourceId,
    ) -> ApiResult<Resource>;
    async fn delete(&self, kind: ResourceKind, resource_id: ResourceId) -> ApiResult<()>;
}

/// Stand-in used until a backend is configured; every call fails.
pub struct MissingResourceApi;

fn unavailable<T>(operation: &str, kind: ResourceKind) -> ApiResult<T> {
    Err(ApiFailure::Unavailable(format!(
        "no backend configured for {operation} on {kind}"
    )))
}

#[async_trait]
impl ResourceApi for MissingResourceApi {
    async fn list_templates(&self, kind: ResourceKind) -> ApiResult<Vec<Template>> {
        unavailable("list_templates", kind)
    }

    async fn list(&self, kind: ResourceKind) -> ApiResult<Vec<Resource>> {
        unavailable("list", kind)
    }

    async fn create(&self, request: CreateResourceRequest) -> ApiResult<Resource> {
        unavailable("create", request.kind)
    }

    async fn create_from_template(
        &self,
        kind: ResourceKind,
        _template_id: TemplateId,
    ) -> ApiResult<Resource> {
        unavailable("create_from_template", kind)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        _resource_id: ResourceId,
        _patch: ResourcePatch,
    ) -> ApiResult<Resource> {
        unavailable("update", kind)
    }

    async fn mark_ready(&self, kind: ResourceKind, _resource_id: ResourceId) -> ApiResult<Resource> {
        unavailable("mark_ready", kind)
    }

    async fn add_update_to_bucket(
        &self,
        kind: ResourceKind,
        _resource_id: ResourceId,
        _patch: ResourcePatch,
    ) -> ApiResult<Resource> {
        unavailable("add_update_to_bucket", kind)
    }

    async fn mark_pending_deletion(
        &self,
        kind: ResourceKind,
        _resource_id: ResourceId,
    ) -> ApiResult<Resource> {
        unavailable("mark_pending_deletion", kind)
    }

    async fn delete(&self, kind: ResourceKind, _resource_id: ResourceId) -> ApiResult<()> {
        unavailable("delete", kind)
    }
}
