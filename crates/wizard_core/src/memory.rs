//! In-process backend with recorded calls, for tests and offline runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{Resource, ResourceId, ResourceKind, ResourceStatus, Template, TemplateId},
    error::ErrorCode,
    protocol::{CreateResourceRequest, ResourcePatch},
};
use tokio::sync::Mutex;

use crate::{
    api::{ApiResult, ResourceApi},
    draft::normalize_resource_name,
    error::ApiFailure,
};

/// One backend call as observed by [`InMemoryResourceApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListTemplates(ResourceKind),
    List(ResourceKind),
    Create(CreateResourceRequest),
    CreateFromTemplate(ResourceKind, TemplateId),
    Update(ResourceKind, ResourceId, ResourcePatch),
    MarkReady(ResourceKind, ResourceId),
    AddUpdateToBucket(ResourceKind, ResourceId, ResourcePatch),
    MarkPendingDeletion(ResourceKind, ResourceId),
    Delete(ResourceKind, ResourceId),
}

impl ApiCall {
    pub fn operation(&self) -> Operation {
        match self {
            Self::ListTemplates(_) => Operation::ListTemplates,
            Self::List(_) => Operation::List,
            Self::Create(_) => Operation::Create,
            Self::CreateFromTemplate(..) => Operation::CreateFromTemplate,
            Self::Update(..) => Operation::Update,
            Self::MarkReady(..) => Operation::MarkReady,
            Self::AddUpdateToBucket(..) => Operation::AddUpdateToBucket,
            Self::MarkPendingDeletion(..) => Operation::MarkPendingDeletion,
            Self::Delete(..) => Operation::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListTemplates,
    List,
    Create,
    CreateFromTemplate,
    Update,
    MarkReady,
    AddUpdateToBucket,
    MarkPendingDeletion,
    Delete,
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    templates: Vec<Template>,
    resources: Vec<Resource>,
    pending_patches: HashMap<ResourceId, Vec<ResourcePatch>>,
    calls: Vec<ApiCall>,
    failures: HashMap<Operation, ApiFailure>,
}

impl MemoryState {
    fn record(&mut self, call: ApiCall) -> ApiResult<()> {
        let operation = call.operation();
        self.calls.push(call);
        match self.failures.remove(&operation) {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn allocate_id(&mut self) -> ResourceId {
        self.next_id += 1;
        ResourceId(self.next_id)
    }

    fn resource_mut(
        &mut self,
        kind: ResourceKind,
        resource_id: ResourceId,
    ) -> ApiResult<&mut Resource> {
        self.resources
            .iter_mut()
            .find(|resource| resource.kind == kind && resource.resource_id == resource_id)
            .ok_or_else(|| {
                ApiFailure::client(
                    ErrorCode::NotFound.http_status(),
                    format!("{} {} does not exist", kind.label(), resource_id),
                )
            })
    }

    fn ensure_unique_name(&self, kind: ResourceKind, name: &str) -> ApiResult<()> {
        if self
            .resources
            .iter()
            .any(|resource| resource.kind == kind && resource.name == name)
        {
            return Err(ApiFailure::client(
                ErrorCode::Conflict.http_status(),
                format!("a {} named '{name}' already exists", kind.label().to_lowercase()),
            ));
        }
        Ok(())
    }
}

pub struct InMemoryResourceApi {
    state: Mutex<MemoryState>,
}

impl InMemoryResourceApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
        }
    }

    pub fn with_templates(templates: Vec<Template>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                templates,
                ..MemoryState::default()
            }),
        }
    }

    /// Adds an existing resource; later ids are allocated above it.
    pub async fn seed_resource(&self, resource: Resource) {
        let mut state = self.state.lock().await;
        state.next_id = state.next_id.max(resource.resource_id.0);
        state.resources.push(resource);
    }

    /// The next call of `operation` fails with `failure` instead of running.
    pub async fn fail_next(&self, operation: Operation, failure: ApiFailure) {
        self.state.lock().await.failures.insert(operation, failure);
    }

    pub async fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn operations(&self) -> Vec<Operation> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .map(ApiCall::operation)
            .collect()
    }

    pub async fn resources(&self) -> Vec<Resource> {
        self.state.lock().await.resources.clone()
    }

    /// Updates queued in the deployment bucket for a live resource.
    pub async fn pending_patches(&self, resource_id: ResourceId) -> Vec<ResourcePatch> {
        self.state
            .lock()
            .await
            .pending_patches
            .get(&resource_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for InMemoryResourceApi {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_patch(resource: &mut Resource, patch: ResourcePatch) {
    if let Some(display_name) = patch.display_name {
        resource.display_name = display_name;
    }
    if let Some(description) = patch.description {
        resource.description = description;
    }
    if let Some(fields) = patch.fields {
        resource.fields = fields;
    }
    resource.updated_at = Some(Utc::now());
}

#[async_trait]
impl ResourceApi for InMemoryResourceApi {
    async fn list_templates(&self, kind: ResourceKind) -> ApiResult<Vec<Template>> {
        let mut state = self.state.lock().await;
        state.record(ApiCall::ListTemplates(kind))?;
        Ok(state
            .templates
            .iter()
            .filter(|template| template.kind == kind)
            .cloned()
            .collect())
    }

    async fn list(&self, kind: ResourceKind) -> ApiResult<Vec<Resource>> {
        let mut state = self.state.lock().await;
        state.record(ApiCall::List(kind))?;
        Ok(state
            .resources
            .iter()
            .filter(|resource| resource.kind == kind)
            .cloned()
            .collect())
    }

    async fn create(&self, request: CreateResourceRequest) -> ApiResult<Resource> {
        let mut state = self.state.lock().await;
        state.record(ApiCall::Create(request.clone()))?;
        if request.name.is_empty() {
            return Err(ApiFailure::client(
                ErrorCode::Validation.http_status(),
                "name must not be empty",
            ));
        }
        state.ensure_unique_name(request.kind, &request.name)?;

        let resource = Resource {
            resource_id: state.allocate_id(),
            kind: request.kind,
            name: request.name,
            display_name: request.display_name,
            description: request.description,
            source_type: request.source_type,
            status: ResourceStatus::Draft,
            fields: request.fields,
            updated_at: Some(Utc::now()),
        };
        state.resources.push(resource.clone());
        Ok(resource)
    }

    async fn create_from_template(
        &self,
        kind: ResourceKind,
        template_id: TemplateId,
    ) -> ApiResult<Resource> {
        let mut state = self.state.lock().await;
        state.record(ApiCall::CreateFromTemplate(kind, template_id))?;
        let template = state
            .templates
            .iter()
            .find(|template| template.kind == kind && template.template_id == template_id)
            .cloned()
            .ok_or_else(|| {
                ApiFailure::client(
                    ErrorCode::NotFound.http_status(),
                    format!("template {template_id} does not exist"),
                )
            })?;

        let resource_id = state.allocate_id();
        let resource = Resource {
            resource_id,
            kind,
            name: normalize_resource_name(&template.name),
            display_name: template.name,
            description: template.description,
            source_type: Some(template.source_type),
            status: ResourceStatus::Draft,
            fields: template.fields,
            updated_at: Some(Utc::now()),
        };
        state.resources.push(resource.clone());
        Ok(resource)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        resource_id: ResourceId,
        patch: ResourcePatch,
    ) -> ApiResult<Resource> {
        let mut state = self.state.lock().await;
        state.record(ApiCall::Update(kind, resource_id, patch.clone()))?;
        let resource = state.resource_mut(kind, resource_id)?;
        apply_patch(resource, patch);
        Ok(resource.clone())
    }

    async fn mark_ready(&self, kind: ResourceKind, resource_id: ResourceId) -> ApiResult<Resource> {
        let mut state = self.state.lock().await;
        state.record(ApiCall::MarkReady(kind, resource_id))?;
        let resource = state.resource_mut(kind, resource_id)?;
        resource.status = ResourceStatus::Ready;
        resource.updated_at = Some(Utc::now());
        Ok(resource.clone())
    }

    async fn add_update_to_bucket(
        &self,
        kind: ResourceKind,
        resource_id: ResourceId,
        patch: ResourcePatch,
    ) -> ApiResult<Resource> {
        let mut state = self.state.lock().await;
        state.record(ApiCall::AddUpdateToBucket(kind, resource_id, patch.clone()))?;
        let resource = state.resource_mut(kind, resource_id)?;
        resource.status = ResourceStatus::PendingUpdate;
        resource.updated_at = Some(Utc::now());
        let resource = resource.clone();
        state
            .pending_patches
            .entry(resource_id)
            .or_default()
            .push(patch);
        Ok(resource)
    }

    async fn mark_pending_deletion(
        &self,
        kind: ResourceKind,
        resource_id: ResourceId,
    ) -> ApiResult<Resource> {
        let mut state = self.state.lock().await;
        state.record(ApiCall::MarkPendingDeletion(kind, resource_id))?;
        let resource = state.resource_mut(kind, resource_id)?;
        resource.status = ResourceStatus::PendingDeletion;
        resource.updated_at = Some(Utc::now());
        Ok(resource.clone())
    }

    async fn delete(&self, kind: ResourceKind, resource_id: ResourceId) -> ApiResult<()> {
        let mut state = self.state.lock().await;
        state.record(ApiCall::Delete(kind, resource_id))?;
        state.resource_mut(kind, resource_id)?;
        state
            .resources
            .retain(|resource| !(resource.kind == kind && resource.resource_id == resource_id));
        state.pending_patches.remove(&resource_id);
        Ok(())
    }
}
