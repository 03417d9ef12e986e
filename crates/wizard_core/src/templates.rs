use std::{collections::HashMap, sync::Arc};

use shared::domain::{ResourceKind, Template, TemplateId};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    api::ResourceApi,
    error::{CommitStage, WizardError, WizardResult},
};

/// Templates fetched once per kind and reused by every wizard session.
pub struct TemplateCache {
    api: Arc<dyn ResourceApi>,
    by_kind: Mutex<HashMap<ResourceKind, Vec<Template>>>,
}

impl TemplateCache {
    pub fn new(api: Arc<dyn ResourceApi>) -> Self {
        Self {
            api,
            by_kind: Mutex::new(HashMap::new()),
        }
    }

    pub async fn templates(&self, kind: ResourceKind) -> WizardResult<Vec<Template>> {
        let mut by_kind = self.by_kind.lock().await;
        if let Some(cached) = by_kind.get(&kind) {
            return Ok(cached.clone());
        }

        let fetched: Vec<Template> = self
            .api
            .list_templates(kind)
            .await
            .map_err(|source| WizardError::api(CommitStage::ListTemplates, source))?
            .into_iter()
            .filter(|template| template.kind == kind)
            .collect();
        debug!(%kind, count = fetched.len(), "templates: fetched");
        by_kind.insert(kind, fetched.clone());
        Ok(fetched)
    }

    pub async fn find(&self, kind: ResourceKind, template_id: TemplateId) -> WizardResult<Template> {
        self.templates(kind)
            .await?
            .into_iter()
            .find(|template| template.template_id == template_id)
            .ok_or(WizardError::UnknownTemplate(template_id))
    }

    /// Drops the cached list so the next lookup hits the backend.
    pub async fn invalidate(&self, kind: ResourceKind) {
        self.by_kind.lock().await.remove(&kind);
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::SourceType;

    use super::*;
    use crate::{
        error::ApiFailure,
        memory::{InMemoryResourceApi, Operation},
    };

    fn template(id: i64, kind: ResourceKind, name: &str) -> Template {
        Template {
            template_id: TemplateId(id),
            kind,
            name: name.into(),
            description: String::new(),
            source_type: SourceType::File,
            fields: Vec::new(),
        }
    }

    fn backend() -> Arc<InMemoryResourceApi> {
        Arc::new(InMemoryResourceApi::with_templates(vec![
            template(1, ResourceKind::Datablock, "Clickstream"),
            template(2, ResourceKind::Datablock, "Orders"),
            template(3, ResourceKind::PredictionModel, "Churn"),
        ]))
    }

    #[tokio::test]
    async fn fetches_each_kind_once() {
        let api = backend();
        let cache = TemplateCache::new(api.clone());

        assert_eq!(cache.templates(ResourceKind::Datablock).await.expect("list").len(), 2);
        assert_eq!(cache.templates(ResourceKind::Datablock).await.expect("list").len(), 2);
        assert_eq!(
            cache
                .find(ResourceKind::PredictionModel, TemplateId(3))
                .await
                .expect("find")
                .name,
            "Churn"
        );

        assert_eq!(
            api.operations().await,
            vec![Operation::ListTemplates, Operation::ListTemplates]
        );
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let api = backend();
        let cache = TemplateCache::new(api.clone());
        cache.templates(ResourceKind::Datablock).await.expect("list");
        cache.invalidate(ResourceKind::Datablock).await;
        cache.templates(ResourceKind::Datablock).await.expect("list");
        assert_eq!(api.operations().await.len(), 2);
    }

    #[tokio::test]
    async fn unknown_template_and_failed_fetch() {
        let api = backend();
        let cache = TemplateCache::new(api.clone());
        assert_eq!(
            cache.find(ResourceKind::Datablock, TemplateId(3)).await,
            Err(WizardError::UnknownTemplate(TemplateId(3)))
        );

        api.fail_next(Operation::ListTemplates, ApiFailure::server(503, "maintenance"))
            .await;
        let err = cache
            .templates(ResourceKind::TrainingJob)
            .await
            .expect_err("must fail");
        assert_eq!(err.user_message(), "maintenance");

        // A failed fetch is not cached.
        assert!(cache
            .templates(ResourceKind::TrainingJob)
            .await
            .expect("retry")
            .is_empty());
    }
}
