//! REST implementation of [`ResourceApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Resource, ResourceId, ResourceKind, Template, TemplateId},
    error::ApiError,
    protocol::{CreateFromTemplateRequest, CreateResourceRequest, ListResponse, ResourcePatch},
};
use tracing::debug;
use url::Url;

use crate::{
    api::{ApiResult, ResourceApi},
    error::ApiFailure,
};

pub struct HttpResourceApi {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpResourceApi {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::with_options(base_url, None, None)
    }

    pub fn with_options(
        base_url: &str,
        auth_token: Option<String>,
        timeout: Option<Duration>,
    ) -> ApiResult<Self> {
        let parsed = Url::parse(base_url.trim()).map_err(|e| {
            ApiFailure::Unavailable(format!("invalid api base url '{base_url}': {e}"))
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiFailure::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            auth_token: auth_token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, kind: ResourceKind) -> String {
        format!("{}/{}", self.base_url, kind.path_segment())
    }

    fn resource_url(&self, kind: ResourceKind, resource_id: ResourceId) -> String {
        format!("{}/{}", self.collection_url(kind), resource_id.0)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        debug!(%method, %url, "api: sending request");
        let builder = self.http.request(method, url);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiFailure::Transport(e.to_string()))?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = self.send(builder).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiFailure::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| ApiFailure::Decode(e.to_string()))
    }
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .ok()
        .map(|error| error.message);
    let status = status.as_u16();
    debug!(status, ?message, "api: request failed");

    match status {
        400..=499 => Err(ApiFailure::Client { status, message }),
        500..=599 => Err(ApiFailure::Server { status, message }),
        // Redirects are followed by the client, so anything left here is
        // a reply this API never sends.
        _ => Err(ApiFailure::Decode(format!("unexpected status {status}"))),
    }
}

#[async_trait]
impl ResourceApi for HttpResourceApi {
    async fn list_templates(&self, kind: ResourceKind) -> ApiResult<Vec<Template>> {
        let url = format!("{}/templates", self.collection_url(kind));
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn list(&self, kind: ResourceKind) -> ApiResult<Vec<Resource>> {
        let response: ListResponse<Resource> = self
            .send_json(self.request(Method::GET, self.collection_url(kind)))
            .await?;
        Ok(response.items)
    }

    async fn create(&self, request: CreateResourceRequest) -> ApiResult<Resource> {
        let url = self.collection_url(request.kind);
        self.send_json(self.request(Method::POST, url).json(&request))
            .await
    }

    async fn create_from_template(
        &self,
        kind: ResourceKind,
        template_id: TemplateId,
    ) -> ApiResult<Resource> {
        let url = format!("{}/from-template", self.collection_url(kind));
        self.send_json(
            self.request(Method::POST, url)
                .json(&CreateFromTemplateRequest { template_id }),
        )
        .await
    }

    async fn update(
        &self,
        kind: ResourceKind,
        resource_id: ResourceId,
        patch: ResourcePatch,
    ) -> ApiResult<Resource> {
        let url = self.resource_url(kind, resource_id);
        self.send_json(self.request(Method::PATCH, url).json(&patch))
            .await
    }

    async fn mark_ready(&self, kind: ResourceKind, resource_id: ResourceId) -> ApiResult<Resource> {
        let url = format!("{}/ready", self.resource_url(kind, resource_id));
        self.send_json(self.request(Method::POST, url)).await
    }

    async fn add_update_to_bucket(
        &self,
        kind: ResourceKind,
        resource_id: ResourceId,
        patch: ResourcePatch,
    ) -> ApiResult<Resource> {
        let url = format!("{}/bucket", self.resource_url(kind, resource_id));
        self.send_json(self.request(Method::POST, url).json(&patch))
            .await
    }

    async fn mark_pending_deletion(
        &self,
        kind: ResourceKind,
        resource_id: ResourceId,
    ) -> ApiResult<Resource> {
        let url = format!("{}/pending-deletion", self.resource_url(kind, resource_id));
        self.send_json(self.request(Method::POST, url)).await
    }

    async fn delete(&self, kind: ResourceKind, resource_id: ResourceId) -> ApiResult<()> {
        let url = self.resource_url(kind, resource_id);
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
