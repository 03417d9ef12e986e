//! Failure taxonomy for backend calls and wizard actions.

use std::fmt;

use shared::domain::{ResourceId, TemplateId};
use thiserror::Error;

use crate::sequencer::WizardStep;

/// Shown when the backend did not supply a message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    #[error("request rejected with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Client { status: u16, message: Option<String> },
    #[error("server failed with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl ApiFailure {
    pub fn client(status: u16, message: impl Into<String>) -> Self {
        Self::Client {
            status,
            message: Some(message.into()),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: Some(message.into()),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Client { .. })
    }

    /// Message the backend attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Client { message, .. } | Self::Server { message, .. } => message
                .as_deref()
                .map(str::trim)
                .filter(|message| !message.is_empty()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitStage {
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

impl CommitStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListTemplates => "list_templates",
            Self::List => "list",
            Self::Create => "create",
            Self::CreateFromTemplate => "create_from_template",
            Self::Update => "update",
            Self::MarkReady => "mark_ready",
            Self::AddUpdateToBucket => "add_update_to_bucket",
            Self::MarkPendingDeletion => "mark_pending_deletion",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for CommitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("a commit is already in flight")]
    CommitInFlight,
    #[error("wizard cannot confirm from step {0:?}")]
    NotReady(WizardStep),
    #[error("wizard is closed")]
    Closed,
    #[error("wizard needs at least one step")]
    InvalidSteps,
    #[error("unknown resource {0}")]
    UnknownResource(ResourceId),
    #[error("unknown template {0}")]
    UnknownTemplate(TemplateId),
    #[error("{stage} failed: {source}")]
    Api {
        stage: CommitStage,
        #[source]
        source: ApiFailure,
    },
    #[error("{stage} failed after resource {orphaned} was created: {source}")]
    PartialCommit {
        stage: CommitStage,
        orphaned: ResourceId,
        #[source]
        source: ApiFailure,
    },
}

impl WizardError {
    pub fn api(stage: CommitStage, source: ApiFailure) -> Self {
        Self::Api { stage, source }
    }

    pub fn api_failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Api { source, .. } | Self::PartialCommit { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Text for an inline error or alert: the backend's own message when it
    /// sent one, otherwise the generic fallback.
    pub fn user_message(&self) -> String {
        self.api_failure()
            .and_then(ApiFailure::server_message)
            .unwrap_or(GENERIC_FAILURE_MESSAGE)
            .to_string()
    }
}

pub type WizardResult<T> = std::result::Result<T, WizardError>;
