use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ResourceId);
id_newtype!(TemplateId);

/// Local-only key for a field row. Never leaves the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(pub Uuid);

impl FieldId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FieldId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    Email,
    Array,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Database,
    File,
    Api,
    Stream,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::File => "file",
            Self::Api => "api",
            Self::Stream => "stream",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "database" | "db" => Some(Self::Database),
            "file" => Some(Self::File),
            "api" => Some(Self::Api),
            "stream" | "streaming" => Some(Self::Stream),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Datablock,
    PredictionModel,
    TrainingJob,
}

impl ResourceKind {
    /// Collection segment used in REST routes.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Datablock => "datablocks",
            Self::PredictionModel => "models",
            Self::TrainingJob => "training-jobs",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Datablock => "Datablock",
            Self::PredictionModel => "Prediction model",
            Self::TrainingJob => "Training job",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "datablock" | "datablocks" => Some(Self::Datablock),
            "prediction_model" | "model" | "models" => Some(Self::PredictionModel),
            "training_job" | "training_jobs" | "job" => Some(Self::TrainingJob),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Draft,
    Configured,
    Ready,
    #[serde(alias = "active")]
    Deployed,
    PendingUpdate,
    PendingDeletion,
}

impl ResourceStatus {
    /// Live resources are never mutated in place; changes go through the
    /// deployment bucket.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            Self::Deployed | Self::PendingUpdate | Self::PendingDeletion
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(skip)]
    pub id: FieldId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_primary_key: bool,
}

// Equality ignores the local id: a field read back from the server is the
// same field the draft sent.
impl PartialEq for FieldSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.field_type == other.field_type
            && self.required == other.required
            && self.description == other.description
            && self.is_primary_key == other.is_primary_key
    }
}

impl Eq for FieldSpec {}

impl FieldSpec {
    /// Blank row appended by the field editor.
    pub fn blank() -> Self {
        Self {
            id: FieldId::new(),
            name: String::new(),
            field_type: FieldType::default(),
            required: false,
            description: None,
            is_primary_key: false,
        }
    }

    pub fn named(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Self::blank()
        }
    }

    /// Same content under a fresh local id.
    pub fn rekeyed(&self) -> Self {
        Self {
            id: FieldId::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub template_id: TemplateId,
    pub kind: ResourceKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub source_type: SourceType,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub resource_id: ResourceId,
    pub kind: ResourceKind,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    pub status: ResourceStatus,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
