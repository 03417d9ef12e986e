//! In-progress resource held by a wizard before anything reaches the backend.

use shared::{
    domain::{FieldSpec, ResourceKind, SourceType, Template, TemplateId},
    protocol::{CreateResourceRequest, ResourcePatch},
};

/// How the draft was started on the choose step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftOrigin {
    Custom,
    Template(TemplateId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    kind: ResourceKind,
    origin: Option<DraftOrigin>,
    name: String,
    display_name: String,
    description: String,
    source_type: Option<SourceType>,
    pub(crate) fields: Vec<FieldSpec>,
}

impl Draft {
    /// Empty draft; nothing chosen yet.
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            origin: None,
            name: String::new(),
            display_name: String::new(),
            description: String::new(),
            source_type: None,
            fields: Vec::new(),
        }
    }

    pub fn custom(kind: ResourceKind) -> Self {
        Self {
            origin: Some(DraftOrigin::Custom),
            ..Self::new(kind)
        }
    }

    /// Seeds a draft from a template's defaults. Every field gets a fresh
    /// local id; if the template marks more than one primary key only the
    /// first survives.
    pub fn from_template(template: &Template) -> Self {
        let fields = rekey_fields(&template.fields);

        Self {
            kind: template.kind,
            origin: Some(DraftOrigin::Template(template.template_id)),
            name: normalize_resource_name(&template.name),
            display_name: template.name.clone(),
            description: template.description.clone(),
            source_type: Some(template.source_type),
            fields,
        }
    }

    pub fn with_display_name(self, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            name: normalize_resource_name(&display_name),
            display_name,
            ..self
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self
        }
    }

    pub fn with_source_type(self, source_type: SourceType) -> Self {
        Self {
            source_type: Some(source_type),
            ..self
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn origin(&self) -> Option<DraftOrigin> {
        self.origin
    }

    pub fn template_id(&self) -> Option<TemplateId> {
        match self.origin {
            Some(DraftOrigin::Template(template_id)) => Some(template_id),
            _ => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.origin == Some(DraftOrigin::Custom)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source_type(&self) -> Option<SourceType> {
        self.source_type
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn primary_key(&self) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.is_primary_key)
    }

    /// Payload for the single create call of a custom commit.
    pub fn create_request(&self) -> CreateResourceRequest {
        CreateResourceRequest {
            kind: self.kind,
            name: normalize_resource_name(&self.display_name),
            display_name: self.display_name.trim().to_string(),
            description: self.description.clone(),
            source_type: self.source_type,
            fields: self.fields.clone(),
        }
    }

    /// Patch sent after a template create, carrying the edited schema.
    pub fn field_patch(&self) -> ResourcePatch {
        let display_name = self.display_name.trim();
        ResourcePatch {
            display_name: (!display_name.is_empty()).then(|| display_name.to_string()),
            description: Some(self.description.clone()),
            fields: Some(self.fields.clone()),
        }
    }
}

/// Lowercases and collapses every whitespace run to a single underscore.
/// Fresh local ids for `fields`, keeping only the first primary key.
pub(crate) fn rekey_fields(fields: &[FieldSpec]) -> Vec<FieldSpec> {
    let mut seen_primary_key = false;
    fields
        .iter()
        .map(|field| {
            let mut field = field.rekeyed();
            if field.is_primary_key {
                field.is_primary_key = !seen_primary_key;
                seen_primary_key = true;
            }
            field
        })
        .collect()
}

pub fn normalize_resource_name(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}
