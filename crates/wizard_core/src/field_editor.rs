//! Copy-on-write edits over a draft's field list.
//!
//! Every function returns a new [`Draft`]; the input is never touched, so a
//! reader holding the old value never sees a half-applied edit.

use shared::domain::{FieldId, FieldSpec, FieldType};

use crate::draft::{rekey_fields, Draft};

/// Partial update for one field. `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPatch {
    pub name: Option<String>,
    pub field_type: Option<FieldType>,
    pub required: Option<bool>,
    pub description: Option<Option<String>>,
    pub is_primary_key: Option<bool>,
}

impl FieldPatch {
    pub fn primary_key(is_primary_key: bool) -> Self {
        Self {
            is_primary_key: Some(is_primary_key),
            ..Self::default()
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Appends a blank string-typed field. Duplicate names are not checked here.
pub fn add_field(draft: &Draft) -> Draft {
    let mut next = draft.clone();
    next.fields.push(FieldSpec::blank());
    next
}

/// Applies `patch` to the field with `id`. Promoting a field to primary key
/// demotes every other field in the same step. Unknown ids leave the draft
/// as it was.
pub fn update_field(draft: &Draft, id: FieldId, patch: &FieldPatch) -> Draft {
    let mut next = draft.clone();
    if !next.fields.iter().any(|field| field.id == id) {
        return next;
    }

    let promotes = patch.is_primary_key == Some(true);
    next.fields = draft
        .fields
        .iter()
        .map(|field| {
            if field.id == id {
                apply_patch(field, patch)
            } else if promotes && field.is_primary_key {
                FieldSpec {
                    is_primary_key: false,
                    ..field.clone()
                }
            } else {
                field.clone()
            }
        })
        .collect();
    next
}

/// Swaps the whole field list, e.g. for a schema loaded from a file. Each
/// field gets a fresh id and at most one primary key is kept.
pub fn replace_fields(draft: &Draft, fields: &[FieldSpec]) -> Draft {
    let mut next = draft.clone();
    next.fields = rekey_fields(fields);
    next
}

/// Drops the field with `id` unless it is the primary key; a primary key
/// must be demoted first.
pub fn remove_field(draft: &Draft, id: FieldId) -> Draft {
    let mut next = draft.clone();
    let removable = draft
        .fields
        .iter()
        .any(|field| field.id == id && !field.is_primary_key);
    if removable {
        next.fields.retain(|field| field.id != id);
    }
    next
}

/// Whether the UI should offer a delete control for the field.
pub fn can_remove_field(draft: &Draft, id: FieldId) -> bool {
    draft
        .fields()
        .iter()
        .any(|field| field.id == id && !field.is_primary_key)
}

fn apply_patch(field: &FieldSpec, patch: &FieldPatch) -> FieldSpec {
    let mut next = field.clone();
    if let Some(name) = &patch.name {
        next.name = name.clone();
    }
    if let Some(field_type) = patch.field_type {
        next.field_type = field_type;
    }
    if let Some(required) = patch.required {
        next.required = required;
    }
    if let Some(description) = &patch.description {
        next.description = description.clone();
    }
    if let Some(is_primary_key) = patch.is_primary_key {
        next.is_primary_key = is_primary_key;
    }
    next
}

#[cfg(test)]
#[path = "tests/field_editor_tests.rs"]
mod tests;
