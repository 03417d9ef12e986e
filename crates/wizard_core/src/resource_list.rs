use shared::domain::{Resource, ResourceId, ResourceKind};

/// Client-side copy of one kind's resources. Only server-confirmed objects
/// are ever written into it.
#[derive(Debug, Clone)]
pub struct ResourceList {
    kind: ResourceKind,
    items: Vec<Resource>,
}

impl ResourceList {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Swaps in a freshly listed collection, dropping other kinds.
    pub fn replace_all(&mut self, items: Vec<Resource>) {
        let kind = self.kind;
        self.items = items
            .into_iter()
            .filter(|resource| resource.kind == kind)
            .collect();
    }

    /// Replaces the entry with the same id in place, or prepends a new one.
    pub fn upsert(&mut self, resource: Resource) {
        match self
            .items
            .iter_mut()
            .find(|existing| existing.resource_id == resource.resource_id)
        {
            Some(existing) => *existing = resource,
            None => self.items.insert(0, resource),
        }
    }

    pub fn remove(&mut self, resource_id: ResourceId) -> Option<Resource> {
        let position = self
            .items
            .iter()
            .position(|resource| resource.resource_id == resource_id)?;
        Some(self.items.remove(position))
    }

    pub fn get(&self, resource_id: ResourceId) -> Option<&Resource> {
        self.items
            .iter()
            .find(|resource| resource.resource_id == resource_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Resource] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
