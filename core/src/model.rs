use crate::collections::{
    AttributeCollection, Keyed, KeyedCollection, ReadOnlyKeyedCollection, RelationshipIndex,
};
use serde::{Deserialize, Serialize};

/// Numeric identity of a topic, stable for the lifetime of the graph.
pub type TopicId = u64;

/// Attribute holding a topic's display title.
pub const TITLE_ATTRIBUTE: &str = "Title";

/// Lightweight handle stored in child and relationship collections. The
/// graph owns the topic itself; collections only reference it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicRef {
    pub id: TopicId,
    pub key: String,
    pub content_type: String,
}

impl Keyed for TopicRef {
    fn key(&self) -> &str {
        &self.key
    }
}

/// A node in the content hierarchy.
#[derive(Debug, Clone)]
pub struct Topic {
    pub(crate) id: TopicId,
    pub(crate) key: String,
    pub(crate) content_type: String,
    pub(crate) parent: Option<TopicId>,
    pub(crate) children: KeyedCollection<TopicRef>,
    /// Set when a child is added, moved in or out, or removed.
    pub(crate) children_dirty: bool,
    pub(crate) attributes: AttributeCollection,
    pub(crate) relationships: RelationshipIndex,
    pub(crate) incoming_relationships: RelationshipIndex,
}

impl Topic {
    pub(crate) fn new(id: TopicId, key: String, content_type: String) -> Self {
        Self {
            id,
            key,
            content_type,
            parent: None,
            children: KeyedCollection::new(),
            children_dirty: false,
            attributes: AttributeCollection::new(),
            relationships: RelationshipIndex::new(),
            incoming_relationships: RelationshipIndex::new(),
        }
    }

    pub fn id(&self) -> TopicId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn parent(&self) -> Option<TopicId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn children(&self) -> ReadOnlyKeyedCollection<'_, TopicRef> {
        self.children.as_read_only()
    }

    pub fn attributes(&self) -> &AttributeCollection {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeCollection {
        &mut self.attributes
    }

    /// Outgoing relationships. Mutations go through
    /// [`TopicGraph`](crate::TopicGraph) so the incoming mirror stays in sync.
    pub fn relationships(&self) -> &RelationshipIndex {
        &self.relationships
    }

    pub fn incoming_relationships(&self) -> &RelationshipIndex {
        &self.incoming_relationships
    }

    pub fn title(&self) -> &str {
        self.attributes
            .get_value(TITLE_ATTRIBUTE)
            .unwrap_or(self.key.as_str())
    }

    /// True when children, attributes or outgoing relationships carry unsaved
    /// changes.
    pub fn is_dirty(&self) -> bool {
        self.children_dirty || self.attributes.is_dirty() || self.relationships.is_dirty()
    }

    pub fn mark_clean(&mut self) {
        self.children_dirty = false;
        self.attributes.mark_clean();
        self.relationships.mark_clean();
    }

    pub fn to_ref(&self) -> TopicRef {
        TopicRef {
            id: self.id,
            key: self.key.clone(),
            content_type: self.content_type.clone(),
        }
    }
}
