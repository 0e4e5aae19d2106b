//! Arena that owns every topic in the hierarchy.
//!
//! Parent links are ids, children are [`TopicRef`] handles, and both
//! relationship directions live in per-topic indexes. Every relationship
//! write updates the source's outgoing index and the target's incoming index
//! within one `&mut self` call, so readers never observe only one side.

use crate::error::TopicError;
use crate::model::{Topic, TopicId, TopicRef};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Separator between keys in a unique key (`Root:Web:Web_3`).
pub const UNIQUE_KEY_SEPARATOR: &str = ":";

#[derive(Debug, Clone)]
pub struct TopicGraph {
    topics: HashMap<TopicId, Topic>,
    root: Option<TopicId>,
    next_id: TopicId,
    /// Root replaced or subtree dropped; not attributable to a surviving topic.
    structure_dirty: bool,
}

impl TopicGraph {
    pub fn new() -> Self {
        Self {
            topics: HashMap::new(),
            root: None,
            next_id: 1,
            structure_dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn root(&self) -> Option<TopicId> {
        self.root
    }

    pub fn root_topic(&self) -> Option<&Topic> {
        self.root.and_then(|id| self.topics.get(&id))
    }

    pub fn contains(&self, id: TopicId) -> bool {
        self.topics.contains_key(&id)
    }

    pub fn get(&self, id: TopicId) -> Option<&Topic> {
        self.topics.get(&id)
    }

    pub fn get_mut(&mut self, id: TopicId) -> Option<&mut Topic> {
        self.topics.get_mut(&id)
    }

    fn require(&self, id: TopicId) -> Result<&Topic, TopicError> {
        self.topics.get(&id).ok_or(TopicError::TopicNotFound(id))
    }

    fn require_mut(&mut self, id: TopicId) -> Result<&mut Topic, TopicError> {
        self.topics
            .get_mut(&id)
            .ok_or(TopicError::TopicNotFound(id))
    }

    pub fn create_root(
        &mut self,
        key: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Result<TopicId, TopicError> {
        self.create_topic(key, content_type, None)
    }

    /// Creates a topic with a fresh id. `parent = None` creates the root.
    pub fn create_topic(
        &mut self,
        key: impl Into<String>,
        content_type: impl Into<String>,
        parent: Option<TopicId>,
    ) -> Result<TopicId, TopicError> {
        let id = self.next_id;
        self.insert_topic(id, key, content_type, parent)
    }

    /// Inserts a topic under a caller-chosen id. Loaders use this to keep ids
    /// stable across reloads.
    pub fn insert_topic(
        &mut self,
        id: TopicId,
        key: impl Into<String>,
        content_type: impl Into<String>,
        parent: Option<TopicId>,
    ) -> Result<TopicId, TopicError> {
        let key = key.into();
        if key.is_empty() || key.contains(UNIQUE_KEY_SEPARATOR) {
            return Err(TopicError::InvalidArgument(format!(
                "topic key '{}' must be non-empty and must not contain '{}'",
                key, UNIQUE_KEY_SEPARATOR
            )));
        }
        if self.topics.contains_key(&id) {
            return Err(TopicError::DuplicateId(id));
        }

        let mut topic = Topic::new(id, key, content_type.into());
        topic.parent = parent;
        match parent {
            Some(parent_id) => {
                let parent = self.require_mut(parent_id)?;
                if parent.children.contains_key(&topic.key) {
                    return Err(TopicError::duplicate_key(
                        topic.key,
                        format!("children of topic {}", parent_id),
                    ));
                }
                parent.children.add(topic.to_ref())?;
                parent.children_dirty = true;
            }
            None => {
                if self.root.is_some() {
                    return Err(TopicError::RootAlreadyExists);
                }
                self.root = Some(id);
                self.structure_dirty = true;
            }
        }

        debug!(id, key = %topic.key, ?parent, "topic created");
        self.topics.insert(id, topic);
        self.reserve_ids_through(id);
        Ok(id)
    }

    pub fn child(&self, parent: TopicId, key: &str) -> Option<&Topic> {
        let child = self.topics.get(&parent)?.children.get(key)?;
        self.topics.get(&child.id)
    }

    /// Children of `id` in collection order. Unknown ids yield nothing.
    pub fn children(&self, id: TopicId) -> impl Iterator<Item = &Topic> + '_ {
        self.topics
            .get(&id)
            .into_iter()
            .flat_map(|topic| topic.children.iter())
            .filter_map(move |child| self.topics.get(&child.id))
    }

    /// Walks parent links upward, starting with the parent of `id`.
    pub fn ancestors(&self, id: TopicId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.topics.get(&id).and_then(|topic| topic.parent),
        }
    }

    /// Number of edges between the root and `id` (the root is at depth 0).
    pub fn depth(&self, id: TopicId) -> Option<usize> {
        self.topics.get(&id)?;
        Some(self.ancestors(id).count())
    }

    /// Keys from the root down to `id` joined with `:` (`Root:Web:Web_3`).
    pub fn unique_key(&self, id: TopicId) -> Option<String> {
        let topic = self.topics.get(&id)?;
        let mut keys: Vec<&str> = self.ancestors(id).map(|t| t.key.as_str()).collect();
        keys.reverse();
        keys.push(&topic.key);
        Some(keys.join(UNIQUE_KEY_SEPARATOR))
    }

    /// Route-style path that omits the root key (`/Web/Web_3/`).
    pub fn web_path(&self, id: TopicId) -> Option<String> {
        let topic = self.topics.get(&id)?;
        let mut keys: Vec<&str> = self.ancestors(id).map(|t| t.key.as_str()).collect();
        keys.reverse();
        keys.push(&topic.key);

        let mut path = String::from("/");
        for key in keys.iter().skip(1) {
            path.push_str(key);
            path.push('/');
        }
        Some(path)
    }

    /// Resolves `Root:Web:Web_3`. A bare key matching the root resolves to
    /// the root itself.
    pub fn get_by_unique_key(&self, unique_key: &str) -> Option<&Topic> {
        let mut segments = unique_key.split(UNIQUE_KEY_SEPARATOR);
        let root = self.root_topic()?;
        if segments.next()? != root.key {
            return None;
        }
        segments.try_fold(root, |current, key| self.child(current.id, key))
    }

    /// Reads an attribute, optionally falling back to the nearest ancestor
    /// that defines it.
    pub fn get_attribute_value(
        &self,
        id: TopicId,
        name: &str,
        inherit_from_parent: bool,
    ) -> Option<&str> {
        let topic = self.topics.get(&id)?;
        if let Some(value) = topic.attributes.get_value(name) {
            return Some(value);
        }
        if !inherit_from_parent {
            return None;
        }
        self.ancestors(id)
            .find_map(|ancestor| ancestor.attributes.get_value(name))
    }

    /// Relates `source → target` under `namespace` and mirrors
    /// `target ← source` in the target's incoming index.
    ///
    /// Both sides are validated before either is written, so a failure
    /// (unknown topic, duplicate key on either side) changes nothing.
    pub fn set_relationship(
        &mut self,
        source: TopicId,
        namespace: &str,
        target: TopicId,
    ) -> Result<(), TopicError> {
        if namespace.is_empty() {
            return Err(TopicError::InvalidArgument(
                "relationship namespace must not be empty".to_string(),
            ));
        }
        let source_ref = self.require(source)?.to_ref();
        let target_topic = self.require(target)?;
        let target_ref = target_topic.to_ref();

        if target_topic
            .incoming_relationships
            .contains(namespace, &source_ref.key)
        {
            return Err(TopicError::duplicate_key(
                source_ref.key,
                format!("incoming relationship '{}' of topic {}", namespace, target),
            ));
        }

        self.require_mut(source)?
            .relationships
            .set_topic(namespace, target_ref)?;
        self.require_mut(target)?
            .incoming_relationships
            .insert_mirror(namespace, source_ref)?;

        debug!(source, target, namespace, "relationship set");
        Ok(())
    }

    /// Removes `source → target` and its mirror. Returns false when the
    /// relationship did not exist.
    pub fn remove_relationship(
        &mut self,
        source: TopicId,
        namespace: &str,
        target: TopicId,
    ) -> Result<bool, TopicError> {
        let source_key = self.require(source)?.key.clone();
        let target_topic = self.require(target)?;
        let target_key = target_topic.key.clone();

        let related = self
            .require(source)?
            .relationships
            .get(namespace)
            .and_then(|set| set.get(&target_key))
            .is_some_and(|related| related.id == target);
        if !related {
            return Ok(false);
        }

        self.require_mut(source)?
            .relationships
            .remove_topic(namespace, &target_key);
        self.require_mut(target)?
            .incoming_relationships
            .remove_mirror(namespace, &source_key);

        debug!(source, target, namespace, "relationship removed");
        Ok(true)
    }

    /// Clears one outgoing namespace of `source` together with the mirrors.
    pub fn clear_relationships(
        &mut self,
        source: TopicId,
        namespace: &str,
    ) -> Result<bool, TopicError> {
        let source_topic = self.require(source)?;
        let source_key = source_topic.key.clone();
        let targets: Vec<TopicId> = source_topic
            .relationships
            .get(namespace)
            .map(|set| set.iter().map(|related| related.id).collect())
            .unwrap_or_default();

        let cleared = self
            .require_mut(source)?
            .relationships
            .clear_namespace(namespace);
        for target in targets {
            if let Some(topic) = self.topics.get_mut(&target) {
                topic
                    .incoming_relationships
                    .remove_mirror(namespace, &source_key);
            }
        }

        if cleared {
            debug!(source, namespace, "relationships cleared");
        }
        Ok(cleared)
    }

    /// Re-parents `id` under `new_parent`. The key must be free among the new
    /// siblings and the target may not be inside the moved subtree.
    pub fn move_topic(&mut self, id: TopicId, new_parent: TopicId) -> Result<(), TopicError> {
        let topic = self.require(id)?;
        let old_parent = topic.parent.ok_or(TopicError::InvalidMove {
            topic: id,
            parent: new_parent,
        })?;
        let topic_ref = topic.to_ref();

        if new_parent == id || self.ancestors(new_parent).any(|a| a.id == id) {
            return Err(TopicError::InvalidMove {
                topic: id,
                parent: new_parent,
            });
        }
        if old_parent == new_parent {
            return Ok(());
        }

        let destination = self.require(new_parent)?;
        if destination.children.contains_key(&topic_ref.key) {
            return Err(TopicError::duplicate_key(
                topic_ref.key,
                format!("children of topic {}", new_parent),
            ));
        }

        let source = self.require_mut(old_parent)?;
        source.children.remove(&topic_ref.key);
        source.children_dirty = true;
        let destination = self.require_mut(new_parent)?;
        destination.children.add(topic_ref)?;
        destination.children_dirty = true;
        self.require_mut(id)?.parent = Some(new_parent);

        debug!(id, old_parent, new_parent, "topic moved");
        Ok(())
    }

    /// Detaches `id` and its descendants from the graph, dropping every
    /// relationship that pointed into or out of the removed subtree. Returns
    /// the removed ids in pre-order.
    pub fn remove_topic(&mut self, id: TopicId) -> Result<Vec<TopicId>, TopicError> {
        let topic = self.require(id)?;
        let parent = topic.parent;
        let key = topic.key.clone();

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            removed.push(current);
            if let Some(topic) = self.topics.get(&current) {
                stack.extend(topic.children.iter().rev().map(|child| child.id));
            }
        }
        let removed_set: HashSet<TopicId> = removed.iter().copied().collect();

        // Collect surviving relationship endpoints before dropping topics.
        let mut outgoing_mirrors = Vec::new();
        let mut incoming_sources = Vec::new();
        for current in &removed {
            let Some(topic) = self.topics.get(current) else {
                continue;
            };
            for set in topic.relationships.iter() {
                for related in set.iter() {
                    if !removed_set.contains(&related.id) {
                        outgoing_mirrors.push((
                            related.id,
                            set.name().to_string(),
                            topic.key.clone(),
                        ));
                    }
                }
            }
            for set in topic.incoming_relationships.iter() {
                for related in set.iter() {
                    if !removed_set.contains(&related.id) {
                        incoming_sources.push((
                            related.id,
                            set.name().to_string(),
                            topic.key.clone(),
                        ));
                    }
                }
            }
        }

        for (target, namespace, source_key) in outgoing_mirrors {
            if let Some(topic) = self.topics.get_mut(&target) {
                topic
                    .incoming_relationships
                    .remove_mirror(&namespace, &source_key);
            }
        }
        for (source, namespace, target_key) in incoming_sources {
            if let Some(topic) = self.topics.get_mut(&source) {
                topic.relationships.remove_topic(&namespace, &target_key);
            }
        }

        match parent {
            Some(parent_id) => {
                if let Some(parent) = self.topics.get_mut(&parent_id) {
                    parent.children.remove(&key);
                    parent.children_dirty = true;
                }
            }
            None => self.root = None,
        }
        for current in &removed {
            self.topics.remove(current);
        }
        self.structure_dirty = true;

        debug!(id, removed = removed.len(), "topic subtree removed");
        Ok(removed)
    }

    /// True when the tree shape changed or any topic carries unsaved child,
    /// attribute or relationship changes.
    pub fn is_dirty(&self) -> bool {
        self.structure_dirty || self.topics.values().any(Topic::is_dirty)
    }

    pub fn mark_clean(&mut self) {
        self.structure_dirty = false;
        self.topics.values_mut().for_each(Topic::mark_clean);
    }

    /// Keeps freshly allocated ids above `id`. Loaders call this before
    /// mixing fixed and allocated ids.
    pub fn reserve_ids_through(&mut self, id: TopicId) {
        self.next_id = self.next_id.max(id.saturating_add(1));
    }

    /// Topic ids in pre-order starting at the root.
    pub fn iter_preorder(&self) -> Vec<TopicId> {
        let mut out = Vec::with_capacity(self.topics.len());
        let mut stack: Vec<TopicId> = self.root.into_iter().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(topic) = self.topics.get(&current) {
                stack.extend(topic.children.iter().rev().map(|child| child.id));
            }
        }
        out
    }

    pub fn topic_ref(&self, id: TopicId) -> Option<TopicRef> {
        self.topics.get(&id).map(Topic::to_ref)
    }
}

impl Default for TopicGraph {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Ancestors<'a> {
    graph: &'a TopicGraph,
    next: Option<TopicId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Topic;

    fn next(&mut self) -> Option<Self::Item> {
        let topic = self.graph.topics.get(&self.next?)?;
        self.next = topic.parent;
        Some(topic)
    }
}
