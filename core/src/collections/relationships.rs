//! Named relationship sets and the per-topic index over them.
//!
//! A [`RelationshipSet`] tracks whether it has unsaved structural changes.
//! The flag is set by a successful `add`, by a `remove` that found its key,
//! and by a `clear` of a non-empty set. Failed or no-op mutations leave it
//! untouched, and only [`RelationshipSet::mark_clean`] resets it.

use crate::collections::keyed::{Keyed, KeyedCollection, ReadOnlyKeyedCollection};
use crate::error::TopicError;
use crate::model::TopicRef;

/// Topics related to their owner under one namespace (e.g. `Friends`).
#[derive(Debug, Clone)]
pub struct RelationshipSet {
    name: String,
    topics: KeyedCollection<TopicRef>,
    is_dirty: bool,
}

impl RelationshipSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topics: KeyedCollection::new(),
            is_dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.topics.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&TopicRef> {
        self.topics.get(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TopicRef> {
        self.topics.iter()
    }

    pub fn as_read_only(&self) -> ReadOnlyKeyedCollection<'_, TopicRef> {
        self.topics.as_read_only()
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn add(&mut self, topic: TopicRef) -> Result<(), TopicError> {
        if self.topics.contains_key(&topic.key) {
            return Err(TopicError::duplicate_key(
                topic.key,
                format!("relationship '{}'", self.name),
            ));
        }
        self.topics.add(topic)?;
        self.is_dirty = true;
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.topics.remove(key).is_some();
        if removed {
            self.is_dirty = true;
        }
        removed
    }

    pub fn clear(&mut self) -> bool {
        let cleared = self.topics.clear() > 0;
        if cleared {
            self.is_dirty = true;
        }
        cleared
    }

    /// Mirror writes on the incoming side are owned by the graph and are
    /// not part of the caller-visible dirty state.
    pub(crate) fn insert_mirror(&mut self, topic: TopicRef) -> Result<(), TopicError> {
        self.topics.add(topic)
    }

    pub(crate) fn remove_mirror(&mut self, key: &str) -> bool {
        self.topics.remove(key).is_some()
    }
}

impl Keyed for RelationshipSet {
    fn key(&self) -> &str {
        &self.name
    }
}

impl<'a> IntoIterator for &'a RelationshipSet {
    type Item = &'a TopicRef;
    type IntoIter = std::slice::Iter<'a, TopicRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.topics.iter()
    }
}

/// Namespace → [`RelationshipSet`] map. Namespaces keep first-write order and
/// are created lazily on the first write.
#[derive(Debug, Clone, Default)]
pub struct RelationshipIndex {
    sets: KeyedCollection<RelationshipSet>,
}

impl RelationshipIndex {
    pub fn new() -> Self {
        Self {
            sets: KeyedCollection::new(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sets.keys()
    }

    pub fn get(&self, namespace: &str) -> Option<&RelationshipSet> {
        self.sets.get(namespace)
    }

    pub fn get_mut(&mut self, namespace: &str) -> Option<&mut RelationshipSet> {
        self.sets.get_mut(namespace)
    }

    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.get(namespace)
            .is_some_and(|set| set.contains_key(key))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RelationshipSet> {
        self.sets.iter()
    }

    /// Number of namespaces.
    pub fn namespace_count(&self) -> usize {
        self.sets.len()
    }

    /// Total number of related topics across all namespaces.
    pub fn len(&self) -> usize {
        self.sets.iter().map(RelationshipSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(RelationshipSet::is_empty)
    }

    pub fn get_or_create(&mut self, namespace: &str) -> &mut RelationshipSet {
        self.sets
            .get_or_insert_with(namespace, || RelationshipSet::new(namespace))
    }

    pub fn set_topic(&mut self, namespace: &str, topic: TopicRef) -> Result<(), TopicError> {
        self.get_or_create(namespace).add(topic)
    }

    pub fn remove_topic(&mut self, namespace: &str, key: &str) -> bool {
        self.sets
            .get_mut(namespace)
            .is_some_and(|set| set.remove(key))
    }

    pub fn clear_namespace(&mut self, namespace: &str) -> bool {
        self.sets
            .get_mut(namespace)
            .is_some_and(RelationshipSet::clear)
    }

    /// Drops the namespace and its set. Dirty state leaves with it.
    pub fn remove_namespace(&mut self, namespace: &str) -> Option<RelationshipSet> {
        self.sets.remove(namespace)
    }

    /// Flattens every namespace in order, optionally keeping only one content
    /// type. A topic related under several namespaces appears once per
    /// namespace.
    pub fn get_all_topics(&self, content_type: Option<&str>) -> Vec<&TopicRef> {
        self.sets
            .iter()
            .flat_map(|set| set.iter())
            .filter(|topic| content_type.is_none_or(|wanted| topic.content_type == wanted))
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.sets.iter().any(RelationshipSet::is_dirty)
    }

    pub fn mark_clean(&mut self) {
        self.sets.iter_mut().for_each(RelationshipSet::mark_clean);
    }

    pub(crate) fn insert_mirror(
        &mut self,
        namespace: &str,
        topic: TopicRef,
    ) -> Result<(), TopicError> {
        self.get_or_create(namespace).insert_mirror(topic)
    }

    pub(crate) fn remove_mirror(&mut self, namespace: &str, key: &str) -> bool {
        self.sets
            .get_mut(namespace)
            .is_some_and(|set| set.remove_mirror(key))
    }
}
