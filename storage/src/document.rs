//! JSON representation of a topic tree, used to load and save repositories.

use crate::repo::RepoError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use topicgraph_core::{TopicGraph, TopicId};

const DEFAULT_CONTENT_TYPE: &str = "Page";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TopicId>,
    pub key: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Namespace → unique keys of related topics.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TopicDocument>,
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

impl TopicDocument {
    pub fn new(key: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            id: None,
            key: key.into(),
            content_type: content_type.into(),
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TopicDocument) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_relationship(
        mut self,
        namespace: impl Into<String>,
        target_unique_key: impl Into<String>,
    ) -> Self {
        self.relationships
            .entry(namespace.into())
            .or_default()
            .push(target_unique_key.into());
        self
    }

    pub fn parse_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Highest `id` set anywhere in this subtree.
    fn max_explicit_id(&self) -> Option<TopicId> {
        self.children
            .iter()
            .filter_map(TopicDocument::max_explicit_id)
            .chain(self.id)
            .max()
    }
}

/// Builds a graph from `document`. Structure is created first; relationships
/// are resolved by unique key once every topic exists. The resulting graph
/// has no pending changes.
pub fn import_document(document: &TopicDocument) -> Result<TopicGraph, RepoError> {
    let mut graph = TopicGraph::new();
    if let Some(max_id) = document.max_explicit_id() {
        graph.reserve_ids_through(max_id);
    }
    let mut pending: Vec<(TopicId, &TopicDocument)> = Vec::new();
    let mut stack: Vec<(Option<TopicId>, &TopicDocument)> = vec![(None, document)];

    while let Some((parent, doc)) = stack.pop() {
        let (key, content_type) = (doc.key.as_str(), doc.content_type.as_str());
        let id = match doc.id {
            Some(id) => graph.insert_topic(id, key, content_type, parent)?,
            None => graph.create_topic(key, content_type, parent)?,
        };
        if let Some(topic) = graph.get_mut(id) {
            for (name, value) in &doc.attributes {
                topic.attributes_mut().load_value(name, value.as_str());
            }
        }
        if !doc.relationships.is_empty() {
            pending.push((id, doc));
        }
        stack.extend(doc.children.iter().rev().map(|child| (Some(id), child)));
    }

    for (source, doc) in pending {
        for (namespace, targets) in &doc.relationships {
            for unique_key in targets {
                let target = graph
                    .get_by_unique_key(unique_key)
                    .map(|topic| topic.id())
                    .ok_or_else(|| RepoError::UnresolvedRelationship {
                        namespace: namespace.clone(),
                        unique_key: unique_key.clone(),
                    })?;
                graph.set_relationship(source, namespace, target)?;
            }
        }
    }

    graph.mark_clean();
    Ok(graph)
}

/// Serializes the graph back into a document rooted at the graph root.
pub fn export_document(graph: &TopicGraph) -> Result<TopicDocument, RepoError> {
    let root = graph.root().ok_or(RepoError::EmptyDocument)?;
    export_topic(graph, root)
}

fn export_topic(graph: &TopicGraph, id: TopicId) -> Result<TopicDocument, RepoError> {
    let topic = graph
        .get(id)
        .ok_or(RepoError::Topic(topicgraph_core::TopicError::TopicNotFound(id)))?;

    let mut document = TopicDocument::new(topic.key(), topic.content_type());
    document.id = Some(id);
    document.attributes = topic
        .attributes()
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    for set in topic.relationships().iter() {
        let targets: Vec<String> = set
            .iter()
            .filter_map(|related| graph.unique_key(related.id))
            .collect();
        if !targets.is_empty() {
            document.relationships.insert(set.name().to_string(), targets);
        }
    }
    for child in topic.children() {
        document.children.push(export_topic(graph, child.id)?);
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TopicDocument {
        TopicDocument::new("Root", "Container").with_child(
            TopicDocument::new("Web", "Page")
                .with_attribute("Title", "Home")
                .with_child(
                    TopicDocument::new("About", "Page")
                        .with_relationship("Related", "Root:Web:Contact"),
                )
                .with_child(TopicDocument::new("Contact", "Page")),
        )
    }

    #[test]
    fn import_builds_structure_and_relationships() {
        let graph = import_document(&sample()).unwrap();
        assert_eq!(graph.len(), 4);
        assert!(!graph.is_dirty());

        let web = graph.get_by_unique_key("Root:Web").unwrap();
        assert_eq!(web.title(), "Home");
        let about = graph.get_by_unique_key("Root:Web:About").unwrap();
        assert!(about.relationships().contains("Related", "Contact"));
        let contact = graph.get_by_unique_key("Root:Web:Contact").unwrap();
        assert!(contact.incoming_relationships().contains("Related", "About"));
    }

    #[test]
    fn unresolved_relationship_is_reported() {
        let doc = TopicDocument::new("Root", "Container")
            .with_relationship("Related", "Root:Nowhere");
        let err = import_document(&doc).unwrap_err();
        assert!(matches!(
            err,
            RepoError::UnresolvedRelationship { ref unique_key, .. } if unique_key == "Root:Nowhere"
        ));
    }

    #[test]
    fn allocated_ids_skip_explicit_ids_later_in_the_document() {
        let first = TopicDocument::new("First", "Page");
        let mut second = TopicDocument::new("Second", "Page");
        second.id = Some(2);
        let mut root = TopicDocument::new("Root", "Container")
            .with_child(first)
            .with_child(second);
        root.id = Some(1);

        let graph = import_document(&root).unwrap();
        assert_eq!(graph.get_by_unique_key("Root:Second").map(|t| t.id()), Some(2));
        let first_id = graph.get_by_unique_key("Root:First").unwrap().id();
        assert!(first_id > 2);
    }

    #[test]
    fn content_type_defaults_to_page() {
        let doc = TopicDocument::parse_json(r#"{"key":"Root","children":[{"key":"Web"}]}"#)
            .unwrap();
        assert_eq!(doc.content_type, "Page");
        assert_eq!(doc.children[0].content_type, "Page");
    }

    #[test]
    fn export_preserves_ids_and_order() {
        let graph = import_document(&sample()).unwrap();
        let exported = export_document(&graph).unwrap();
        let web = &exported.children[0];
        let keys: Vec<_> = web.children.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["About", "Contact"]);
        assert_eq!(
            web.children[0].relationships.get("Related"),
            Some(&vec!["Root:Web:Contact".to_string()])
        );

        let reimported = import_document(&exported).unwrap();
        assert_eq!(
            reimported.get_by_unique_key("Root:Web:About").map(|t| t.id()),
            graph.get_by_unique_key("Root:Web:About").map(|t| t.id())
        );
    }
}
