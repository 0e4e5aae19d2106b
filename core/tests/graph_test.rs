use topicgraph_core::{CodedError, ErrorCode, TopicError, TopicGraph, TopicId};

struct Fixture {
    graph: TopicGraph,
    root: TopicId,
    web: TopicId,
    web_1: TopicId,
    web_1_1: TopicId,
    web_2: TopicId,
}

/// Root → Web → Web_0..Web_2, each with two children (Web_n_0, Web_n_1).
fn seeded_graph() -> Fixture {
    let mut graph = TopicGraph::new();
    let root = graph.create_root("Root", "Container").unwrap();
    let web = graph.create_topic("Web", "Page", Some(root)).unwrap();
    let mut children = Vec::new();
    for i in 0..3 {
        let child = graph
            .create_topic(format!("Web_{i}"), "Page", Some(web))
            .unwrap();
        for j in 0..2 {
            graph
                .create_topic(format!("Web_{i}_{j}"), "Page", Some(child))
                .unwrap();
        }
        children.push(child);
    }
    let web_1_1 = graph.get_by_unique_key("Root:Web:Web_1:Web_1_1").unwrap().id();

    Fixture {
        graph,
        root,
        web,
        web_1: children[1],
        web_1_1,
        web_2: children[2],
    }
}

#[test]
fn test_unique_key_and_web_path() {
    let f = seeded_graph();
    assert_eq!(
        f.graph.unique_key(f.web_1_1).as_deref(),
        Some("Root:Web:Web_1:Web_1_1")
    );
    assert_eq!(f.graph.web_path(f.web_1_1).as_deref(), Some("/Web/Web_1/Web_1_1/"));
    assert_eq!(f.graph.web_path(f.root).as_deref(), Some("/"));
    assert_eq!(f.graph.get_by_unique_key("Root").map(|t| t.id()), Some(f.root));
    assert!(f.graph.get_by_unique_key("Root:Missing").is_none());
    assert!(f.graph.get_by_unique_key("Other:Web").is_none());
}

#[test]
fn test_children_are_ordered_and_key_unique() {
    let mut f = seeded_graph();
    let keys: Vec<_> = f.graph.children(f.web).map(|t| t.key().to_string()).collect();
    assert_eq!(keys, vec!["Web_0", "Web_1", "Web_2"]);

    let err = f.graph.create_topic("Web_1", "Page", Some(f.web)).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::AlreadyExists);
    assert_eq!(f.graph.get(f.web).unwrap().children().len(), 3);

    let web = f.graph.get(f.web).unwrap();
    assert_eq!(web.children()["Web_2"].id, f.web_2);
}

#[test]
fn test_set_relationship_mirrors_incoming() {
    let mut f = seeded_graph();
    f.graph.set_relationship(f.web_1, "Related", f.web_2).unwrap();

    let source = f.graph.get(f.web_1).unwrap();
    assert!(source.relationships().contains("Related", "Web_2"));
    assert!(source.relationships().get("Related").unwrap().is_dirty());

    let target = f.graph.get(f.web_2).unwrap();
    let incoming = target.incoming_relationships().get("Related").unwrap();
    assert_eq!(incoming.get("Web_1").map(|t| t.id), Some(f.web_1));
    assert!(!incoming.is_dirty());
    assert!(!target.relationships().contains("Related", "Web_1"));
}

#[test]
fn test_duplicate_relationship_changes_nothing() {
    let mut f = seeded_graph();
    f.graph.set_relationship(f.web_1, "Related", f.web_2).unwrap();
    f.graph.get_mut(f.web_1).unwrap().mark_clean();

    let err = f
        .graph
        .set_relationship(f.web_1, "Related", f.web_2)
        .unwrap_err();
    assert!(matches!(err, TopicError::DuplicateKey { .. }));

    let source = f.graph.get(f.web_1).unwrap();
    assert!(!source.relationships().is_dirty());
    assert_eq!(source.relationships().len(), 1);
    let target = f.graph.get(f.web_2).unwrap();
    assert_eq!(target.incoming_relationships().len(), 1);
}

#[test]
fn test_incoming_key_collision_is_rejected_before_any_write() {
    let mut f = seeded_graph();
    // Web_1_1 and a new top-level "Web_1_1" share a key but not an id.
    let twin = f.graph.create_topic("Web_1_1", "Page", Some(f.root)).unwrap();
    f.graph.set_relationship(f.web_1_1, "Related", f.web_2).unwrap();

    let err = f.graph.set_relationship(twin, "Related", f.web_2).unwrap_err();
    assert!(matches!(err, TopicError::DuplicateKey { .. }));
    assert!(f.graph.get(twin).unwrap().relationships().is_empty());
}

#[test]
fn test_remove_and_clear_relationships_update_both_sides() {
    let mut f = seeded_graph();
    f.graph.set_relationship(f.web_1, "Related", f.web_2).unwrap();
    f.graph.set_relationship(f.web_1, "Related", f.web_1_1).unwrap();
    f.graph.set_relationship(f.web_1, "Friends", f.web_2).unwrap();

    assert!(f.graph.remove_relationship(f.web_1, "Friends", f.web_2).unwrap());
    assert!(!f.graph.remove_relationship(f.web_1, "Friends", f.web_2).unwrap());
    assert!(!f
        .graph
        .get(f.web_2)
        .unwrap()
        .incoming_relationships()
        .contains("Friends", "Web_1"));

    assert!(f.graph.clear_relationships(f.web_1, "Related").unwrap());
    assert!(!f.graph.clear_relationships(f.web_1, "Related").unwrap());
    assert!(f.graph.get(f.web_1).unwrap().relationships().is_empty());
    assert!(f.graph.get(f.web_2).unwrap().incoming_relationships().is_empty());
    assert!(f.graph.get(f.web_1_1).unwrap().incoming_relationships().is_empty());
}

#[test]
fn test_get_all_topics_counts_every_namespace() {
    let mut f = seeded_graph();
    let video = f.graph.create_topic("Clip", "Video", Some(f.web)).unwrap();
    f.graph.set_relationship(f.web_1, "Related", f.web_2).unwrap();
    f.graph.set_relationship(f.web_1, "Related", video).unwrap();
    f.graph.set_relationship(f.web_1, "Friends", f.web_2).unwrap();

    let relationships = f.graph.get(f.web_1).unwrap().relationships();
    let total: usize = relationships.iter().map(|set| set.len()).sum();
    assert_eq!(relationships.get_all_topics(None).len(), total);
    assert_eq!(total, 3);

    let videos = relationships.get_all_topics(Some("Video"));
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, video);
    assert_eq!(relationships.get_all_topics(Some("Page")).len(), 2);
}

#[test]
fn test_remove_topic_drops_subtree_and_mirrors() {
    let mut f = seeded_graph();
    f.graph.set_relationship(f.web_2, "Related", f.web_1_1).unwrap();
    f.graph.set_relationship(f.web_1_1, "Related", f.web_2).unwrap();
    let before = f.graph.len();

    let removed = f.graph.remove_topic(f.web_1).unwrap();
    assert_eq!(removed.len(), 3);
    assert_eq!(removed[0], f.web_1);
    assert_eq!(f.graph.len(), before - 3);
    assert!(!f.graph.contains(f.web_1_1));
    assert!(f.graph.get(f.web).unwrap().children().get("Web_1").is_none());

    let survivor = f.graph.get(f.web_2).unwrap();
    assert!(survivor.relationships().is_empty());
    assert!(survivor.incoming_relationships().is_empty());
    assert!(f.graph.remove_topic(f.web_1).is_err());
}

#[test]
fn test_move_topic_reparents_and_rejects_cycles() {
    let mut f = seeded_graph();
    f.graph.move_topic(f.web_1_1, f.web_2).unwrap();
    assert_eq!(
        f.graph.unique_key(f.web_1_1).as_deref(),
        Some("Root:Web:Web_2:Web_1_1")
    );
    assert!(f.graph.child(f.web_1, "Web_1_1").is_none());

    let err = f.graph.move_topic(f.web, f.web_2).unwrap_err();
    assert!(matches!(err, TopicError::InvalidMove { .. }));
    let err = f.graph.move_topic(f.root, f.web).unwrap_err();
    assert!(matches!(err, TopicError::InvalidMove { .. }));

    let clash = f.graph.create_topic("Web_2", "Page", Some(f.web_1)).unwrap();
    let err = f.graph.move_topic(clash, f.web).unwrap_err();
    assert!(matches!(err, TopicError::DuplicateKey { .. }));
}

#[test]
fn test_attribute_inheritance_walks_ancestors() {
    let mut f = seeded_graph();
    f.graph
        .get_mut(f.web)
        .unwrap()
        .attributes_mut()
        .set_value("Theme", "Dark");

    assert_eq!(f.graph.get_attribute_value(f.web_1_1, "Theme", false), None);
    assert_eq!(
        f.graph.get_attribute_value(f.web_1_1, "Theme", true),
        Some("Dark")
    );
    assert!(f.graph.is_dirty());
    f.graph.mark_clean();
    assert!(!f.graph.is_dirty());
}

#[test]
fn test_title_falls_back_to_key() {
    let mut f = seeded_graph();
    assert_eq!(f.graph.get(f.web_1).unwrap().title(), "Web_1");
    f.graph
        .get_mut(f.web_1)
        .unwrap()
        .attributes_mut()
        .set_value("Title", "Section One");
    assert_eq!(f.graph.get(f.web_1).unwrap().title(), "Section One");
}

#[test]
fn test_create_topic_marks_parent_and_graph_dirty() {
    let mut f = seeded_graph();
    f.graph.mark_clean();
    assert!(!f.graph.is_dirty());

    let added = f.graph.create_topic("Web_3", "Page", Some(f.web)).unwrap();
    assert!(f.graph.is_dirty());
    assert!(f.graph.get(f.web).unwrap().is_dirty());
    assert!(!f.graph.get(added).unwrap().is_dirty());

    f.graph.mark_clean();
    assert!(!f.graph.get(f.web).unwrap().is_dirty());
    assert!(!f.graph.is_dirty());
}

#[test]
fn test_failed_create_leaves_graph_clean() {
    let mut f = seeded_graph();
    f.graph.mark_clean();
    assert!(f.graph.create_topic("Web_1", "Page", Some(f.web)).is_err());
    assert!(!f.graph.is_dirty());
}

#[test]
fn test_move_topic_marks_both_parents_dirty() {
    let mut f = seeded_graph();
    f.graph.mark_clean();

    f.graph.move_topic(f.web_1_1, f.web_2).unwrap();
    assert!(f.graph.is_dirty());
    assert!(f.graph.get(f.web_1).unwrap().is_dirty());
    assert!(f.graph.get(f.web_2).unwrap().is_dirty());
    assert!(!f.graph.get(f.web).unwrap().is_dirty());
}

#[test]
fn test_remove_topic_marks_graph_dirty() {
    let mut f = seeded_graph();
    f.graph.mark_clean();

    f.graph.remove_topic(f.web_1_1).unwrap();
    assert!(f.graph.is_dirty());
    assert!(f.graph.get(f.web_1).unwrap().is_dirty());

    f.graph.mark_clean();
    f.graph.remove_topic(f.root).unwrap();
    assert!(f.graph.is_empty());
    assert!(f.graph.is_dirty());
}
