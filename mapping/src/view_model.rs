use async_trait::async_trait;
use serde::Serialize;
use topicgraph_core::{Topic, TopicGraph, TopicId};

/// A mapped node that can carry the mapped forms of its children.
pub trait HierarchicalViewModel: Send + Sync + Sized + 'static {
    fn set_children(&mut self, children: Vec<Self>);
    fn children(&self) -> &[Self];
}

/// Maps a single topic into a view model. Children are attached by the
/// hierarchical mapper, never by the implementation.
#[async_trait]
pub trait TopicMapper: Send + Sync {
    type ViewModel: HierarchicalViewModel;

    async fn map(&self, graph: &TopicGraph, topic: &Topic) -> anyhow::Result<Self::ViewModel>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationViewModel {
    pub id: TopicId,
    pub key: String,
    pub title: String,
    pub content_type: String,
    pub web_path: String,
    pub children: Vec<NavigationViewModel>,
}

impl HierarchicalViewModel for NavigationViewModel {
    fn set_children(&mut self, children: Vec<Self>) {
        self.children = children;
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

/// Builds [`NavigationViewModel`]s for menus and breadcrumbs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationMapper;

#[async_trait]
impl TopicMapper for NavigationMapper {
    type ViewModel = NavigationViewModel;

    async fn map(&self, graph: &TopicGraph, topic: &Topic) -> anyhow::Result<NavigationViewModel> {
        let web_path = graph
            .web_path(topic.id())
            .ok_or_else(|| anyhow::anyhow!("topic {} is not attached to the graph", topic.id()))?;
        Ok(NavigationViewModel {
            id: topic.id(),
            key: topic.key().to_string(),
            title: topic.title().to_string(),
            content_type: topic.content_type().to_string(),
            web_path,
            children: Vec::new(),
        })
    }
}
