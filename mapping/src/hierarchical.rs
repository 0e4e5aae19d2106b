use crate::error::MappingError;
use crate::validator::TopicValidator;
use crate::view_model::{HierarchicalViewModel, TopicMapper};
use async_trait::async_trait;
use futures::future::{try_join_all, BoxFuture, FutureExt};
use std::sync::Arc;
use storage::Repository;
use topicgraph_core::{MappingConfig, Topic, TopicGraph, TopicId};
use tracing::debug;

#[async_trait]
pub trait HierarchicalTopicMapping: Send + Sync {
    type ViewModel: HierarchicalViewModel;

    fn mapping_config(&self) -> &MappingConfig;

    /// Finds the ancestor of `start` whose unique key has `levels_from_root`
    /// segments (`Root:Web` for two levels). When `start` is `None` or sits
    /// above that level, the root child keyed `fallback_key` is used instead.
    /// `Ok(None)` means no contextual root exists.
    async fn get_hierarchical_root(
        &self,
        start: Option<TopicId>,
        levels_from_root: usize,
        fallback_key: &str,
    ) -> Result<Option<TopicId>, MappingError>;

    /// Maps `start` and up to `depth` levels of descendants. Children for
    /// which `validator` returns false are skipped together with their
    /// subtrees; `start` itself is never validated.
    async fn get_view_model(
        &self,
        start: Option<TopicId>,
        depth: usize,
        validator: Option<TopicValidator>,
    ) -> Result<Option<Arc<Self::ViewModel>>, MappingError>;

    /// Root discovery with the configured level and fallback key, followed by
    /// projection from the discovered root.
    async fn get_root_view_model(
        &self,
        start: Option<TopicId>,
        depth: usize,
        validator: Option<TopicValidator>,
    ) -> Result<Option<Arc<Self::ViewModel>>, MappingError> {
        let levels = self.mapping_config().levels_from_root;
        let fallback = self.mapping_config().fallback_root_key.clone();
        let root = self.get_hierarchical_root(start, levels, &fallback).await?;
        self.get_view_model(root, depth, validator).await
    }
}

/// Projects repository subtrees through a [`TopicMapper`].
pub struct HierarchicalMapper<M> {
    repository: Repository,
    mapper: Arc<M>,
    config: MappingConfig,
}

impl<M: TopicMapper> HierarchicalMapper<M> {
    pub fn new(repository: Repository, mapper: Arc<M>, config: MappingConfig) -> Self {
        Self {
            repository,
            mapper,
            config,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}

#[async_trait]
impl<M: TopicMapper> HierarchicalTopicMapping for HierarchicalMapper<M> {
    type ViewModel = M::ViewModel;

    fn mapping_config(&self) -> &MappingConfig {
        &self.config
    }

    async fn get_hierarchical_root(
        &self,
        start: Option<TopicId>,
        levels_from_root: usize,
        fallback_key: &str,
    ) -> Result<Option<TopicId>, MappingError> {
        if levels_from_root == 0 {
            return Err(MappingError::invalid("levels_from_root must be at least 1"));
        }
        let graph = self.repository.read().await;

        if let Some(start) = start {
            let found = find_ancestor_at_depth(&graph, start, levels_from_root - 1)?;
            if found.is_some() {
                return Ok(found);
            }
        }

        let fallback = graph
            .root()
            .and_then(|root| graph.child(root, fallback_key))
            .map(Topic::id);
        debug!(?start, levels_from_root, fallback_key, ?fallback, "hierarchical root fallback");
        Ok(fallback)
    }

    async fn get_view_model(
        &self,
        start: Option<TopicId>,
        depth: usize,
        validator: Option<TopicValidator>,
    ) -> Result<Option<Arc<M::ViewModel>>, MappingError> {
        let Some(start) = start else {
            return Ok(None);
        };
        if depth > self.config.max_depth {
            return Err(MappingError::invalid(format!(
                "depth {} exceeds the configured maximum of {}",
                depth, self.config.max_depth
            )));
        }

        let graph = self.repository.read().await;
        let topic = graph.get(start).ok_or(MappingError::TopicNotFound(start))?;
        let view_model =
            map_subtree(&graph, self.mapper.as_ref(), topic, depth, validator.as_ref()).await?;
        debug!(start, depth, validated = validator.is_some(), "view model mapped");
        Ok(Some(Arc::new(view_model)))
    }
}

fn find_ancestor_at_depth(
    graph: &TopicGraph,
    start: TopicId,
    target_depth: usize,
) -> Result<Option<TopicId>, MappingError> {
    let depth = graph
        .depth(start)
        .ok_or(MappingError::TopicNotFound(start))?;
    if depth < target_depth {
        return Ok(None);
    }
    if depth == target_depth {
        return Ok(Some(start));
    }
    Ok(graph
        .ancestors(start)
        .nth(depth - target_depth - 1)
        .map(Topic::id))
}

fn map_subtree<'a, M: TopicMapper>(
    graph: &'a TopicGraph,
    mapper: &'a M,
    topic: &'a Topic,
    depth: usize,
    validator: Option<&'a TopicValidator>,
) -> BoxFuture<'a, Result<M::ViewModel, MappingError>> {
    async move {
        let mut view_model = mapper
            .map(graph, topic)
            .await
            .map_err(MappingError::mapping)?;

        if depth > 0 {
            let pending: Vec<_> = graph
                .children(topic.id())
                .filter(|child| validator.is_none_or(|v| v.validate(child)))
                .map(|child| map_subtree(graph, mapper, child, depth - 1, validator))
                .collect();
            view_model.set_children(try_join_all(pending).await?);
        } else {
            view_model.set_children(Vec::new());
        }
        Ok(view_model)
    }
    .boxed()
}
