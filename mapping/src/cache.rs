//! Single-flight caching decorator for [`HierarchicalTopicMapping`].
//!
//! Each distinct request shape owns one shared computation. The first caller
//! for a key starts it, concurrent callers await the same future, and later
//! callers reuse its result. Failed computations reach every waiter and are
//! then evicted so the next call retries.

use crate::error::MappingError;
use crate::hierarchical::HierarchicalTopicMapping;
use crate::metrics::{CacheMetrics, CacheMetricsSnapshot, Lookup};
use crate::validator::TopicValidator;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use topicgraph_core::{CacheConfig, MappingConfig, TopicGraph, TopicId};
use tracing::{debug, warn};

type SharedResult<T> = Shared<BoxFuture<'static, Result<T, MappingError>>>;

/// Identity of a projection request. Validators compare by instance, so a
/// fresh closure is always a new key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewModelCacheKey {
    pub topic_id: Option<TopicId>,
    pub depth: usize,
    pub validator: Option<TopicValidator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RootCacheKey {
    start: Option<TopicId>,
    levels_from_root: usize,
    fallback_key: String,
}

pub struct CachedHierarchicalMapper<H: HierarchicalTopicMapping> {
    inner: Arc<H>,
    config: CacheConfig,
    view_models: DashMap<ViewModelCacheKey, SharedResult<Option<Arc<H::ViewModel>>>>,
    roots: DashMap<RootCacheKey, SharedResult<Option<TopicId>>>,
    metrics: CacheMetrics,
}

impl<H> CachedHierarchicalMapper<H>
where
    H: HierarchicalTopicMapping + 'static,
{
    pub fn new(inner: Arc<H>, config: CacheConfig) -> Self {
        Self {
            inner,
            config,
            view_models: DashMap::new(),
            roots: DashMap::new(),
            metrics: CacheMetrics::new(),
        }
    }

    pub fn inner(&self) -> &Arc<H> {
        &self.inner
    }

    /// Number of cached or in-flight view model entries.
    pub fn len(&self) -> usize {
        self.view_models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view_models.is_empty()
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Drops every entry that can observe a change to `id`: view models
    /// projected from `id` or any of its ancestors, and roots discovered from
    /// `id`, from below it, or resolved to it. Entries for topics no longer
    /// in `graph` go too. Call after mutating, with the graph still in hand;
    /// after a removal, pass the former parent. Returns the number of
    /// entries removed.
    pub fn invalidate_topic(&self, graph: &TopicGraph, id: TopicId) -> usize {
        let chain: HashSet<TopicId> = std::iter::once(id)
            .chain(graph.ancestors(id).map(|topic| topic.id()))
            .collect();
        let below_or_at = |start: TopicId| {
            start == id || graph.ancestors(start).any(|topic| topic.id() == id)
        };

        let before = self.view_models.len() + self.roots.len();
        self.view_models.retain(|key, _| match key.topic_id {
            Some(start) => graph.contains(start) && !chain.contains(&start),
            None => true,
        });
        self.roots.retain(|key, shared| {
            let resolved_here = matches!(shared.peek(), Some(Ok(Some(root))) if *root == id);
            match key.start {
                Some(start) => graph.contains(start) && !below_or_at(start) && !resolved_here,
                None => !resolved_here,
            }
        });
        let removed = before.saturating_sub(self.view_models.len() + self.roots.len());
        debug!(id, removed, "cache entries invalidated");
        removed
    }

    pub fn invalidate_all(&self) {
        self.view_models.clear();
        self.roots.clear();
        debug!("cache cleared");
    }

    async fn run_shared<K, T, F>(
        &self,
        map: &DashMap<K, SharedResult<T>>,
        key: K,
        compute: F,
    ) -> Result<T, MappingError>
    where
        K: Eq + Hash + Clone,
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> BoxFuture<'static, Result<T, MappingError>>,
    {
        let (shared, lookup) = match map.entry(key.clone()) {
            Entry::Occupied(entry) => {
                let shared = entry.get().clone();
                let lookup = if shared.peek().is_some() {
                    Lookup::Hit
                } else {
                    Lookup::Join
                };
                (shared, lookup)
            }
            Entry::Vacant(entry) => {
                let shared = compute().shared();
                entry.insert(shared.clone());
                (shared, Lookup::Miss)
            }
        };
        self.metrics.record(lookup);
        debug!(?lookup, "mapping cache lookup");

        let result = shared.clone().await;
        if let Err(err) = &result {
            let evicted = map.remove_if(&key, |_, cached| cached.ptr_eq(&shared));
            if evicted.is_some() {
                self.metrics.record_failure();
                warn!(error = %err, "mapping failed, entry evicted");
            }
        }
        result
    }
}

#[async_trait]
impl<H> HierarchicalTopicMapping for CachedHierarchicalMapper<H>
where
    H: HierarchicalTopicMapping + 'static,
{
    type ViewModel = H::ViewModel;

    fn mapping_config(&self) -> &MappingConfig {
        self.inner.mapping_config()
    }

    async fn get_hierarchical_root(
        &self,
        start: Option<TopicId>,
        levels_from_root: usize,
        fallback_key: &str,
    ) -> Result<Option<TopicId>, MappingError> {
        if !self.config.enabled {
            return self
                .inner
                .get_hierarchical_root(start, levels_from_root, fallback_key)
                .await;
        }

        let key = RootCacheKey {
            start,
            levels_from_root,
            fallback_key: fallback_key.to_string(),
        };
        let inner = Arc::clone(&self.inner);
        let fallback_key = key.fallback_key.clone();
        self.run_shared(&self.roots, key, move || {
            async move {
                inner
                    .get_hierarchical_root(start, levels_from_root, &fallback_key)
                    .await
            }
            .boxed()
        })
        .await
    }

    async fn get_view_model(
        &self,
        start: Option<TopicId>,
        depth: usize,
        validator: Option<TopicValidator>,
    ) -> Result<Option<Arc<H::ViewModel>>, MappingError> {
        if !self.config.enabled {
            return self.inner.get_view_model(start, depth, validator).await;
        }

        let key = ViewModelCacheKey {
            topic_id: start,
            depth,
            validator: validator.clone(),
        };
        let inner = Arc::clone(&self.inner);
        self.run_shared(&self.view_models, key, move || {
            async move { inner.get_view_model(start, depth, validator).await }.boxed()
        })
        .await
    }
}
