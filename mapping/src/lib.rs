pub mod cache;
pub mod error;
pub mod hierarchical;
pub mod metrics;
pub mod validator;
pub mod view_model;

pub use cache::{CachedHierarchicalMapper, ViewModelCacheKey};
pub use error::MappingError;
pub use hierarchical::{HierarchicalMapper, HierarchicalTopicMapping};
pub use metrics::{CacheMetrics, CacheMetricsSnapshot};
pub use validator::TopicValidator;
pub use view_model::{HierarchicalViewModel, NavigationMapper, NavigationViewModel, TopicMapper};
