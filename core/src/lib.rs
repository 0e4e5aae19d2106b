pub mod collections;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;

pub use collections::{
    AttributeCollection, AttributeValue, Keyed, KeyedCollection, ReadOnlyKeyedCollection,
    RelationshipIndex, RelationshipSet,
};
pub use config::{AppConfig, CacheConfig, LoggingConfig, MappingConfig, RepositoryConfig};
pub use error::{CodedError, ErrorCode, TopicError};
pub use graph::TopicGraph;
pub use model::{Topic, TopicId, TopicRef};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured filter; a second call returns an error instead of panicking.
pub fn init_tracing(
    config: &LoggingConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter_layer);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
    }
}
