use crate::document::{export_document, import_document, TopicDocument};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use topicgraph_core::{CodedError, ErrorCode, TopicError, TopicGraph, TopicId, TopicRef};
use tracing::info;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error("Relationship '{namespace}' points at unknown topic '{unique_key}'")]
    UnresolvedRelationship {
        namespace: String,
        unique_key: String,
    },
    #[error("Repository has no root topic")]
    EmptyDocument,
}

impl CodedError for RepoError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::Internal,
            Self::Serialization(_) | Self::UnresolvedRelationship { .. } => {
                ErrorCode::InvalidArgument
            }
            Self::Topic(err) => err.error_code(),
            Self::EmptyDocument => ErrorCode::NotFound,
        }
    }
}

/// Shared, lock-protected topic graph. Cloning is cheap and every clone sees
/// the same graph.
#[derive(Clone, Default)]
pub struct Repository {
    graph: Arc<RwLock<TopicGraph>>,
}

impl Repository {
    pub fn new(graph: TopicGraph) -> Self {
        Self {
            graph: Arc::new(RwLock::new(graph)),
        }
    }

    pub fn from_document(document: &TopicDocument) -> Result<Self, RepoError> {
        Ok(Self::new(import_document(document)?))
    }

    /// Loads a JSON topic document from disk.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).await?;
        let document = TopicDocument::parse_json(&raw)?;
        let graph = import_document(&document)?;
        info!(path = %path.display(), topics = graph.len(), "repository opened");
        Ok(Self::new(graph))
    }

    /// Writes the graph as JSON. The file is written to a temp path and then
    /// renamed over the target. The write lock is held throughout so the
    /// graph is marked clean only for the state that reached disk.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), RepoError> {
        let path = path.as_ref();
        let mut graph = self.graph.write().await;
        let data = serde_json::to_vec_pretty(&export_document(&graph)?)?;

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let tmp_path = temp_path_for(path);
        fs::write(&tmp_path, &data).await?;
        fs::rename(&tmp_path, path).await?;

        graph.mark_clean();
        info!(path = %path.display(), topics = graph.len(), "repository saved");
        Ok(())
    }

    /// Resolves a `Root:Web:Page` style unique key to a topic id.
    pub async fn load(&self, unique_key: &str) -> Option<TopicId> {
        self.graph
            .read()
            .await
            .get_by_unique_key(unique_key)
            .map(|topic| topic.id())
    }

    pub async fn load_by_id(&self, id: TopicId) -> Option<TopicRef> {
        self.graph.read().await.topic_ref(id)
    }

    pub async fn root(&self) -> Option<TopicId> {
        self.graph.read().await.root()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, TopicGraph> {
        self.graph.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, TopicGraph> {
        self.graph.write().await
    }

    pub async fn is_dirty(&self) -> bool {
        self.graph.read().await.is_dirty()
    }
}

/// `<file>.tmp` next to `path`, keeping the full file name so a target that
/// already ends in `.tmp` never becomes its own temp file.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
