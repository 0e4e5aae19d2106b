use std::sync::Arc;
use thiserror::Error;
use topicgraph_core::{CodedError, ErrorCode, TopicId};

/// Errors produced while discovering roots or projecting view models.
///
/// Cloneable so that one failed computation can be handed to every caller
/// waiting on it; the wrapped collaborator error is shared, not copied.
#[derive(Debug, Clone, Error)]
pub enum MappingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("topic {0} not found")]
    TopicNotFound(TopicId),
    #[error("view model mapping failed: {0}")]
    Mapping(Arc<anyhow::Error>),
}

impl MappingError {
    pub fn mapping(err: anyhow::Error) -> Self {
        MappingError::Mapping(Arc::new(err))
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        MappingError::InvalidArgument(message.into())
    }
}

impl CodedError for MappingError {
    fn error_code(&self) -> ErrorCode {
        match self {
            MappingError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            MappingError::TopicNotFound(_) => ErrorCode::NotFound,
            MappingError::Mapping(_) => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_collaborator_error() {
        let err = MappingError::mapping(anyhow::anyhow!("renderer offline"));
        let joined = err.clone();
        match (&err, &joined) {
            (MappingError::Mapping(a), MappingError::Mapping(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected mapping errors"),
        }
        assert_eq!(err.error_code(), ErrorCode::Internal);
        assert!(err.to_string().contains("renderer offline"));
    }

    #[test]
    fn argument_and_lookup_codes() {
        assert_eq!(
            MappingError::invalid("depth").error_code(),
            ErrorCode::InvalidArgument
        );
        assert_eq!(MappingError::TopicNotFound(7).error_code(), ErrorCode::NotFound);
    }
}
