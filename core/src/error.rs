use crate::model::TopicId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::Internal => "INTERNAL",
        };
        write!(f, "{}", s)
    }
}

/// Implemented by every error enum in the workspace so callers can branch on
/// a stable code instead of matching variants across crates.
pub trait CodedError: std::error::Error {
    fn error_code(&self) -> ErrorCode;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("duplicate key '{key}' in {collection}")]
    DuplicateKey { key: String, collection: String },
    #[error("topic {0} not found")]
    TopicNotFound(TopicId),
    #[error("topic id {0} is already in use")]
    DuplicateId(TopicId),
    #[error("graph already has a root topic")]
    RootAlreadyExists,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("cannot move topic {topic} under {parent}")]
    InvalidMove { topic: TopicId, parent: TopicId },
}

impl TopicError {
    pub(crate) fn duplicate_key(key: impl Into<String>, collection: impl Into<String>) -> Self {
        TopicError::DuplicateKey {
            key: key.into(),
            collection: collection.into(),
        }
    }
}

impl CodedError for TopicError {
    fn error_code(&self) -> ErrorCode {
        match self {
            TopicError::DuplicateKey { .. }
            | TopicError::DuplicateId(_)
            | TopicError::RootAlreadyExists => ErrorCode::AlreadyExists,
            TopicError::TopicNotFound(_) => ErrorCode::NotFound,
            TopicError::InvalidArgument(_) | TopicError::InvalidMove { .. } => {
                ErrorCode::InvalidArgument
            }
        }
    }
}
