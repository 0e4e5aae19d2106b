pub mod document;
pub mod repo;

pub use document::{export_document, import_document, TopicDocument};
pub use repo::{RepoError, Repository};
