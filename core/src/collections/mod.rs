pub mod attributes;
pub mod keyed;
pub mod relationships;

pub use attributes::{AttributeCollection, AttributeValue};
pub use keyed::{Keyed, KeyedCollection, ReadOnlyKeyedCollection};
pub use relationships::{RelationshipIndex, RelationshipSet};
