use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use topicgraph_core::Topic;

/// Shared handle to a child-inclusion predicate.
///
/// Two handles are equal only when they point at the same predicate
/// instance: clones of one handle compare equal, while two handles built
/// from behaviorally identical closures do not.
#[derive(Clone)]
pub struct TopicValidator(Arc<dyn Fn(&Topic) -> bool + Send + Sync>);

impl TopicValidator {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Topic) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn validate(&self, topic: &Topic) -> bool {
        (self.0)(topic)
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for TopicValidator {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for TopicValidator {}

impl Hash for TopicValidator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for TopicValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicValidator({:#x})", self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_follows_the_instance_not_the_behavior() {
        let a = TopicValidator::new(|topic| topic.key().ends_with('1'));
        let b = TopicValidator::new(|topic| topic.key().ends_with('1'));
        let a2 = a.clone();

        assert_eq!(a, a2);
        assert_ne!(a, b);

        let set: HashSet<_> = [a, a2, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
