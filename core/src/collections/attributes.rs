use crate::collections::keyed::{Keyed, KeyedCollection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    pub key: String,
    pub value: String,
    pub is_dirty: bool,
}

impl Keyed for AttributeValue {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Attribute name → string value, with per-attribute dirty tracking.
#[derive(Debug, Clone, Default)]
pub struct AttributeCollection {
    values: KeyedCollection<AttributeValue>,
    has_removals: bool,
}

impl AttributeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|attribute| attribute.value.as_str())
    }

    pub fn get_value_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_value(key).unwrap_or(default)
    }

    /// Sets `key` to `value`. Returns true and marks the attribute dirty when
    /// the stored value changed; writing the current value is a no-op.
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) -> bool {
        self.write(key, value.into(), true)
    }

    /// Stores a value as already persisted (repository load path).
    pub fn load_value(&mut self, key: &str, value: impl Into<String>) {
        self.write(key, value.into(), false);
    }

    fn write(&mut self, key: &str, value: String, track: bool) -> bool {
        if let Some(attribute) = self.values.get_mut(key) {
            if attribute.value == value {
                return false;
            }
            attribute.value = value;
            attribute.is_dirty |= track;
            return true;
        }
        self.values.get_or_insert_with(key, || AttributeValue {
            key: key.to_string(),
            value,
            is_dirty: track,
        });
        true
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.values.remove(key).is_some();
        if removed {
            self.has_removals = true;
        }
        removed
    }

    pub fn is_dirty(&self) -> bool {
        self.has_removals || self.values.iter().any(|attribute| attribute.is_dirty)
    }

    pub fn is_attribute_dirty(&self, key: &str) -> bool {
        self.values
            .get(key)
            .is_some_and(|attribute| attribute.is_dirty)
    }

    pub fn mark_clean(&mut self) {
        self.has_removals = false;
        for attribute in self.values.iter_mut() {
            attribute.is_dirty = false;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|attribute| (attribute.key.as_str(), attribute.value.as_str()))
    }
}
