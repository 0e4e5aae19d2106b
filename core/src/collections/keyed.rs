use crate::error::TopicError;
use std::collections::HashMap;
use std::ops::Index;

/// Items stored in a [`KeyedCollection`] expose a stable string key.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Ordered, key-unique container. Insertion order is preserved; a key can
/// appear at most once.
#[derive(Debug, Clone)]
pub struct KeyedCollection<T> {
    items: Vec<T>,
    positions: HashMap<String, usize>,
}

impl<T: Keyed> KeyedCollection<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.positions.get(key).map(|&idx| &self.items[idx])
    }

    /// Mutable access by key. Callers must not change the item's key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        match self.positions.get(key) {
            Some(&idx) => self.items.get_mut(idx),
            None => None,
        }
    }

    /// Returns the item under `key`, appending `make()` first when absent.
    pub fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> T) -> &mut T {
        let idx = match self.positions.get(key) {
            Some(&idx) => idx,
            None => {
                let item = make();
                debug_assert_eq!(item.key(), key);
                self.positions.insert(key.to_string(), self.items.len());
                self.items.push(item);
                self.items.len() - 1
            }
        };
        &mut self.items[idx]
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Appends `item`, failing with `DuplicateKey` when its key is present.
    pub fn add(&mut self, item: T) -> Result<(), TopicError> {
        if self.positions.contains_key(item.key()) {
            return Err(TopicError::duplicate_key(item.key(), "keyed collection"));
        }
        self.positions.insert(item.key().to_string(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        let idx = self.positions.remove(key)?;
        let removed = self.items.remove(idx);
        for item in &self.items[idx..] {
            if let Some(position) = self.positions.get_mut(item.key()) {
                *position -= 1;
            }
        }
        Some(removed)
    }

    /// Removes every item and returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        self.positions.clear();
        removed
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Callers must not change item keys.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.key())
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn as_read_only(&self) -> ReadOnlyKeyedCollection<'_, T> {
        ReadOnlyKeyedCollection { inner: self }
    }
}

impl<T: Keyed> Default for KeyedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> Index<&str> for KeyedCollection<T> {
    type Output = T;

    fn index(&self, key: &str) -> &T {
        self.get(key)
            .unwrap_or_else(|| panic!("no entry found for key '{}'", key))
    }
}

impl<'a, T: Keyed> IntoIterator for &'a KeyedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Borrowed view over a [`KeyedCollection`] exposing only reads.
#[derive(Debug)]
pub struct ReadOnlyKeyedCollection<'a, T> {
    inner: &'a KeyedCollection<T>,
}

impl<T> Clone for ReadOnlyKeyedCollection<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ReadOnlyKeyedCollection<'_, T> {}

impl<'a, T: Keyed> ReadOnlyKeyedCollection<'a, T> {
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&'a T> {
        self.inner.get(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'a, T> {
        self.inner.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.inner.keys()
    }
}

impl<'a, T: Keyed> Index<&str> for ReadOnlyKeyedCollection<'a, T> {
    type Output = T;

    fn index(&self, key: &str) -> &T {
        &self.inner[key]
    }
}

impl<'a, T: Keyed> IntoIterator for ReadOnlyKeyedCollection<'a, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
