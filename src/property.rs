use crate::blackboard::{Blackboard, BlackboardType, Key};

/// A node field that either holds an inline value or reads and writes through
/// a blackboard key.
///
/// Once a key is bound every access goes through the key; the inline default
/// is only what the field holds while unbound. Cloning a property keeps the
/// same key binding, it never duplicates the key.
#[derive(Clone, Debug, Default)]
pub struct NodeProperty<T: BlackboardType> {
    default: T,
    key: Option<Key<T>>,
}

impl<T: BlackboardType> NodeProperty<T> {
    pub fn new(default: T) -> Self {
        Self { default, key: None }
    }

    pub fn bound(key: Key<T>) -> Self {
        Self {
            default: T::default(),
            key: Some(key),
        }
    }

    pub fn with_key(mut self, key: Key<T>) -> Self {
        self.key = Some(key);
        self
    }

    pub fn bind(&mut self, key: Option<Key<T>>) {
        self.key = key;
    }

    pub fn key(&self) -> Option<Key<T>> {
        self.key
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn value(&self, blackboard: &Blackboard) -> T {
        match self.key {
            Some(key) => blackboard.get(key).cloned().unwrap_or_default(),
            None => self.default.clone(),
        }
    }

    pub fn set_value(&mut self, blackboard: &mut Blackboard, value: T) {
        match self.key {
            Some(key) => {
                blackboard.set(key, value);
            }
            None => self.default = value,
        }
    }
}

impl<T: BlackboardType> From<T> for NodeProperty<T> {
    fn from(default: T) -> Self {
        Self::new(default)
    }
}
