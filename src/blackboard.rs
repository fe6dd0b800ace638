use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Mul, Sub};

use crate::{error::BlackboardError, Symbol};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0., 0., 0.);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// The closed set of types a blackboard key can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Bool,
    Int,
    Float,
    String,
    Vec3,
}

impl KeyType {
    pub fn default_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.),
            Self::String => Value::String(String::new()),
            Self::Vec3 => Value::Vec3(Vec3::ZERO),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Vec3 => "vec3",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    Vec3(Vec3),
}

impl Value {
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Bool(_) => KeyType::Bool,
            Self::Int(_) => KeyType::Int,
            Self::Float(_) => KeyType::Float,
            Self::String(_) => KeyType::String,
            Self::Vec3(_) => KeyType::Vec3,
        }
    }
}

/// Rust types that map onto one [`KeyType`].
pub trait BlackboardType: Clone + Default + fmt::Debug + 'static {
    const KEY_TYPE: KeyType;

    fn from_value(value: &Value) -> Option<&Self>;

    fn from_value_mut(value: &mut Value) -> Option<&mut Self>;

    fn into_value(self) -> Value;
}

macro_rules! impl_blackboard_type {
    ($ty:ty, $variant:ident) => {
        impl BlackboardType for $ty {
            const KEY_TYPE: KeyType = KeyType::$variant;

            fn from_value(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_blackboard_type!(bool, Bool);
impl_blackboard_type!(i32, Int);
impl_blackboard_type!(f32, Float);
impl_blackboard_type!(String, String);
impl_blackboard_type!(Vec3, Vec3);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

/// Position of a key in its blackboard. Clones of a blackboard keep the same
/// order, so an id stays valid across a tree clone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyId(pub(crate) usize);

/// A [`KeyId`] whose value type is checked at lookup time.
pub struct Key<T: 'static> {
    id: KeyId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Key<T> {
    pub(crate) fn new(id: KeyId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(self) -> KeyId {
        self.id
    }
}

impl<T: 'static> Copy for Key<T> {}

impl<T: 'static> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: 'static> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Key<{}>({})", std::any::type_name::<T>(), self.id.0)
    }
}

#[derive(Clone, Debug)]
pub struct BlackboardKey {
    name: Symbol,
    value: Value,
}

impl BlackboardKey {
    pub fn new(name: impl Into<Symbol>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn with_type(name: impl Into<Symbol>, ty: KeyType) -> Self {
        Self::new(name, ty.default_value())
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn underlying_type(&self) -> KeyType {
        self.value.key_type()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn get<T: BlackboardType>(&self) -> Option<&T> {
        T::from_value(&self.value)
    }

    /// Writes `value` if `T` is this key's type. Returns whether it was written.
    pub fn set<T: BlackboardType>(&mut self, value: T) -> bool {
        match T::from_value_mut(&mut self.value) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Copies the value of `other` into this key. A key of another type leaves
    /// this one untouched; the return value tells whether the copy happened.
    pub fn copy_value_from(&mut self, other: &BlackboardKey) -> bool {
        if other.underlying_type() != self.underlying_type() {
            return false;
        }
        self.value = other.value.clone();
        true
    }
}

/// Keys compare by type and value; names are not part of equality.
impl PartialEq for BlackboardKey {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Named, typed key slots shared by every node of one tree instance.
#[derive(Clone, Debug, Default)]
pub struct Blackboard {
    keys: Vec<BlackboardKey>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_key(&mut self, key: BlackboardKey) -> Result<KeyId, BlackboardError> {
        if self.find(key.name).is_some() {
            return Err(BlackboardError::DuplicateKey(key.name.to_string()));
        }
        self.keys.push(key);
        Ok(KeyId(self.keys.len() - 1))
    }

    pub fn add<T: BlackboardType>(
        &mut self,
        name: impl Into<Symbol>,
        value: T,
    ) -> Result<Key<T>, BlackboardError> {
        self.add_key(BlackboardKey::new(name, value.into_value()))
            .map(Key::new)
    }

    pub fn find(&self, name: impl Into<Symbol>) -> Option<KeyId> {
        let name = name.into();
        self.keys
            .iter()
            .position(|key| key.name == name)
            .map(KeyId)
    }

    pub fn find_key(&self, name: impl Into<Symbol>) -> Option<&BlackboardKey> {
        self.find(name).and_then(|id| self.key(id))
    }

    /// Looks up `name` and checks that it holds a `T`.
    pub fn find_typed<T: BlackboardType>(&self, name: impl Into<Symbol>) -> Option<Key<T>> {
        let id = self.find(name)?;
        (self.keys[id.0].underlying_type() == T::KEY_TYPE).then(|| Key::new(id))
    }

    pub fn key(&self, id: KeyId) -> Option<&BlackboardKey> {
        self.keys.get(id.0)
    }

    pub fn key_mut(&mut self, id: KeyId) -> Option<&mut BlackboardKey> {
        self.keys.get_mut(id.0)
    }

    pub fn get<T: BlackboardType>(&self, key: Key<T>) -> Option<&T> {
        self.key(key.id).and_then(BlackboardKey::get)
    }

    pub fn set<T: BlackboardType>(&mut self, key: Key<T>, value: T) -> bool {
        self.key_mut(key.id)
            .map_or(false, |slot| slot.set(value))
    }

    /// Sets the value of an existing key. Absent names and other types are
    /// ignored.
    pub fn set_value<T: BlackboardType>(&mut self, name: impl Into<Symbol>, value: T) -> bool {
        match self.find_typed::<T>(name) {
            Some(key) => self.set(key, value),
            None => false,
        }
    }

    /// Reads a key by name, falling back to `T::default()`.
    pub fn get_value<T: BlackboardType>(&self, name: impl Into<Symbol>) -> T {
        self.find_typed::<T>(name)
            .and_then(|key| self.get(key))
            .cloned()
            .unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &BlackboardKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod test;
