//! Interned blackboard key names.
//!
//! Key lookup by name happens on every `find`, so names are interned once and
//! compared by address afterwards.

use ::once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Mutex;

static SYMBOL_HEAP: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// An interned string with O(1) equality.
#[derive(Clone, Copy, Eq)]
pub struct Symbol {
    s: &'static str,
}

impl Symbol {
    pub fn intern(s: &str) -> Self {
        // A poisoned heap still holds valid leaked strings.
        let mut heap = SYMBOL_HEAP
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(s) = heap.get(s) {
            return Symbol { s };
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        heap.insert(leaked);
        Symbol { s: leaked }
    }

    fn addr(self) -> usize {
        self.s.as_ptr() as usize
    }

    pub fn as_str(self) -> &'static str {
        self.s
    }

    /// Number of distinct names interned so far.
    pub fn count() -> usize {
        SYMBOL_HEAP
            .lock()
            .map(|heap| heap.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

impl Debug for Symbol {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        Debug::fmt(self.s, fmt)
    }
}

impl Display for Symbol {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        fmt.write_str(self.s)
    }
}

impl Deref for Symbol {
    type Target = str;
    fn deref(&self) -> &str {
        self.s
    }
}

impl<S: AsRef<str>> From<S> for Symbol {
    fn from(s: S) -> Symbol {
        Symbol::intern(s.as_ref())
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.s == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.s == *other
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state)
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.s.cmp(other.s)
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl serde::Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(self.s)
    }
}

impl<'de> serde::Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(de: D) -> Result<Symbol, D::Error> {
        String::deserialize(de).map(Symbol::from)
    }
}
