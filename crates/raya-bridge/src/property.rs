//! Dynamic property access surface
//!
//! The hosting object model drives every bridge through [`PropertyAccess`]:
//! `has`/`get`/`put`/`delete` by name or index, plus `ids` for enumeration.
//! "Not found" is `Ok(None)` from `get`; [`Value::Undefined`] is the
//! runtime's undefined sentinel.
//!
//! Properties the host attaches directly to a bridge (methods, explicit
//! fields) live in an [`OwnProperties`] store, kept separate from the wrapped
//! collection so the two lookup tiers stay inspectable.

use std::fmt;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::BridgeResult;
use crate::value::{number_to_string, Value};

// ============================================================================
// Keys and ids
// ============================================================================

/// Property name or index as supplied by a script
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Named property (`obj.name`, `obj["name"]`)
    Name(String),
    /// Integer index (`obj[3]`)
    Index(u32),
}

impl PropertyKey {
    /// Script string form of the key; indexes render in decimal
    pub fn to_script_string(&self) -> String {
        match self {
            PropertyKey::Name(name) => name.clone(),
            PropertyKey::Index(index) => index.to_string(),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::Name(name.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        PropertyKey::Name(name)
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        PropertyKey::Index(index)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Name(name) => f.write_str(name),
            PropertyKey::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Externally visible identifier produced by enumeration
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyId {
    /// String identifier
    Name(String),
    /// Integral numeric identifier
    Int(i64),
    /// Non-integral numeric identifier
    Float(f64),
}

impl PropertyId {
    /// Key to read this id back through [`PropertyAccess::get`].
    ///
    /// Numeric ids outside the index range map to their string form.
    pub fn to_key(&self) -> PropertyKey {
        match self {
            PropertyId::Int(i) => match u32::try_from(*i) {
                Ok(index) => PropertyKey::Index(index),
                Err(_) => PropertyKey::Name(i.to_string()),
            },
            other => PropertyKey::Name(other.to_string()),
        }
    }

    /// Check if this is a numeric id
    pub fn is_numeric(&self) -> bool {
        !matches!(self, PropertyId::Name(_))
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyId::Name(name) => f.write_str(name),
            PropertyId::Int(i) => write!(f, "{}", i),
            PropertyId::Float(n) => f.write_str(&number_to_string(*n)),
        }
    }
}

// ============================================================================
// OwnProperties
// ============================================================================

/// Properties attached directly to a bridge object.
#[derive(Debug, Default)]
pub struct OwnProperties {
    slots: RwLock<IndexMap<String, Value>>,
}

impl OwnProperties {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach or overwrite a property
    pub fn define(&self, name: &str, value: Value) {
        self.slots.write().insert(name.to_string(), value);
    }

    /// Check if a property is attached
    pub fn has(&self, name: &str) -> bool {
        self.slots.read().contains_key(name)
    }

    /// Value of an attached property
    pub fn get(&self, name: &str) -> Option<Value> {
        self.slots.read().get(name).cloned()
    }

    /// Overwrite an attached property; returns false if it is not attached
    pub fn put(&self, name: &str, value: Value) -> bool {
        match self.slots.write().get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Detach a property
    pub fn remove(&self, name: &str) -> bool {
        self.slots.write().shift_remove(name).is_some()
    }

    /// Attached property names in definition order
    pub fn names(&self) -> Vec<String> {
        self.slots.read().keys().cloned().collect()
    }

    /// Number of attached properties
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Check if nothing is attached
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

// ============================================================================
// PropertyAccess
// ============================================================================

/// Generic property protocol the hosting object model calls into.
pub trait PropertyAccess {
    /// Class name reported to scripts
    fn class_name(&self) -> &'static str;

    /// Check if a property or entry exists
    fn has(&self, key: &PropertyKey) -> bool;

    /// Read a property; `Ok(None)` means not found
    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<Value>>;

    /// Write a property
    fn put(&self, key: &PropertyKey, value: Value) -> BridgeResult<()>;

    /// Delete a property; returns whether anything was removed
    fn delete(&self, key: &PropertyKey) -> BridgeResult<bool>;

    /// Enumerable identifiers in iteration order
    fn ids(&self) -> Vec<PropertyId>;

    /// Properties attached to the bridge itself
    fn own_properties(&self) -> &OwnProperties;
}
