//! Host-side values and their raw native types
//!
//! `HostValue` is what native collections store: the strongly-typed side of
//! the bridge. `NativeType` is the raw type a collection declares for its
//! elements, keys or values, with `Unconstrained` as the single fallback when
//! no parameterization is known.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::value::number_to_string;

// ============================================================================
// NativeType
// ============================================================================

/// Raw native type of a collection element, key or value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NativeType {
    /// No constraint; any host value is accepted as-is
    #[default]
    Unconstrained,
    /// Boolean
    Boolean,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    Long,
    /// 64-bit float
    Double,
    /// UTF-8 string
    String,
    /// Named host class (records, opaque host objects, nested collections)
    Class(Arc<str>),
}

impl NativeType {
    /// Create a named class type
    pub fn class(name: &str) -> Self {
        NativeType::Class(Arc::from(name))
    }

    /// Map a host type name onto a native type.
    ///
    /// Unknown names become `Class` types.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Object" | "any" => NativeType::Unconstrained,
            "Boolean" | "boolean" | "bool" => NativeType::Boolean,
            "Integer" | "int" | "i32" => NativeType::Integer,
            "Long" | "long" | "i64" => NativeType::Long,
            "Double" | "double" | "f64" | "number" => NativeType::Double,
            "String" | "string" => NativeType::String,
            other => NativeType::class(other),
        }
    }

    /// Type name used in diagnostics
    pub fn name(&self) -> &str {
        match self {
            NativeType::Unconstrained => "Object",
            NativeType::Boolean => "Boolean",
            NativeType::Integer => "Integer",
            NativeType::Long => "Long",
            NativeType::Double => "Double",
            NativeType::String => "String",
            NativeType::Class(name) => name,
        }
    }

    /// Check if this is the unconstrained sentinel
    pub fn is_unconstrained(&self) -> bool {
        matches!(self, NativeType::Unconstrained)
    }

    /// Check if this is one of the numeric types
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            NativeType::Integer | NativeType::Long | NativeType::Double
        )
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// HostRecord
// ============================================================================

/// Composite host value compared structurally.
///
/// Records are the typical non-trivial map key: their script-visible form is
/// `Class(field, field, ...)`, which is what the key translation layer
/// matches against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostRecord {
    class: Arc<str>,
    fields: Vec<HostValue>,
}

impl HostRecord {
    /// Create a record of the given class
    pub fn new(class: &str, fields: Vec<HostValue>) -> Self {
        Self {
            class: Arc::from(class),
            fields,
        }
    }

    /// Record class name
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// Record fields in declaration order
    pub fn fields(&self) -> &[HostValue] {
        &self.fields
    }
}

impl fmt::Display for HostRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.class)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", field)?;
        }
        f.write_str(")")
    }
}

// ============================================================================
// HostObject
// ============================================================================

/// Opaque host object compared by identity.
#[derive(Clone)]
pub struct HostObject {
    class: Arc<str>,
    inner: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    /// Wrap an arbitrary host value under a class name
    pub fn new<T: Any + Send + Sync>(class: &str, value: T) -> Self {
        Self {
            class: Arc::from(class),
            inner: Arc::new(value),
        }
    }

    /// Host class name
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// Borrow the wrapped value if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl PartialEq for HostObject {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for HostObject {}

impl Hash for HostObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject({}@{:#x})", self.class, self.addr())
    }
}

// ============================================================================
// HostValue
// ============================================================================

/// Value stored inside a native collection.
///
/// Equality follows the host's rules: variants never compare equal across
/// types (`Int(1) != Long(1)`), and doubles compare by bit pattern so that
/// `NaN` can be used as a key.
#[derive(Debug, Clone, Default)]
pub enum HostValue {
    /// Null reference (also the placeholder for grown sequence slots)
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// String
    Str(String),
    /// Structurally compared composite
    Record(HostRecord),
    /// Identity-compared opaque object
    Object(HostObject),
}

impl HostValue {
    /// Create a string value
    pub fn str(s: impl Into<String>) -> Self {
        HostValue::Str(s.into())
    }

    /// Check if this is the null reference
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Check if this value is a number
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            HostValue::Int(_) | HostValue::Long(_) | HostValue::Double(_)
        )
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as i32 if this is an `Int`
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            HostValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is any number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Int(i) => Some(*i as f64),
            HostValue::Long(l) => Some(*l as f64),
            HostValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Runtime type of this value; `Null` has no type and reports
    /// `Unconstrained`.
    pub fn runtime_type(&self) -> NativeType {
        match self {
            HostValue::Null => NativeType::Unconstrained,
            HostValue::Bool(_) => NativeType::Boolean,
            HostValue::Int(_) => NativeType::Integer,
            HostValue::Long(_) => NativeType::Long,
            HostValue::Double(_) => NativeType::Double,
            HostValue::Str(_) => NativeType::String,
            HostValue::Record(r) => NativeType::Class(r.class.clone()),
            HostValue::Object(o) => NativeType::Class(o.class.clone()),
        }
    }

    /// Script-visible string form, as produced by the runtime's `String(x)`.
    pub fn to_script_string(&self) -> String {
        match self {
            HostValue::Null => "null".to_string(),
            HostValue::Bool(b) => b.to_string(),
            HostValue::Int(i) => i.to_string(),
            HostValue::Long(l) => l.to_string(),
            HostValue::Double(d) => number_to_string(*d),
            HostValue::Str(s) => s.clone(),
            HostValue::Record(r) => r.to_string(),
            HostValue::Object(o) => format!("[object {}]", o.class),
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Long(a), HostValue::Long(b)) => a == b,
            (HostValue::Double(a), HostValue::Double(b)) => a.to_bits() == b.to_bits(),
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Record(a), HostValue::Record(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for HostValue {}

impl Hash for HostValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            HostValue::Null => {}
            HostValue::Bool(b) => b.hash(state),
            HostValue::Int(i) => i.hash(state),
            HostValue::Long(l) => l.hash(state),
            HostValue::Double(d) => d.to_bits().hash(state),
            HostValue::Str(s) => s.hash(state),
            HostValue::Record(r) => r.hash(state),
            HostValue::Object(o) => o.hash(state),
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_script_string())
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<i32> for HostValue {
    fn from(i: i32) -> Self {
        HostValue::Int(i)
    }
}

impl From<i64> for HostValue {
    fn from(l: i64) -> Self {
        HostValue::Long(l)
    }
}

impl From<f64> for HostValue {
    fn from(d: f64) -> Self {
        HostValue::Double(d)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Str(s)
    }
}

impl From<HostRecord> for HostValue {
    fn from(r: HostRecord) -> Self {
        HostValue::Record(r)
    }
}

impl From<HostObject> for HostValue {
    fn from(o: HostObject) -> Self {
        HostValue::Object(o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(v: &HostValue) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_equality_is_type_strict() {
        assert_ne!(HostValue::Int(1), HostValue::Long(1));
        assert_ne!(HostValue::Int(1), HostValue::Double(1.0));
        assert_eq!(HostValue::from("a"), HostValue::str("a"));
    }

    #[test]
    fn test_nan_is_usable_as_key() {
        let nan = HostValue::Double(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(hash_of(&nan), hash_of(&nan.clone()));
    }

    #[test]
    fn test_script_string() {
        assert_eq!(HostValue::Null.to_script_string(), "null");
        assert_eq!(HostValue::Double(5.0).to_script_string(), "5");
        assert_eq!(HostValue::Double(2.5).to_script_string(), "2.5");
        assert_eq!(HostValue::Long(-7).to_script_string(), "-7");

        let point = HostRecord::new("Point", vec![1.into(), 2.into()]);
        assert_eq!(HostValue::from(point).to_script_string(), "Point(1, 2)");
    }

    #[test]
    fn test_runtime_type() {
        assert_eq!(HostValue::Int(3).runtime_type(), NativeType::Integer);
        assert_eq!(HostValue::Null.runtime_type(), NativeType::Unconstrained);
        let rec = HostRecord::new("Point", vec![]);
        assert_eq!(HostValue::from(rec).runtime_type(), NativeType::class("Point"));
    }

    #[test]
    fn test_host_object_identity() {
        let a = HostObject::new("Handle", 42u32);
        let b = HostObject::new("Handle", 42u32);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<u32>(), Some(&42));
        assert!(a.downcast_ref::<i64>().is_none());
    }

    #[test]
    fn test_native_type_names() {
        assert_eq!(NativeType::from_name("Integer"), NativeType::Integer);
        assert_eq!(NativeType::from_name("Object"), NativeType::Unconstrained);
        assert_eq!(NativeType::from_name("Point"), NativeType::class("Point"));
        assert_eq!(NativeType::Unconstrained.to_string(), "Object");
    }
}
