//! Value - the script runtime's dynamic value representation
//!
//! Scripts only ever see `Value`s. Native collection contents cross the
//! boundary through the coercion capabilities in [`crate::convert`]:
//!
//! ```text
//! HostValue ──to_dynamic(declared, scope)──▶ Value
//! Value     ──to_native(target)────────────▶ HostValue
//! ```
//!
//! Host values without a primitive script form (records, opaque objects)
//! travel as [`Value::Wrapped`], which remembers the declared type they were
//! exposed under so that writing them back is identity-preserving.

use std::sync::Arc;

use crate::host::{HostValue, NativeType};

/// Host value exposed to scripts under a declared type
#[derive(Debug, Clone, PartialEq)]
pub struct Wrapped {
    /// The underlying host value
    pub value: HostValue,
    /// Type the value was exposed under
    pub declared: NativeType,
}

/// Dynamic script value.
#[derive(Clone, PartialEq, Default)]
pub enum Value {
    /// The runtime's `undefined` sentinel; assigning it to a string-keyed map
    /// entry deletes the entry
    #[default]
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Small integer
    Int(i32),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(Arc<str>),
    /// Wrapped host value
    Wrapped(Arc<Wrapped>),
}

impl Value {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create the undefined sentinel
    #[inline]
    pub const fn undefined() -> Self {
        Value::Undefined
    }

    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Value::Null
    }

    /// Create a boolean value
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create an i32 value
    #[inline]
    pub const fn i32(i: i32) -> Self {
        Value::Int(i)
    }

    /// Create a number value
    #[inline]
    pub const fn f64(f: f64) -> Self {
        Value::Number(f)
    }

    /// Create a string value
    #[inline]
    pub fn string(s: &str) -> Self {
        Value::String(Arc::from(s))
    }

    /// Wrap a host value under its declared type
    pub fn wrap(value: HostValue, declared: NativeType) -> Self {
        Value::Wrapped(Arc::new(Wrapped { value, declared }))
    }

    // ========================================================================
    // Type checks
    // ========================================================================

    /// Check if value is the undefined sentinel
    #[inline]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is null or undefined
    #[inline]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Check if value is a number of either representation
    #[inline]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Number(_))
    }

    // ========================================================================
    // Extractors
    // ========================================================================

    /// Extract boolean value
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract i32 value
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract numeric value from either number representation
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract the wrapped host value
    pub fn as_wrapped(&self) -> Option<&Wrapped> {
        match self {
            Value::Wrapped(w) => Some(w),
            _ => None,
        }
    }

    /// Get type name for debugging
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Wrapped(_) => "object",
        }
    }

    /// Script `String(x)` conversion
    pub fn to_script_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.to_string(),
            Value::Wrapped(w) => w.value.to_script_string(),
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => write!(f, "Value::Undefined"),
            Value::Null => write!(f, "Value::Null"),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::Int(i) => write!(f, "Value::Int({})", i),
            Value::Number(n) => write!(f, "Value::Number({})", n),
            Value::String(s) => write!(f, "Value::String({:?})", s),
            Value::Wrapped(w) => write!(f, "Value::Wrapped({:?} as {})", w.value, w.declared),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

/// Render a number the way scripts print it: integral values without a
/// fractional part, `NaN` and `Infinity` spelled out, and magnitudes of at
/// least `1e21` or below `1e-6` in exponent form with an explicit sign
/// (`1e+21`, `1.5e-7`).
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        // covers -0
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let s = format!("{:e}", n);
        match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        }
    } else {
        // shortest round-trip digits; integral values print without `.0`
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert!(Value::undefined().is_undefined());
        assert!(Value::null().is_null());
        assert!(!Value::null().is_undefined());
        assert!(Value::undefined().is_nullish());
        assert_eq!(Value::default(), Value::Undefined);
    }

    #[test]
    fn test_extractors() {
        assert_eq!(Value::i32(42).as_i32(), Some(42));
        assert_eq!(Value::i32(42).as_f64(), Some(42.0));
        assert_eq!(Value::bool(true).as_bool(), Some(true));
        assert_eq!(Value::string("x").as_str(), Some("x"));
        assert!(Value::f64(1.5).as_i32().is_none());
    }

    #[test]
    fn test_type_discrimination() {
        assert_eq!(Value::i32(1).type_name(), "number");
        assert_eq!(Value::f64(1.0).type_name(), "number");
        assert_eq!(Value::string("a").type_name(), "string");
        assert_eq!(
            Value::wrap(HostValue::Int(1), NativeType::Integer).type_name(),
            "object"
        );
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(5.0), "5");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.25), "0.25");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(-1.2345e25), "-1.2345e+25");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(123456789012345680000.0), "123456789012345680000");
    }

    #[test]
    fn test_debug_format() {
        let s = format!("{:?}", Value::i32(42));
        assert!(s.contains("42"));
    }
}
