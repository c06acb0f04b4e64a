//! Coercion capabilities injected into every bridge.
//!
//! The bridge logic never converts values itself. It calls one of two narrow
//! interfaces:
//!
//! - [`CoerceToNative`]: script value → host value of a target type
//! - [`CoerceToDynamic`]: host value + declared type + scope → script value
//!
//! [`StandardCoercion`] implements both with the runtime's usual rules and is
//! what [`crate::context::BridgeContext::new`] installs. Tests and embedders
//! swap in their own implementations without touching the bridges.

use crate::error::{BridgeError, BridgeResult};
use crate::host::{HostValue, NativeType};
use crate::value::Value;

/// Identifies the script scope a wrapped value is exposed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScopeId(pub u64);

/// Convert a script value into a host value of a target type.
pub trait CoerceToNative: Send + Sync {
    /// Best-effort conversion; fails with [`BridgeError::Coercion`] when no
    /// conversion exists
    fn to_native(&self, value: &Value, target: &NativeType) -> BridgeResult<HostValue>;
}

/// Expose a host value to scripts.
pub trait CoerceToDynamic: Send + Sync {
    /// Wrap `value`, declared as `declared`, for use inside `scope`
    fn to_dynamic(
        &self,
        value: &HostValue,
        declared: &NativeType,
        scope: ScopeId,
    ) -> BridgeResult<Value>;
}

/// The runtime's standard conversion rules.
///
/// | script value | target                 | result                         |
/// |--------------|------------------------|--------------------------------|
/// | null/undef.  | any                    | `Null`                         |
/// | any          | `Unconstrained`        | closest host value             |
/// | number/string| `Integer`/`Long`       | integral, in range             |
/// | number/string| `Double`               | number                         |
/// | any          | `String`               | script string form             |
/// | wrapped      | matching runtime type  | the wrapped value, unchanged   |
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCoercion;

impl CoerceToNative for StandardCoercion {
    fn to_native(&self, value: &Value, target: &NativeType) -> BridgeResult<HostValue> {
        if value.is_nullish() {
            return Ok(HostValue::Null);
        }
        if let Value::Wrapped(w) = value {
            if target.is_unconstrained() || w.value.runtime_type() == *target {
                return Ok(w.value.clone());
            }
        }
        match target {
            NativeType::Unconstrained => Ok(match value {
                Value::Bool(b) => HostValue::Bool(*b),
                Value::Int(i) => HostValue::Int(*i),
                Value::Number(n) => HostValue::Double(*n),
                Value::String(s) => HostValue::Str(s.to_string()),
                // unreachable: nullish and wrapped handled above
                _ => HostValue::Null,
            }),
            NativeType::Boolean => value
                .as_bool()
                .map(HostValue::Bool)
                .ok_or_else(|| coercion_error(value, target)),
            NativeType::Integer => {
                let n = to_number(value).ok_or_else(|| coercion_error(value, target))?;
                integral_in_range(n, i32::MIN as f64, i32::MAX as f64 + 1.0)
                    .map(|n| HostValue::Int(n as i32))
                    .ok_or_else(|| coercion_error(value, target))
            }
            NativeType::Long => {
                let n = to_number(value).ok_or_else(|| coercion_error(value, target))?;
                integral_in_range(n, i64::MIN as f64, I64_END)
                    .map(|n| HostValue::Long(n as i64))
                    .ok_or_else(|| coercion_error(value, target))
            }
            NativeType::Double => to_number(value)
                .map(HostValue::Double)
                .ok_or_else(|| coercion_error(value, target)),
            NativeType::String => Ok(HostValue::Str(value.to_script_string())),
            NativeType::Class(_) => Err(coercion_error(value, target)),
        }
    }
}

impl CoerceToDynamic for StandardCoercion {
    fn to_dynamic(
        &self,
        value: &HostValue,
        declared: &NativeType,
        _scope: ScopeId,
    ) -> BridgeResult<Value> {
        Ok(match value {
            HostValue::Null => Value::Null,
            HostValue::Bool(b) => Value::Bool(*b),
            HostValue::Int(i) => Value::Int(*i),
            HostValue::Long(l) => Value::Number(*l as f64),
            HostValue::Double(d) => Value::Number(*d),
            HostValue::Str(s) => Value::string(s),
            HostValue::Record(_) | HostValue::Object(_) => {
                let declared = if declared.is_unconstrained() {
                    value.runtime_type()
                } else {
                    declared.clone()
                };
                Value::wrap(value.clone(), declared)
            }
        })
    }
}

fn coercion_error(value: &Value, target: &NativeType) -> BridgeError {
    BridgeError::coercion(format!("{} '{}'", value.type_name(), value.to_script_string()), target)
}

/// Script `ToNumber` for the values that have a numeric reading.
fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Number(n) => Some(*n),
        Value::String(s) => parse_script_number(s),
        Value::Wrapped(w) => w.value.as_f64(),
        _ => None,
    }
}

/// `i64::MAX + 1` (2^63), the first double past the `Long` range.
const I64_END: f64 = 9_223_372_036_854_775_808.0;

/// Truncate `n` if it falls in `[min, end)`.
fn integral_in_range(n: f64, min: f64, end: f64) -> Option<f64> {
    if !n.is_finite() {
        return None;
    }
    let t = n.trunc();
    if t < min || t >= end {
        return None;
    }
    Some(t)
}

/// Parse a numeric string the way scripts do: surrounding whitespace is
/// ignored, the empty string is zero, `0x` prefixes are hexadecimal and
/// `Infinity` / `NaN` are spelled out. Anything else that is not a plain
/// decimal literal has no numeric reading, so it fails coercion instead of
/// becoming `NaN`.
pub fn parse_script_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return Some(0.0);
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    match t {
        "NaN" => return Some(f64::NAN),
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    let decimal = t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !decimal {
        return None;
    }
    t.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostRecord;

    #[test]
    fn test_string_to_integer() {
        let c = StandardCoercion;
        assert_eq!(
            c.to_native(&Value::string("5"), &NativeType::Integer).unwrap(),
            HostValue::Int(5)
        );
        assert_eq!(
            c.to_native(&Value::string(" 0x1F "), &NativeType::Integer).unwrap(),
            HostValue::Int(31)
        );
        assert!(c.to_native(&Value::string("five"), &NativeType::Integer).is_err());
    }

    #[test]
    fn test_number_narrowing() {
        let c = StandardCoercion;
        assert_eq!(
            c.to_native(&Value::f64(2.9), &NativeType::Integer).unwrap(),
            HostValue::Int(2)
        );
        assert_eq!(
            c.to_native(&Value::f64(-2.9), &NativeType::Long).unwrap(),
            HostValue::Long(-2)
        );
        let err = c.to_native(&Value::f64(1e12), &NativeType::Integer).unwrap_err();
        assert!(matches!(err, BridgeError::Coercion { .. }));
        assert!(c.to_native(&Value::f64(f64::NAN), &NativeType::Long).is_err());
    }

    #[test]
    fn test_range_edges_are_exact() {
        let c = StandardCoercion;
        assert!(c.to_native(&Value::f64(9223372036854775808.0), &NativeType::Long).is_err());
        assert_eq!(
            c.to_native(&Value::f64(-9223372036854775808.0), &NativeType::Long).unwrap(),
            HostValue::Long(i64::MIN)
        );
        assert_eq!(
            c.to_native(&Value::f64(2147483647.0), &NativeType::Integer).unwrap(),
            HostValue::Int(i32::MAX)
        );
        assert!(c.to_native(&Value::f64(2147483648.0), &NativeType::Integer).is_err());
        assert_eq!(
            c.to_native(&Value::f64(-2147483648.5), &NativeType::Integer).unwrap(),
            HostValue::Int(i32::MIN)
        );
    }

    #[test]
    fn test_unconstrained_keeps_script_shape() {
        let c = StandardCoercion;
        assert_eq!(
            c.to_native(&Value::i32(3), &NativeType::Unconstrained).unwrap(),
            HostValue::Int(3)
        );
        assert_eq!(
            c.to_native(&Value::f64(0.5), &NativeType::Unconstrained).unwrap(),
            HostValue::Double(0.5)
        );
        assert_eq!(
            c.to_native(&Value::string("x"), &NativeType::Unconstrained).unwrap(),
            HostValue::str("x")
        );
    }

    #[test]
    fn test_nullish_and_string_targets() {
        let c = StandardCoercion;
        assert_eq!(
            c.to_native(&Value::undefined(), &NativeType::Integer).unwrap(),
            HostValue::Null
        );
        assert_eq!(
            c.to_native(&Value::f64(5.0), &NativeType::String).unwrap(),
            HostValue::str("5")
        );
        assert!(c.to_native(&Value::i32(1), &NativeType::Boolean).is_err());
    }

    #[test]
    fn test_wrapped_round_trip_is_identity() {
        let c = StandardCoercion;
        let rec: HostValue = HostRecord::new("Point", vec![HostValue::Int(1)]).into();
        let exposed = c
            .to_dynamic(&rec, &NativeType::Unconstrained, ScopeId::default())
            .unwrap();
        assert_eq!(
            exposed.as_wrapped().map(|w| w.declared.clone()),
            Some(NativeType::class("Point"))
        );
        assert_eq!(c.to_native(&exposed, &NativeType::class("Point")).unwrap(), rec);
        assert!(c.to_native(&exposed, &NativeType::class("Line")).is_err());
    }

    #[test]
    fn test_to_dynamic_primitives() {
        let c = StandardCoercion;
        let scope = ScopeId(7);
        assert_eq!(
            c.to_dynamic(&HostValue::Long(9), &NativeType::Long, scope).unwrap(),
            Value::f64(9.0)
        );
        assert_eq!(
            c.to_dynamic(&HostValue::Null, &NativeType::Integer, scope).unwrap(),
            Value::Null
        );
        assert_eq!(
            c.to_dynamic(&HostValue::str("s"), &NativeType::String, scope).unwrap(),
            Value::string("s")
        );
    }

    #[test]
    fn test_parse_script_number() {
        assert_eq!(parse_script_number(""), Some(0.0));
        assert_eq!(parse_script_number("1e3"), Some(1000.0));
        assert_eq!(parse_script_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_script_number("inf"), None);
        assert_eq!(parse_script_number("12px"), None);
        assert!(parse_script_number(" NaN ").is_some_and(f64::is_nan));
    }
}
