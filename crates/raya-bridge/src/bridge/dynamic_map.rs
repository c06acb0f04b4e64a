//! Dynamic-key map bridge: script property access over arbitrary native keys
//!
//! Scripts can only name entries by string or index. For maps whose keys
//! are integers, doubles or composite records, every name is translated to
//! the native key object it stands for through a [`KeyTranslationCache`].
//! Reads never add translations; writes of an unseen name coerce the name
//! to the key type and remember the result.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::key_cache::KeyTranslationCache;
use crate::collection::{MapHandle, NativeMap, Shared};
use crate::context::BridgeContext;
use crate::error::BridgeResult;
use crate::host::{HostValue, NativeType};
use crate::property::{OwnProperties, PropertyAccess, PropertyId, PropertyKey};
use crate::types::{TypeDescriptor, TypeSignature};
use crate::value::Value;

/// Exposes a native map with non-string keys to scripts.
///
/// Entries in the map take precedence over own properties on reads; own
/// properties are only consulted when no entry matches.
pub struct DynamicKeyMapBridge<M = IndexMap<HostValue, HostValue>>
where
    M: NativeMap<Key = HostValue>,
{
    map: MapHandle<M>,
    types: TypeDescriptor,
    ctx: BridgeContext,
    own: OwnProperties,
    key_cache: Mutex<KeyTranslationCache>,
}

impl<M: NativeMap<Key = HostValue>> DynamicKeyMapBridge<M> {
    /// Bridge `map`, resolving key and value types from `signature` or from
    /// the map's own declared signature.
    pub fn new(map: Shared<M>, signature: Option<&TypeSignature>, ctx: BridgeContext) -> Self {
        let introspected = map.read().generic_signature();
        let types = TypeDescriptor::for_map(signature, introspected, ctx.resolver());
        debug!(
            key = %types.key(),
            value = %types.value(),
            source = ?types.source(),
            "dynamic-key map bridge created"
        );
        Self {
            map: MapHandle::new(map),
            types,
            ctx,
            own: OwnProperties::new(),
            key_cache: Mutex::new(KeyTranslationCache::new()),
        }
    }

    /// Resolved key type
    pub fn key_type(&self) -> &NativeType {
        self.types.key()
    }

    /// Resolved value type
    pub fn value_type(&self) -> &NativeType {
        self.types.value()
    }

    /// Resolved type descriptor
    pub fn types(&self) -> &TypeDescriptor {
        &self.types
    }

    /// Native map operations (no coercion)
    pub fn native(&self) -> &MapHandle<M> {
        &self.map
    }

    /// Capabilities this bridge was built with
    pub fn context(&self) -> &BridgeContext {
        &self.ctx
    }

    /// Check if the translation cache has been populated
    pub fn is_key_cache_built(&self) -> bool {
        self.key_cache.lock().is_built()
    }

    /// Number of cached translations
    pub fn cached_key_count(&self) -> usize {
        self.key_cache.lock().len()
    }

    /// Forget every translation. The next lookup rescans the map, picking
    /// up keys the host added since the cache was built.
    pub fn invalidate_key_cache(&self) {
        self.key_cache.lock().invalidate();
        debug!("key translation cache invalidated");
    }

    /// Rescan the map now
    pub fn rebuild_key_cache(&self) {
        let mut cache = self.key_cache.lock();
        self.populate(&mut cache);
    }

    /// Native key `name` stands for, without creating a translation.
    pub fn lookup_key(&self, name: &str) -> Option<HostValue> {
        if self.bypasses_cache() {
            return Some(HostValue::str(name));
        }
        let mut cache = self.key_cache.lock();
        if let Some(key) = cache.lookup(name) {
            return Some(key.clone());
        }
        if cache.is_built() {
            return None;
        }
        self.populate(&mut cache);
        cache.lookup(name).cloned()
    }

    /// Native key `name` stands for, coercing `name` to the key type and
    /// remembering the result when no existing key matches.
    pub fn translate_key(&self, name: &str) -> BridgeResult<HostValue> {
        if let Some(key) = self.lookup_key(name) {
            return Ok(key);
        }
        let key = self.ctx.to_native(&Value::string(name), self.types.key())?;
        self.key_cache.lock().memoize(name.to_string(), key.clone());
        debug!(name = %name, key = ?key, "key translation memoised");
        Ok(key)
    }

    /// Entry named `name`, exposed to scripts; `None` if no entry matches.
    ///
    /// Values are wrapped under their own runtime type; a null entry reads
    /// as [`Value::Null`] without consulting the coercion capability.
    pub fn read(&self, name: &str) -> BridgeResult<Option<Value>> {
        let Some(key) = self.lookup_key(name) else {
            return Ok(None);
        };
        match self.map.get(&key) {
            Some(HostValue::Null) => Ok(Some(Value::Null)),
            Some(value) => self.ctx.to_dynamic(&value, &value.runtime_type()).map(Some),
            None => Ok(None),
        }
    }

    /// Coerce `value` to the value type and store it under the key `name`
    /// translates to.
    pub fn write(&self, name: &str, value: &Value) -> BridgeResult<()> {
        let value = self.ctx.to_native(value, self.types.value())?;
        let key = self.translate_key(name)?;
        self.map.insert(key, value);
        Ok(())
    }

    fn bypasses_cache(&self) -> bool {
        *self.types.key() == NativeType::String
    }

    fn populate(&self, cache: &mut KeyTranslationCache) {
        cache.build(self.map.read().as_map().keys());
        debug!(entries = cache.len(), "key translation cache built");
    }
}

impl<M: NativeMap<Key = HostValue>> PropertyAccess for DynamicKeyMapBridge<M> {
    fn class_name(&self) -> &'static str {
        "HostMap"
    }

    fn has(&self, key: &PropertyKey) -> bool {
        let name = key.to_script_string();
        let in_map = self
            .lookup_key(&name)
            .is_some_and(|native| self.map.contains_key(&native));
        in_map || self.own.has(&name)
    }

    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<Value>> {
        let name = key.to_script_string();
        if let Some(value) = self.read(&name)? {
            return Ok(Some(value));
        }
        let own = self.own.get(&name);
        if own.is_none() {
            trace!(name = %name, "map entry not found");
        }
        Ok(own)
    }

    fn put(&self, key: &PropertyKey, value: Value) -> BridgeResult<()> {
        self.write(&key.to_script_string(), &value)
    }

    fn delete(&self, key: &PropertyKey) -> BridgeResult<bool> {
        let name = key.to_script_string();
        if let Some(native) = self.lookup_key(&name) {
            if self.map.remove(&native).is_some() {
                debug!(name = %name, "map entry deleted");
                return Ok(true);
            }
        }
        Ok(self.own.remove(&name))
    }

    fn ids(&self) -> Vec<PropertyId> {
        self.map
            .read()
            .as_map()
            .keys()
            .map(|key| match key {
                HostValue::Int(i) => PropertyId::Int(i64::from(*i)),
                HostValue::Long(l) => PropertyId::Int(*l),
                HostValue::Double(d) => PropertyId::Float(*d),
                other => PropertyId::Name(other.to_script_string()),
            })
            .collect()
    }

    fn own_properties(&self) -> &OwnProperties {
        &self.own
    }
}

impl<M: NativeMap<Key = HostValue>> PartialEq for DynamicKeyMapBridge<M> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<M: NativeMap<Key = HostValue>> PartialEq<IndexMap<HostValue, HostValue>>
    for DynamicKeyMapBridge<M>
{
    fn eq(&self, other: &IndexMap<HostValue, HostValue>) -> bool {
        self.map == *other
    }
}

impl<M: NativeMap<Key = HostValue>> Hash for DynamicKeyMapBridge<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.map.hash(state);
    }
}

impl<M: NativeMap<Key = HostValue>> fmt::Display for DynamicKeyMapBridge<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.map.read().as_map().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        f.write_str("}")
    }
}

impl<M: NativeMap<Key = HostValue>> fmt::Debug for DynamicKeyMapBridge<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicKeyMapBridge")
            .field("key_type", self.types.key())
            .field("value_type", self.types.value())
            .field("len", &self.map.len())
            .field("cached_keys", &self.cached_key_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{share, Typed};
    use crate::error::BridgeError;
    use crate::host::HostRecord;

    fn bridge(
        entries: Vec<(HostValue, HostValue)>,
        key: NativeType,
        value: NativeType,
    ) -> DynamicKeyMapBridge {
        let sig = TypeSignature::map_of(key, value);
        let map: IndexMap<HostValue, HostValue> = entries.into_iter().collect();
        DynamicKeyMapBridge::new(share(map), Some(&sig), BridgeContext::new())
    }

    fn point(x: i32, y: i32) -> HostValue {
        HostRecord::new("Point", vec![HostValue::Int(x), HostValue::Int(y)]).into()
    }

    #[test]
    fn test_integer_keys_by_index_and_name() {
        let b = bridge(
            vec![(HostValue::Int(1), HostValue::str("a")), (HostValue::Int(2), HostValue::str("b"))],
            NativeType::Integer,
            NativeType::String,
        );
        assert!(b.has(&PropertyKey::Index(1)));
        assert!(b.has(&"2".into()));
        assert!(!b.has(&PropertyKey::Index(3)));
        assert_eq!(b.get(&PropertyKey::Index(1)).unwrap(), Some(Value::string("a")));
        assert_eq!(b.get(&"2".into()).unwrap(), Some(Value::string("b")));
    }

    #[test]
    fn test_write_creates_native_key() {
        let b = bridge(Vec::new(), NativeType::Integer, NativeType::Integer);
        b.put(&PropertyKey::Index(3), Value::string("30")).unwrap();
        assert_eq!(b.native().get(&HostValue::Int(3)), Some(HostValue::Int(30)));
        assert_eq!(b.translate_key("3").unwrap(), HostValue::Int(3));
        assert_eq!(b.ids(), vec![PropertyId::Int(3)]);
    }

    #[test]
    fn test_read_does_not_memoise() {
        let b = bridge(Vec::new(), NativeType::Integer, NativeType::Integer);
        assert_eq!(b.get(&"7".into()).unwrap(), None);
        assert!(b.is_key_cache_built());
        assert_eq!(b.cached_key_count(), 0);
        assert!(b.native().is_empty());
    }

    #[test]
    fn test_composite_keys_found_by_string_form() {
        let b = bridge(
            vec![(point(1, 2), HostValue::Int(12))],
            NativeType::class("Point"),
            NativeType::Integer,
        );
        assert_eq!(b.get(&"Point(1, 2)".into()).unwrap(), Some(Value::i32(12)));
        b.put(&"Point(1, 2)".into(), Value::i32(21)).unwrap();
        assert_eq!(b.native().get(&point(1, 2)), Some(HostValue::Int(21)));
        assert_eq!(b.ids(), vec![PropertyId::Name("Point(1, 2)".to_string())]);
    }

    #[test]
    fn test_unseen_composite_key_fails_coercion() {
        let b = bridge(Vec::new(), NativeType::class("Point"), NativeType::Integer);
        let err = b.put(&"Point(3, 4)".into(), Value::i32(1)).unwrap_err();
        assert!(matches!(err, BridgeError::Coercion { .. }));
        assert!(b.native().is_empty());
        assert_eq!(b.cached_key_count(), 0);
    }

    #[test]
    fn test_translation_is_stable() {
        let b = bridge(
            vec![(HostValue::Long(5), HostValue::Int(0))],
            NativeType::Long,
            NativeType::Integer,
        );
        let first = b.translate_key("5").unwrap();
        b.put(&"6".into(), Value::i32(6)).unwrap();
        b.put(&"7".into(), Value::i32(7)).unwrap();
        assert_eq!(b.translate_key("5").unwrap(), first);
        assert_eq!(first, HostValue::Long(5));
    }

    #[test]
    fn test_stale_cache_until_invalidated() {
        let b = bridge(
            vec![(HostValue::Int(1), HostValue::Int(10))],
            NativeType::Integer,
            NativeType::Integer,
        );
        assert!(b.has(&PropertyKey::Index(1)));

        // host-side insert after the cache was built
        b.native().insert(HostValue::Int(9), HostValue::Int(90));
        assert!(!b.has(&PropertyKey::Index(9)));

        b.invalidate_key_cache();
        assert!(!b.is_key_cache_built());
        assert_eq!(b.get(&PropertyKey::Index(9)).unwrap(), Some(Value::i32(90)));

        b.native().insert(HostValue::Int(11), HostValue::Int(110));
        b.rebuild_key_cache();
        assert_eq!(b.cached_key_count(), 3);
        assert!(b.has(&PropertyKey::Index(11)));
    }

    #[test]
    fn test_numeric_ids_in_native_order() {
        let b = bridge(
            vec![
                (HostValue::Long(-4), HostValue::Null),
                (HostValue::Double(2.5), HostValue::Null),
                (HostValue::str("x"), HostValue::Null),
            ],
            NativeType::Unconstrained,
            NativeType::Unconstrained,
        );
        assert_eq!(
            b.ids(),
            vec![PropertyId::Int(-4), PropertyId::Float(2.5), PropertyId::Name("x".into())]
        );
        for id in b.ids() {
            assert!(b.has(&id.to_key()), "id {} should resolve", id);
        }
    }

    #[test]
    fn test_own_property_fallback() {
        let b = bridge(
            vec![(HostValue::Int(1), HostValue::Int(10))],
            NativeType::Integer,
            NativeType::Integer,
        );
        b.own_properties().define("size", Value::string("method"));
        b.own_properties().define("1", Value::string("shadowed"));
        assert_eq!(b.get(&"size".into()).unwrap(), Some(Value::string("method")));
        // map entries win over own properties
        assert_eq!(b.get(&"1".into()).unwrap(), Some(Value::i32(10)));
        assert!(b.has(&"size".into()));
    }

    #[test]
    fn test_record_values_wrapped_by_runtime_type() {
        let b = bridge(
            vec![(HostValue::Int(0), point(1, 1))],
            NativeType::Integer,
            NativeType::Unconstrained,
        );
        let value = b.get(&PropertyKey::Index(0)).unwrap().unwrap();
        let wrapped = value.as_wrapped().unwrap();
        assert_eq!(wrapped.declared, NativeType::class("Point"));
        assert_eq!(wrapped.value, point(1, 1));
    }

    #[test]
    fn test_delete() {
        let b = bridge(
            vec![(HostValue::Int(1), HostValue::Int(10))],
            NativeType::Integer,
            NativeType::Integer,
        );
        b.own_properties().define("tag", Value::Null);
        assert!(b.delete(&PropertyKey::Index(1)).unwrap());
        assert!(!b.delete(&PropertyKey::Index(1)).unwrap());
        assert!(b.delete(&"tag".into()).unwrap());
        assert!(b.native().is_empty());
    }

    #[test]
    fn test_string_key_type_bypasses_cache() {
        let b = bridge(Vec::new(), NativeType::String, NativeType::Integer);
        b.put(&"x".into(), Value::i32(1)).unwrap();
        b.put(&PropertyKey::Index(2), Value::i32(2)).unwrap();
        assert_eq!(b.native().get(&HostValue::str("x")), Some(HostValue::Int(1)));
        assert_eq!(b.native().get(&HostValue::str("2")), Some(HostValue::Int(2)));
        assert!(!b.is_key_cache_built());
    }

    #[test]
    fn test_types_from_typed_map() {
        let typed = Typed::new(
            TypeSignature::map_of(NativeType::Long, NativeType::Double),
            IndexMap::<HostValue, HostValue>::new(),
        );
        let b = DynamicKeyMapBridge::new(share(typed), None, BridgeContext::new());
        assert_eq!(b.key_type(), &NativeType::Long);
        assert_eq!(b.value_type(), &NativeType::Double);
        b.put(&"8".into(), Value::i32(1)).unwrap();
        assert_eq!(b.native().get(&HostValue::Long(8)), Some(HostValue::Double(1.0)));
    }

    #[test]
    fn test_equality_hash_and_display() {
        let a = bridge(
            vec![(HostValue::str("a"), HostValue::Int(1)), (HostValue::str("b"), HostValue::Int(2))],
            NativeType::Unconstrained,
            NativeType::Integer,
        );
        let b = bridge(
            vec![(HostValue::str("a"), HostValue::Int(1)), (HostValue::str("b"), HostValue::Int(2))],
            NativeType::Unconstrained,
            NativeType::Integer,
        );
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{a=1, b=2}");
        assert_eq!(a.class_name(), "HostMap");
    }
}
