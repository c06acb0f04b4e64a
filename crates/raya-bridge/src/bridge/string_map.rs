//! String-key map bridge
//!
//! Lookups go through two tiers: properties attached to the bridge first,
//! then the wrapped map. Index access uses the decimal form of the index.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::collection::{MapHandle, NativeMap, Shared};
use crate::context::BridgeContext;
use crate::error::BridgeResult;
use crate::host::{HostValue, NativeType};
use crate::property::{OwnProperties, PropertyAccess, PropertyId, PropertyKey};
use crate::types::{TypeDescriptor, TypeSignature};
use crate::value::Value;

/// Exposes a native map keyed by strings to scripts.
pub struct StringKeyMapBridge<M = IndexMap<String, HostValue>>
where
    M: NativeMap<Key = String>,
{
    map: MapHandle<M>,
    types: TypeDescriptor,
    ctx: BridgeContext,
    own: OwnProperties,
}

impl<M: NativeMap<Key = String>> StringKeyMapBridge<M> {
    /// Bridge `map`; the value type is argument 1 of `signature` or of the
    /// map's own declared signature.
    pub fn new(map: Shared<M>, signature: Option<&TypeSignature>, ctx: BridgeContext) -> Self {
        let introspected = map.read().generic_signature();
        let types = TypeDescriptor::for_map(signature, introspected, ctx.resolver());
        debug!(
            value = %types.value(),
            source = ?types.source(),
            "string-key map bridge created"
        );
        Self {
            map: MapHandle::new(map),
            types,
            ctx,
            own: OwnProperties::new(),
        }
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

    /// Read `name`.
    ///
    /// A non-null own property wins. Otherwise the map entry is returned,
    /// wrapped under the declared value type (a null entry reads as
    /// [`Value::Null`] unwrapped). `None` when neither tier has a usable
    /// value.
    pub fn read(&self, name: &str) -> BridgeResult<Option<Value>> {
        if let Some(value) = self.own.get(name).filter(|v| !v.is_null()) {
            return Ok(Some(value));
        }
        match self.map.get(&name.to_string()) {
            Some(HostValue::Null) => Ok(Some(Value::Null)),
            Some(value) => self.ctx.to_dynamic(&value, self.types.value()).map(Some),
            None => {
                trace!(name = %name, "string map entry not found");
                Ok(None)
            }
        }
    }

    /// Write `name`.
    ///
    /// An existing own property takes the write unchanged. Otherwise
    /// `undefined` removes the entry (unless disabled in the config) and
    /// anything else is coerced to the value type and stored.
    pub fn write(&self, name: &str, value: Value) -> BridgeResult<()> {
        if self.own.put(name, value.clone()) {
            return Ok(());
        }
        if value.is_undefined() && self.ctx.config().undefined_deletes {
            if self.map.remove(&name.to_string()).is_some() {
                debug!(name = %name, "entry deleted by undefined assignment");
            }
            return Ok(());
        }
        let value = self.ctx.to_native(&value, self.types.value())?;
        self.map.insert(name.to_string(), value);
        Ok(())
    }
}

impl<M: NativeMap<Key = String>> PropertyAccess for StringKeyMapBridge<M> {
    fn class_name(&self) -> &'static str {
        "HostStringMap"
    }

    fn has(&self, key: &PropertyKey) -> bool {
        let name = key.to_script_string();
        self.own.has(&name) || self.map.contains_key(&name)
    }

    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<Value>> {
        self.read(&key.to_script_string())
    }

    fn put(&self, key: &PropertyKey, value: Value) -> BridgeResult<()> {
        self.write(&key.to_script_string(), value)
    }

    fn delete(&self, key: &PropertyKey) -> BridgeResult<bool> {
        let name = key.to_script_string();
        if self.map.remove(&name).is_some() {
            return Ok(true);
        }
        Ok(self.own.remove(&name))
    }

    fn ids(&self) -> Vec<PropertyId> {
        self.map
            .read()
            .as_map()
            .keys()
            .map(|key| PropertyId::Name(key.clone()))
            .collect()
    }

    fn own_properties(&self) -> &OwnProperties {
        &self.own
    }
}

impl<M: NativeMap<Key = String>> PartialEq for StringKeyMapBridge<M> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<M: NativeMap<Key = String>> PartialEq<IndexMap<String, HostValue>> for StringKeyMapBridge<M> {
    fn eq(&self, other: &IndexMap<String, HostValue>) -> bool {
        self.map == *other
    }
}

impl<M: NativeMap<Key = String>> Hash for StringKeyMapBridge<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.map.hash(state);
    }
}

impl<M: NativeMap<Key = String>> fmt::Display for StringKeyMapBridge<M> {
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

impl<M: NativeMap<Key = String>> fmt::Debug for StringKeyMapBridge<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringKeyMapBridge")
            .field("value_type", self.types.value())
            .field("len", &self.map.len())
            .field("own", &self.own.len())
            .finish()
    }
}
