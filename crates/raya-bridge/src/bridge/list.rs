//! Sequence bridge: index access over a native list

use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::{debug, trace};

use crate::collection::{ListHandle, NativeList, Shared};
use crate::config::BridgeConfig;
use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::host::{HostValue, NativeType};
use crate::property::{OwnProperties, PropertyAccess, PropertyId, PropertyKey};
use crate::types::{TypeDescriptor, TypeSignature};
use crate::value::Value;

const LENGTH: &str = "length";

/// Exposes a native list to scripts.
///
/// Reads are bounds-checked exactly like the list itself. Writes past the
/// end grow the list with null placeholders up to and including the written
/// index, the way assigning past the end of a sparse array creates the
/// missing slots.
pub struct SequenceBridge<L: NativeList = Vec<HostValue>> {
    list: ListHandle<L>,
    types: TypeDescriptor,
    ctx: BridgeContext,
    own: OwnProperties,
}

impl<L: NativeList> SequenceBridge<L> {
    /// Bridge `list`, resolving the element type from `signature` or from
    /// the list's own declared signature.
    pub fn new(list: Shared<L>, signature: Option<&TypeSignature>, ctx: BridgeContext) -> Self {
        let introspected = list.read().generic_signature();
        let types = TypeDescriptor::for_list(signature, introspected, ctx.resolver());
        debug!(
            element = %types.value(),
            source = ?types.source(),
            "sequence bridge created"
        );
        Self {
            list: ListHandle::new(list),
            types,
            ctx,
            own: OwnProperties::new(),
        }
    }

    /// Resolved element type
    pub fn element_type(&self) -> &NativeType {
        self.types.value()
    }

    /// Resolved type descriptor
    pub fn types(&self) -> &TypeDescriptor {
        &self.types
    }

    /// Native list operations (no coercion)
    pub fn native(&self) -> &ListHandle<L> {
        &self.list
    }

    /// Capabilities this bridge was built with
    pub fn context(&self) -> &BridgeContext {
        &self.ctx
    }

    /// Element at `index`, exposed to scripts.
    ///
    /// A null element is returned as [`Value::Null`] without consulting the
    /// coercion capability.
    pub fn read(&self, index: usize) -> BridgeResult<Value> {
        let element = {
            let guard = self.list.read();
            let items = guard.as_vec();
            items
                .get(index)
                .cloned()
                .ok_or(BridgeError::IndexOutOfRange {
                    index,
                    len: items.len(),
                })?
        };
        if element.is_null() {
            return Ok(Value::Null);
        }
        self.ctx.to_dynamic(&element, self.types.value())
    }

    /// Coerce `value` to the element type and store it at `index`, growing
    /// the list first if `index` is past the end.
    ///
    /// The value is coerced before the list is touched, so a failed
    /// coercion leaves the list unchanged.
    pub fn write(&self, index: usize, value: &Value) -> BridgeResult<()> {
        let element = self.ctx.to_native(value, self.types.value())?;
        let config = self.ctx.config();

        let mut guard = self.list.write();
        let items = guard.as_vec_mut();
        let len = items.len();
        if index >= len {
            if !config.grow_on_write {
                return Err(BridgeError::IndexOutOfRange { index, len });
            }
            let growth = BridgeConfig::growth_for(index, len);
            if let Some(limit) = config.max_growth {
                if growth > limit {
                    return Err(BridgeError::GrowthLimit { index, len, limit });
                }
            }
            // every check happens before the host's list is modified
            let Some(new_len) = index.checked_add(1) else {
                return Err(BridgeError::IndexOutOfRange { index, len });
            };
            if items.try_reserve(growth).is_err() {
                return Err(BridgeError::IndexOutOfRange { index, len });
            }
            items.resize(new_len, HostValue::Null);
            debug!(from = len, to = new_len, "sequence grown on write");
        }
        match items.get_mut(index) {
            Some(slot) => *slot = element,
            None => return Err(BridgeError::IndexOutOfRange { index, len: items.len() }),
        }
        Ok(())
    }
}

impl<L: NativeList> PropertyAccess for SequenceBridge<L> {
    fn class_name(&self) -> &'static str {
        "HostList"
    }

    fn has(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Index(index) => (*index as usize) < self.list.len(),
            PropertyKey::Name(name) => name == LENGTH || self.own.has(name),
        }
    }

    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<Value>> {
        match key {
            PropertyKey::Index(index) => self.read(*index as usize).map(Some),
            PropertyKey::Name(name) => {
                if let Some(value) = self.own.get(name) {
                    return Ok(Some(value));
                }
                if name == LENGTH {
                    let len = self.list.len();
                    return Ok(Some(match i32::try_from(len) {
                        Ok(len) => Value::Int(len),
                        Err(_) => Value::Number(len as f64),
                    }));
                }
                trace!(name = %name, "sequence property not found");
                Ok(None)
            }
        }
    }

    fn put(&self, key: &PropertyKey, value: Value) -> BridgeResult<()> {
        match key {
            PropertyKey::Index(index) => self.write(*index as usize, &value),
            PropertyKey::Name(name) => {
                if name == LENGTH && !self.own.has(name) {
                    return Err(BridgeError::ReadOnly(LENGTH.to_string()));
                }
                self.own.define(name, value);
                Ok(())
            }
        }
    }

    /// Deleting an index leaves a hole: the slot becomes null and the length
    /// is unchanged.
    fn delete(&self, key: &PropertyKey) -> BridgeResult<bool> {
        match key {
            PropertyKey::Index(index) => {
                let mut guard = self.list.write();
                match guard.as_vec_mut().get_mut(*index as usize) {
                    Some(slot) => {
                        *slot = HostValue::Null;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            PropertyKey::Name(name) => Ok(self.own.remove(name)),
        }
    }

    fn ids(&self) -> Vec<PropertyId> {
        (0..self.list.len())
            .map(|i| PropertyId::Int(i as i64))
            .collect()
    }

    fn own_properties(&self) -> &OwnProperties {
        &self.own
    }
}

impl<L: NativeList> PartialEq for SequenceBridge<L> {
    fn eq(&self, other: &Self) -> bool {
        self.list == other.list
    }
}

impl<L: NativeList> PartialEq<Vec<HostValue>> for SequenceBridge<L> {
    fn eq(&self, other: &Vec<HostValue>) -> bool {
        self.list == *other
    }
}

impl<L: NativeList> Hash for SequenceBridge<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.list.hash(state);
    }
}

impl<L: NativeList> fmt::Display for SequenceBridge<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, element) in self.list.read().as_vec().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", element)?;
        }
        f.write_str("]")
    }
}

impl<L: NativeList> fmt::Debug for SequenceBridge<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceBridge")
            .field("element_type", self.types.value())
            .field("len", &self.list.len())
            .finish()
    }
}
