//! Raya Bridge - typed host collections as dynamic script objects
//!
//! Host code keeps its lists and maps strongly typed; scripts see them as
//! ordinary objects. A bridge sits between the two: it resolves the
//! collection's element/key/value types once, translates script property
//! names to native keys, and coerces every value crossing the boundary
//! through capabilities supplied in a [`BridgeContext`].
//!
//! # Example
//!
//! ```ignore
//! use raya_bridge::{share, BridgeContext, NativeType, PropertyAccess, SequenceBridge,
//!     TypeSignature, Value};
//!
//! let list = share(Vec::new());
//! let sig = TypeSignature::list_of(NativeType::Integer);
//! let bridge = SequenceBridge::new(list.clone(), Some(&sig), BridgeContext::new());
//!
//! bridge.write(2, &Value::string("5"))?;
//! assert_eq!(bridge.read(2)?, Value::i32(5));
//! assert_eq!(list.read().len(), 3);
//! ```

#![warn(missing_docs)]

pub mod bridge;
pub mod collection;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod host;
pub mod property;
pub mod types;
pub mod value;

pub use bridge::{DynamicKeyMapBridge, KeyTranslationCache, SequenceBridge, StringKeyMapBridge};
pub use collection::{share, Introspect, ListHandle, MapHandle, NativeList, NativeMap, Shared, Typed};
pub use config::BridgeConfig;
pub use context::BridgeContext;
pub use convert::{CoerceToDynamic, CoerceToNative, ScopeId, StandardCoercion};
pub use error::{BridgeError, BridgeResult};
pub use host::{HostObject, HostRecord, HostValue, NativeType};
pub use property::{OwnProperties, PropertyAccess, PropertyId, PropertyKey};
pub use types::{RawTypeResolver, TypeDescriptor, TypeResolver, TypeSignature, TypeSource};
pub use value::{Value, Wrapped};
