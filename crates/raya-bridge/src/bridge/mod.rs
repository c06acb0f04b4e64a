//! The three bridge variants
//!
//! Each bridge wraps one shared native collection and exposes two composed
//! surfaces: [`PropertyAccess`](crate::property::PropertyAccess) for the
//! hosting object model, and `native()` for callers that want the collection
//! operations without coercion.

mod dynamic_map;
mod key_cache;
mod list;
mod string_map;

pub use dynamic_map::DynamicKeyMapBridge;
pub use key_cache::KeyTranslationCache;
pub use list::SequenceBridge;
pub use string_map::StringKeyMapBridge;
