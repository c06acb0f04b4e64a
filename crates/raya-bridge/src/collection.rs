//! Native collections and their pass-through operation surfaces
//!
//! A bridge never owns the collection it exposes. The host hands over a
//! [`Shared`] handle and keeps its own clone; both sides see the same data.
//!
//! [`ListHandle`] and [`MapHandle`] are the "native collection operations"
//! half of every bridge: size, iteration, search, bulk and update operations
//! on native values with no coercion.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut, Range};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHasher;

use crate::error::{BridgeError, BridgeResult};
use crate::host::HostValue;
use crate::types::TypeSignature;

/// Collection reference shared between the host and a bridge
pub type Shared<C> = Arc<RwLock<C>>;

/// Put a collection behind a [`Shared`] handle
pub fn share<C>(collection: C) -> Shared<C> {
    Arc::new(RwLock::new(collection))
}

// ============================================================================
// Introspection and collection traits
// ============================================================================

/// Runtime type introspection for native collections.
pub trait Introspect {
    /// Generic signature the collection's concrete type declares, if any
    fn generic_signature(&self) -> Option<TypeSignature> {
        None
    }
}

/// Ordered, index-addressable native collection
pub trait NativeList: Introspect + Send + Sync {
    /// Borrow the elements
    fn as_vec(&self) -> &Vec<HostValue>;

    /// Mutably borrow the elements
    fn as_vec_mut(&mut self) -> &mut Vec<HostValue>;
}

/// Key/value native collection iterated in insertion order
pub trait NativeMap: Introspect + Send + Sync {
    /// Native key type
    type Key: Hash + Eq + Clone + Send + Sync;

    /// Borrow the entries
    fn as_map(&self) -> &IndexMap<Self::Key, HostValue>;

    /// Mutably borrow the entries
    fn as_map_mut(&mut self) -> &mut IndexMap<Self::Key, HostValue>;
}

impl Introspect for Vec<HostValue> {}

impl NativeList for Vec<HostValue> {
    fn as_vec(&self) -> &Vec<HostValue> {
        self
    }

    fn as_vec_mut(&mut self) -> &mut Vec<HostValue> {
        self
    }
}

impl<K> Introspect for IndexMap<K, HostValue> {}

impl<K> NativeMap for IndexMap<K, HostValue>
where
    K: Hash + Eq + Clone + Send + Sync,
{
    type Key = K;

    fn as_map(&self) -> &IndexMap<K, HostValue> {
        self
    }

    fn as_map_mut(&mut self) -> &mut IndexMap<K, HostValue> {
        self
    }
}

// ============================================================================
// Typed
// ============================================================================

/// Collection whose concrete type declares a generic signature, the way a
/// host class such as `class Scores extends List<Integer>` would.
#[derive(Debug, Clone, PartialEq)]
pub struct Typed<C> {
    signature: TypeSignature,
    inner: C,
}

impl<C> Typed<C> {
    /// Attach `signature` to `inner`
    pub fn new(signature: TypeSignature, inner: C) -> Self {
        Self { signature, inner }
    }

    /// Declared signature
    pub fn signature(&self) -> &TypeSignature {
        &self.signature
    }

    /// Unwrap the collection
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C> Deref for Typed<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner
    }
}

impl<C> DerefMut for Typed<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.inner
    }
}

impl<C> Introspect for Typed<C> {
    fn generic_signature(&self) -> Option<TypeSignature> {
        Some(self.signature.clone())
    }
}

impl<C: NativeList> NativeList for Typed<C> {
    fn as_vec(&self) -> &Vec<HostValue> {
        self.inner.as_vec()
    }

    fn as_vec_mut(&mut self) -> &mut Vec<HostValue> {
        self.inner.as_vec_mut()
    }
}

impl<C: NativeMap> NativeMap for Typed<C> {
    type Key = C::Key;

    fn as_map(&self) -> &IndexMap<C::Key, HostValue> {
        self.inner.as_map()
    }

    fn as_map_mut(&mut self) -> &mut IndexMap<C::Key, HostValue> {
        self.inner.as_map_mut()
    }
}

// ============================================================================
// ListHandle
// ============================================================================

/// Native operations on a shared list.
///
/// Closures passed to `sort_by`, `retain`, `replace_all` and `for_each` run
/// while the list is locked and must not call back into the same list.
pub struct ListHandle<L> {
    inner: Shared<L>,
}

impl<L: NativeList> ListHandle<L> {
    /// Wrap a shared list
    pub fn new(inner: Shared<L>) -> Self {
        Self { inner }
    }

    /// The shared reference this handle operates on
    pub fn shared(&self) -> &Shared<L> {
        &self.inner
    }

    /// Lock the list for reading
    pub fn read(&self) -> RwLockReadGuard<'_, L> {
        self.inner.read()
    }

    /// Lock the list for writing
    pub fn write(&self) -> RwLockWriteGuard<'_, L> {
        self.inner.write()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.read().as_vec().len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.read().as_vec().is_empty()
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<HostValue> {
        self.read().as_vec().get(index).cloned()
    }

    /// Replace the element at `index`, returning the previous one
    pub fn set(&self, index: usize, element: HostValue) -> BridgeResult<HostValue> {
        let mut guard = self.write();
        let items = guard.as_vec_mut();
        let len = items.len();
        match items.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, element)),
            None => Err(BridgeError::IndexOutOfRange { index, len }),
        }
    }

    /// Append an element
    pub fn push(&self, element: HostValue) {
        self.write().as_vec_mut().push(element);
    }

    /// Insert an element at `index`, shifting later elements
    pub fn insert(&self, index: usize, element: HostValue) -> BridgeResult<()> {
        let mut guard = self.write();
        let items = guard.as_vec_mut();
        if index > items.len() {
            return Err(BridgeError::IndexOutOfRange {
                index,
                len: items.len(),
            });
        }
        items.insert(index, element);
        Ok(())
    }

    /// Remove and return the element at `index`
    pub fn remove(&self, index: usize) -> BridgeResult<HostValue> {
        let mut guard = self.write();
        let items = guard.as_vec_mut();
        if index >= items.len() {
            return Err(BridgeError::IndexOutOfRange {
                index,
                len: items.len(),
            });
        }
        Ok(items.remove(index))
    }

    /// Remove the first element equal to `element`
    pub fn remove_item(&self, element: &HostValue) -> bool {
        let mut guard = self.write();
        let items = guard.as_vec_mut();
        match items.iter().position(|e| e == element) {
            Some(pos) => {
                items.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Check if any element equals `element`
    pub fn contains(&self, element: &HostValue) -> bool {
        self.read().as_vec().contains(element)
    }

    /// Check if every element of `elements` is present
    pub fn contains_all(&self, elements: &[HostValue]) -> bool {
        let guard = self.read();
        let items = guard.as_vec();
        elements.iter().all(|e| items.contains(e))
    }

    /// First index of `element`
    pub fn index_of(&self, element: &HostValue) -> Option<usize> {
        self.read().as_vec().iter().position(|e| e == element)
    }

    /// Last index of `element`
    pub fn last_index_of(&self, element: &HostValue) -> Option<usize> {
        self.read().as_vec().iter().rposition(|e| e == element)
    }

    /// Append all `elements`
    pub fn extend<I: IntoIterator<Item = HostValue>>(&self, elements: I) {
        self.write().as_vec_mut().extend(elements);
    }

    /// Insert all `elements` starting at `index`
    pub fn insert_all(&self, index: usize, elements: Vec<HostValue>) -> BridgeResult<()> {
        let mut guard = self.write();
        let items = guard.as_vec_mut();
        if index > items.len() {
            return Err(BridgeError::IndexOutOfRange {
                index,
                len: items.len(),
            });
        }
        items.splice(index..index, elements);
        Ok(())
    }

    /// Remove every element contained in `elements`; true if anything changed
    pub fn remove_all(&self, elements: &[HostValue]) -> bool {
        self.retain(|e| !elements.contains(e))
    }

    /// Keep only elements contained in `elements`; true if anything changed
    pub fn retain_all(&self, elements: &[HostValue]) -> bool {
        self.retain(|e| elements.contains(e))
    }

    /// Keep elements matching `keep`; true if anything was removed
    pub fn retain<F: FnMut(&HostValue) -> bool>(&self, keep: F) -> bool {
        let mut guard = self.write();
        let items = guard.as_vec_mut();
        let before = items.len();
        items.retain(keep);
        items.len() != before
    }

    /// Replace every element with `f(element)`
    pub fn replace_all<F: FnMut(&HostValue) -> HostValue>(&self, mut f: F) {
        let mut guard = self.write();
        for slot in guard.as_vec_mut().iter_mut() {
            *slot = f(slot);
        }
    }

    /// Stable sort with a comparator
    pub fn sort_by<F: FnMut(&HostValue, &HostValue) -> Ordering>(&self, compare: F) {
        self.write().as_vec_mut().sort_by(compare);
    }

    /// Visit every element in order
    pub fn for_each<F: FnMut(&HostValue)>(&self, f: F) {
        self.read().as_vec().iter().for_each(f);
    }

    /// Remove every element
    pub fn clear(&self) {
        self.write().as_vec_mut().clear();
    }

    /// Copy of the elements in `range`
    pub fn sub_list(&self, range: Range<usize>) -> BridgeResult<Vec<HostValue>> {
        let guard = self.read();
        let items = guard.as_vec();
        if range.start > range.end || range.end > items.len() {
            return Err(BridgeError::IndexOutOfRange {
                index: range.end,
                len: items.len(),
            });
        }
        Ok(items[range].to_vec())
    }

    /// Copy of every element
    pub fn to_vec(&self) -> Vec<HostValue> {
        self.read().as_vec().clone()
    }
}

impl<L> Clone for ListHandle<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: NativeList> PartialEq for ListHandle<L> {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        self.read().as_vec() == other.read().as_vec()
    }
}

impl<L: NativeList> PartialEq<Vec<HostValue>> for ListHandle<L> {
    fn eq(&self, other: &Vec<HostValue>) -> bool {
        self.read().as_vec() == other
    }
}

impl<L: NativeList> Hash for ListHandle<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.read().as_vec().hash(state);
    }
}

// ============================================================================
// MapHandle
// ============================================================================

/// Native operations on a shared map.
///
/// A stored `HostValue::Null` counts as absent for the `compute*`, `merge`
/// and `put_if_absent` family. Closures run while the map is locked and must
/// not call back into the same map.
pub struct MapHandle<M> {
    inner: Shared<M>,
}

impl<M: NativeMap> MapHandle<M> {
    /// Wrap a shared map
    pub fn new(inner: Shared<M>) -> Self {
        Self { inner }
    }

    /// The shared reference this handle operates on
    pub fn shared(&self) -> &Shared<M> {
        &self.inner
    }

    /// Lock the map for reading
    pub fn read(&self) -> RwLockReadGuard<'_, M> {
        self.inner.read()
    }

    /// Lock the map for writing
    pub fn write(&self) -> RwLockWriteGuard<'_, M> {
        self.inner.write()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.read().as_map().len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.read().as_map().is_empty()
    }

    /// Check if `key` has an entry
    pub fn contains_key(&self, key: &M::Key) -> bool {
        self.read().as_map().contains_key(key)
    }

    /// Check if any entry holds `value`
    pub fn contains_value(&self, value: &HostValue) -> bool {
        self.read().as_map().values().any(|v| v == value)
    }

    /// Value stored under `key`
    pub fn get(&self, key: &M::Key) -> Option<HostValue> {
        self.read().as_map().get(key).cloned()
    }

    /// Value stored under `key`, or `default`
    pub fn get_or_default(&self, key: &M::Key, default: HostValue) -> HostValue {
        self.get(key).unwrap_or(default)
    }

    /// Store `value` under `key`, returning the previous value
    pub fn insert(&self, key: M::Key, value: HostValue) -> Option<HostValue> {
        self.write().as_map_mut().insert(key, value)
    }

    /// Remove the entry for `key`, preserving the order of the rest
    pub fn remove(&self, key: &M::Key) -> Option<HostValue> {
        self.write().as_map_mut().shift_remove(key)
    }

    /// Remove the entry for `key` only if it currently holds `value`
    pub fn remove_entry_if(&self, key: &M::Key, value: &HostValue) -> bool {
        let mut guard = self.write();
        let map = guard.as_map_mut();
        if map.get(key) == Some(value) {
            map.shift_remove(key);
            true
        } else {
            false
        }
    }

    /// Copy every entry of `entries` into the map
    pub fn put_all<I: IntoIterator<Item = (M::Key, HostValue)>>(&self, entries: I) {
        self.write().as_map_mut().extend(entries);
    }

    /// Store `value` unless a non-null value is present; returns the present
    /// value
    pub fn put_if_absent(&self, key: M::Key, value: HostValue) -> Option<HostValue> {
        let mut guard = self.write();
        let map = guard.as_map_mut();
        match map.get(&key) {
            Some(current) if !current.is_null() => Some(current.clone()),
            _ => map.insert(key, value),
        }
    }

    /// Replace the value of an existing entry
    pub fn replace(&self, key: &M::Key, value: HostValue) -> Option<HostValue> {
        let mut guard = self.write();
        guard
            .as_map_mut()
            .get_mut(key)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// Replace the value of an existing entry only if it holds `old`
    pub fn replace_if(&self, key: &M::Key, old: &HostValue, new: HostValue) -> bool {
        let mut guard = self.write();
        match guard.as_map_mut().get_mut(key) {
            Some(slot) if slot == old => {
                *slot = new;
                true
            }
            _ => false,
        }
    }

    /// Replace every value with `f(key, value)`
    pub fn replace_all<F: FnMut(&M::Key, &HostValue) -> HostValue>(&self, mut f: F) {
        let mut guard = self.write();
        for (key, slot) in guard.as_map_mut().iter_mut() {
            *slot = f(key, slot);
        }
    }

    /// Compute a value for an absent key; `None` stores nothing
    pub fn compute_if_absent<F>(&self, key: M::Key, f: F) -> Option<HostValue>
    where
        F: FnOnce(&M::Key) -> Option<HostValue>,
    {
        let mut guard = self.write();
        let map = guard.as_map_mut();
        if let Some(current) = map.get(&key).filter(|v| !v.is_null()) {
            return Some(current.clone());
        }
        let computed = f(&key)?;
        map.insert(key, computed.clone());
        Some(computed)
    }

    /// Recompute the value of a present key; `None` removes the entry
    pub fn compute_if_present<F>(&self, key: &M::Key, f: F) -> Option<HostValue>
    where
        F: FnOnce(&M::Key, &HostValue) -> Option<HostValue>,
    {
        let mut guard = self.write();
        let map = guard.as_map_mut();
        let current = map.get(key).filter(|v| !v.is_null())?.clone();
        match f(key, &current) {
            Some(next) => {
                map.insert(key.clone(), next.clone());
                Some(next)
            }
            None => {
                map.shift_remove(key);
                None
            }
        }
    }

    /// Compute a new value from the current one (if any); `None` removes
    pub fn compute<F>(&self, key: M::Key, f: F) -> Option<HostValue>
    where
        F: FnOnce(&M::Key, Option<&HostValue>) -> Option<HostValue>,
    {
        let mut guard = self.write();
        let map = guard.as_map_mut();
        let current = map.get(&key).filter(|v| !v.is_null()).cloned();
        match f(&key, current.as_ref()) {
            Some(next) => {
                map.insert(key, next.clone());
                Some(next)
            }
            None => {
                map.shift_remove(&key);
                None
            }
        }
    }

    /// Store `value` if absent, otherwise combine with `f(old, value)`;
    /// `None` removes the entry
    pub fn merge<F>(&self, key: M::Key, value: HostValue, f: F) -> Option<HostValue>
    where
        F: FnOnce(&HostValue, &HostValue) -> Option<HostValue>,
    {
        let mut guard = self.write();
        let map = guard.as_map_mut();
        let next = match map.get(&key).filter(|v| !v.is_null()) {
            Some(old) => f(old, &value),
            None => Some(value),
        };
        match next {
            Some(next) => {
                map.insert(key, next.clone());
                Some(next)
            }
            None => {
                map.shift_remove(&key);
                None
            }
        }
    }

    /// Visit every entry in iteration order
    pub fn for_each<F: FnMut(&M::Key, &HostValue)>(&self, mut f: F) {
        for (key, value) in self.read().as_map() {
            f(key, value);
        }
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.write().as_map_mut().clear();
    }

    /// Keys in iteration order
    pub fn keys(&self) -> Vec<M::Key> {
        self.read().as_map().keys().cloned().collect()
    }

    /// Values in iteration order
    pub fn values(&self) -> Vec<HostValue> {
        self.read().as_map().values().cloned().collect()
    }

    /// Entries in iteration order
    pub fn entries(&self) -> Vec<(M::Key, HostValue)> {
        self.read()
            .as_map()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<M> Clone for MapHandle<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: NativeMap> PartialEq for MapHandle<M> {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        self.read().as_map() == other.read().as_map()
    }
}

impl<M: NativeMap> PartialEq<IndexMap<M::Key, HostValue>> for MapHandle<M> {
    fn eq(&self, other: &IndexMap<M::Key, HostValue>) -> bool {
        self.read().as_map() == other
    }
}

impl<M: NativeMap> Hash for MapHandle<M> {
    /// Order-independent: the sum of per-entry hashes, so maps that compare
    /// equal hash equal regardless of insertion order.
    fn hash<H: Hasher>(&self, state: &mut H) {
        let sum = self
            .read()
            .as_map()
            .iter()
            .map(|(k, v)| {
                let mut h = FxHasher::default();
                k.hash(&mut h);
                v.hash(&mut h);
                h.finish()
            })
            .fold(0u64, u64::wrapping_add);
        state.write_u64(sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NativeType;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(t: &T) -> u64 {
        let mut h = DefaultHasher::new();
        t.hash(&mut h);
        h.finish()
    }

    fn ints(values: &[i32]) -> Vec<HostValue> {
        values.iter().map(|&i| HostValue::Int(i)).collect()
    }

    #[test]
    fn test_list_pass_through() {
        let list = ListHandle::new(share(ints(&[3, 1, 2])));
        list.push(HostValue::Int(1));
        assert_eq!(list.len(), 4);
        assert_eq!(list.index_of(&HostValue::Int(1)), Some(1));
        assert_eq!(list.last_index_of(&HostValue::Int(1)), Some(3));

        list.sort_by(|a, b| a.as_i32().cmp(&b.as_i32()));
        assert_eq!(list.to_vec(), ints(&[1, 1, 2, 3]));

        assert_eq!(list.sub_list(1..3).unwrap(), ints(&[1, 2]));
        assert!(list.sub_list(2..9).is_err());

        assert!(list.remove_item(&HostValue::Int(1)));
        assert_eq!(list.remove(0).unwrap(), HostValue::Int(1));
        assert_eq!(
            list.remove(5),
            Err(BridgeError::IndexOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_list_bulk_operations() {
        let list = ListHandle::new(share(ints(&[1, 2, 3, 4])));
        assert!(list.remove_all(&ints(&[2, 4])));
        assert_eq!(list.to_vec(), ints(&[1, 3]));
        list.insert_all(1, ints(&[7, 8])).unwrap();
        assert_eq!(list.to_vec(), ints(&[1, 7, 8, 3]));
        assert!(list.contains_all(&ints(&[7, 3])));
        assert!(!list.retain_all(&ints(&[1, 7, 8, 3])));
        list.replace_all(|v| HostValue::Int(v.as_i32().unwrap_or(0) * 10));
        assert_eq!(list.to_vec(), ints(&[10, 70, 80, 30]));
    }

    #[test]
    fn test_list_equality_and_hash() {
        let a = ListHandle::new(share(ints(&[1, 2])));
        let b = ListHandle::new(share(ints(&[1, 2])));
        assert!(a == b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert!(a == ints(&[1, 2]));
        b.push(HostValue::Null);
        assert!(a != b);
    }

    #[test]
    fn test_map_update_operations() {
        let map: MapHandle<IndexMap<String, HostValue>> = MapHandle::new(share(IndexMap::new()));
        assert_eq!(map.put_if_absent("a".into(), HostValue::Int(1)), None);
        assert_eq!(map.put_if_absent("a".into(), HostValue::Int(2)), Some(HostValue::Int(1)));

        let merged = map.merge("a".into(), HostValue::Int(5), |old, new| {
            Some(HostValue::Int(old.as_i32()? + new.as_i32()?))
        });
        assert_eq!(merged, Some(HostValue::Int(6)));

        assert_eq!(
            map.compute_if_absent("b".into(), |_| Some(HostValue::Int(9))),
            Some(HostValue::Int(9))
        );
        assert_eq!(map.compute_if_present(&"b".to_string(), |_, _| None), None);
        assert!(!map.contains_key(&"b".to_string()));

        assert!(map.replace_if(&"a".to_string(), &HostValue::Int(6), HostValue::Int(0)));
        assert!(!map.replace_if(&"a".to_string(), &HostValue::Int(6), HostValue::Int(1)));
        assert_eq!(map.replace(&"zz".to_string(), HostValue::Int(1)), None);

        assert_eq!(map.compute("c".into(), |_, cur| cur.cloned().or(Some(HostValue::Int(3)))), Some(HostValue::Int(3)));
        assert_eq!(map.keys(), vec!["a".to_string(), "c".to_string()]);
        assert!(map.remove_entry_if(&"c".to_string(), &HostValue::Int(3)));
        assert!(map.contains_value(&HostValue::Int(0)));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let a: MapHandle<IndexMap<String, HostValue>> = MapHandle::new(share(IndexMap::new()));
        let b: MapHandle<IndexMap<String, HostValue>> = MapHandle::new(share(IndexMap::new()));
        a.insert("x".into(), HostValue::Int(1));
        a.insert("y".into(), HostValue::Int(2));
        b.insert("y".into(), HostValue::Int(2));
        b.insert("x".into(), HostValue::Int(1));
        assert!(a == b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_typed_introspection() {
        let plain: Vec<HostValue> = Vec::new();
        assert!(plain.generic_signature().is_none());

        let typed = Typed::new(TypeSignature::list_of(NativeType::Integer), plain);
        assert_eq!(
            typed.generic_signature(),
            Some(TypeSignature::list_of(NativeType::Integer))
        );
        assert!(typed.as_vec().is_empty());
    }
}
