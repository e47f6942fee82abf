//! Shared handles for composite nodes
//!
//! Composites live behind `Arc` so a graph can share sub-graphs and contain cycles.
//! Locks are held only for the duration of a single slot read or write; callers clone
//! values out and never hold a guard across a call back into the engine.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Value;
use crate::registry::{TypeDescriptor, TypeName};

/// Reference identity of a composite node, valid while the node is alive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    fn of<T: ?Sized>(arc: &Arc<T>) -> Self {
        Self(Arc::as_ptr(arc).cast::<()>() as usize)
    }
}

struct ObjectCell {
    descriptor: Arc<TypeDescriptor>,
    slots:      RwLock<Vec<Value>>,
}

/// Handle to a composite instance: a type descriptor plus one slot per field
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectCell>);

impl ObjectRef {
    /// Wrap `slots` laid out in the descriptor's field order
    ///
    /// Missing trailing slots are filled with null and extra slots are dropped, so the
    /// slot vector always matches the descriptor.
    pub fn new(descriptor: Arc<TypeDescriptor>, mut slots: Vec<Value>) -> Self {
        slots.resize_with(descriptor.fields().len(), Value::default);
        Self(Arc::new(ObjectCell {
            descriptor,
            slots: RwLock::new(slots),
        }))
    }

    /// Reference identity
    pub fn id(&self) -> ObjectId {
        ObjectId::of(&self.0)
    }

    /// Same underlying node
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Descriptor the instance was built from
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.0.descriptor
    }

    /// Registered type name
    pub fn type_name(&self) -> &TypeName {
        self.0.descriptor.name()
    }

    /// Clone of the value in slot `index`
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.slots.read().get(index).cloned()
    }

    /// Clone of a field's value, looked up case-insensitively
    pub fn get_by_name(&self, name: &str) -> Option<Value> {
        let (index, _) = self.0.descriptor.field(name)?;
        self.get(index)
    }

    /// Replace the value in slot `index`; false when the slot does not exist
    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut slots = self.0.slots.write();
        slots.get_mut(index).is_some_and(|slot| {
            *slot = value;
            true
        })
    }

    /// Replace a field's value by name
    pub fn set_by_name(&self, name: &str, value: Value) -> bool {
        self.0
            .descriptor
            .field(name)
            .is_some_and(|(index, _)| self.set(index, value))
    }

    /// Clone of every slot in field order
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.slots.read().clone()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Slots are not printed: graphs may be cyclic
        f.debug_struct("ObjectRef")
            .field("type_name", self.type_name())
            .field("id", &self.id())
            .finish()
    }
}

/// Growable ordered collection
#[derive(Clone, Default)]
pub struct ListRef(Arc<RwLock<Vec<Value>>>);

impl ListRef {
    /// Wrap `elements`
    pub fn new(elements: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(elements)))
    }

    /// Reference identity
    pub fn id(&self) -> ObjectId {
        ObjectId::of(&self.0)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// No elements
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Clone of element `index`
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Replace element `index`; false when out of bounds
    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut elements = self.0.write();
        elements.get_mut(index).is_some_and(|slot| {
            *slot = value;
            true
        })
    }

    /// Append an element
    pub fn push(&self, value: Value) {
        self.0.write().push(value);
    }

    /// Grow to at least `len` elements, filling new positions with `fill`
    pub fn grow_to(&self, len: usize, mut fill: impl FnMut() -> Value) {
        let missing = len.saturating_sub(self.len());
        if missing == 0 {
            return;
        }
        // Build outside the lock; `fill` may construct nested instances
        let extra: Vec<Value> = (0..missing).map(|_| fill()).collect();
        let mut elements = self.0.write();
        if elements.len() < len {
            let needed = len - elements.len();
            elements.extend(extra.into_iter().take(needed));
        }
    }

    /// Clone of every element
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.read().clone()
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListRef")
            .field("len", &self.len())
            .field("id", &self.id())
            .finish()
    }
}

/// Fixed-size ordered collection
///
/// The length is fixed once built; [`ArrayRef::grow_to`] swaps in a larger buffer,
/// which is how indexed writes past the end are honored.
#[derive(Clone)]
pub struct ArrayRef(Arc<RwLock<Box<[Value]>>>);

impl Default for ArrayRef {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ArrayRef {
    /// Wrap `elements`
    pub fn new(elements: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(elements.into_boxed_slice())))
    }

    /// Reference identity
    pub fn id(&self) -> ObjectId {
        ObjectId::of(&self.0)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// No elements
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Clone of element `index`
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Replace element `index`; false when out of bounds
    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut elements = self.0.write();
        elements.get_mut(index).is_some_and(|slot| {
            *slot = value;
            true
        })
    }

    /// Reallocate to at least `len` elements, filling new positions with `fill`
    pub fn grow_to(&self, len: usize, mut fill: impl FnMut() -> Value) {
        let missing = len.saturating_sub(self.len());
        if missing == 0 {
            return;
        }
        let extra: Vec<Value> = (0..missing).map(|_| fill()).collect();
        let mut elements = self.0.write();
        if elements.len() < len {
            let needed = len - elements.len();
            let mut grown = std::mem::take(&mut *elements).into_vec();
            grown.extend(extra.into_iter().take(needed));
            *elements = grown.into_boxed_slice();
        }
    }

    /// Clone of every element
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.read().to_vec()
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayRef")
            .field("len", &self.len())
            .field("id", &self.id())
            .finish()
    }
}
