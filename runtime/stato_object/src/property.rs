//! Static properties: named, typed slots and their accessors.
//!
//! A property is created by the caller, registered with exactly one
//! [`ShapeBuilder`](crate::ShapeBuilder), and bound when that builder builds:
//! its kind, offset, and owning shape are each written exactly once. After
//! that the property can read and write the slot on any instance of its
//! owning shape or of a descendant shape.
//!
//! Every accessor first checks the requested kind against the declared kind
//! and then the instance's shape against the owning shape. Under
//! [`SafetyChecks::Relaxed`] both checks are debug assertions only.
//!
//! # Ordering
//!
//! - `get` / `set`: relaxed; no cross-thread ordering.
//! - `get_volatile` / `set_volatile`: acquire / release.
//! - `compare_and_set`, `compare_and_exchange`, `get_and_set`, `get_and_add`:
//!   linearizable read-modify-write.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use stato_layout::Kind;

use crate::error::InitSlot;
use crate::object::{ObjectRef, Referent, StaticObject};
use crate::primitive::{Integral, Primitive};
use crate::shape::Shape;
use crate::storage::WordSlot;
use crate::{AccessError, PropertyError, SafetyChecks};

#[derive(Copy, Clone)]
struct Declaration {
    kind: Kind,
    store_as_final: bool,
}

struct PropertyInner {
    id: Box<str>,
    declaration: OnceLock<Declaration>,
    offset: OnceLock<u32>,
    shape: OnceLock<Shape>,
}

/// A named slot descriptor. Clones share the same slot.
#[derive(Clone)]
pub struct StaticProperty(Arc<PropertyInner>);

impl StaticProperty {
    pub fn new(id: impl Into<Box<str>>) -> Self {
        StaticProperty(Arc::new(PropertyInner {
            id: id.into(),
            declaration: OnceLock::new(),
            offset: OnceLock::new(),
            shape: OnceLock::new(),
        }))
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Declared kind, once registered with a builder.
    pub fn kind(&self) -> Option<Kind> {
        self.0.declaration.get().map(|d| d.kind)
    }

    pub fn store_as_final(&self) -> Option<bool> {
        self.0.declaration.get().map(|d| d.store_as_final)
    }

    /// Storage offset, once built into a shape.
    pub fn offset(&self) -> Option<u32> {
        self.0.offset.get().copied()
    }

    /// Owning shape, once built.
    pub fn shape(&self) -> Option<&Shape> {
        self.0.shape.get()
    }

    pub fn is_bound(&self) -> bool {
        self.0.shape.get().is_some()
    }

    fn reinitialized(&self, what: InitSlot) -> PropertyError {
        PropertyError::AlreadyInitialized {
            id: self.0.id.to_string(),
            kind: self.kind(),
            what,
        }
    }

    pub(crate) fn init(&self, kind: Kind, store_as_final: bool) -> Result<(), PropertyError> {
        self.0
            .declaration
            .set(Declaration {
                kind,
                store_as_final,
            })
            .map_err(|_| self.reinitialized(InitSlot::Kind))
    }

    pub(crate) fn init_offset(&self, offset: u32) -> Result<(), PropertyError> {
        self.0
            .offset
            .set(offset)
            .map_err(|_| self.reinitialized(InitSlot::Offset))
    }

    pub(crate) fn init_shape(&self, shape: Shape) -> Result<(), PropertyError> {
        self.0
            .shape
            .set(shape)
            .map_err(|_| self.reinitialized(InitSlot::Shape))
    }

    /// Offset of this property on `object` after the kind and shape checks.
    fn checked_offset<B>(
        &self,
        object: &StaticObject<B>,
        requested: Kind,
    ) -> Result<u32, AccessError> {
        let inner = &*self.0;
        let (Some(declaration), Some(&offset), Some(owner)) =
            (inner.declaration.get(), inner.offset.get(), inner.shape.get())
        else {
            return Err(AccessError::Unbound {
                id: inner.id.to_string(),
            });
        };
        match owner.safety() {
            SafetyChecks::Checked => {
                if declaration.kind != requested {
                    return Err(AccessError::KindMismatch {
                        id: inner.id.to_string(),
                        declared: declaration.kind,
                        requested,
                    });
                }
                if !owner.is_ancestor_of(object.shape()) {
                    return Err(AccessError::ShapeMismatch {
                        id: inner.id.to_string(),
                    });
                }
            }
            SafetyChecks::Relaxed => {
                debug_assert_eq!(declaration.kind, requested, "property '{}'", inner.id);
                debug_assert!(
                    owner.is_ancestor_of(object.shape()),
                    "incompatible shape on property access: '{}'",
                    inner.id
                );
            }
        }
        Ok(offset)
    }

    fn word<'o, B>(
        &self,
        object: &'o StaticObject<B>,
        kind: Kind,
    ) -> Result<WordSlot<'o>, AccessError> {
        let offset = self.checked_offset(object, kind)?;
        Ok(object.storage().primitive(offset, kind)?)
    }

    fn reference<'o, B>(
        &self,
        object: &'o StaticObject<B>,
    ) -> Result<&'o ArcSwapOption<Referent>, AccessError> {
        let offset = self.checked_offset(object, Kind::Reference)?;
        Ok(object.storage().reference(offset))
    }

    // Primitive accessors

    pub fn get<T: Primitive, B>(&self, object: &StaticObject<B>) -> Result<T, AccessError> {
        let slot = self.word(object, T::KIND)?;
        Ok(T::from_bits(slot.load(Ordering::Relaxed)))
    }

    pub fn get_volatile<T: Primitive, B>(
        &self,
        object: &StaticObject<B>,
    ) -> Result<T, AccessError> {
        let slot = self.word(object, T::KIND)?;
        Ok(T::from_bits(slot.load(Ordering::Acquire)))
    }

    pub fn set<T: Primitive, B>(
        &self,
        object: &StaticObject<B>,
        value: T,
    ) -> Result<(), AccessError> {
        self.word(object, T::KIND)?.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    pub fn set_volatile<T: Primitive, B>(
        &self,
        object: &StaticObject<B>,
        value: T,
    ) -> Result<(), AccessError> {
        self.word(object, T::KIND)?.store(value.to_bits(), Ordering::Release);
        Ok(())
    }

    /// Replace the value if it is bit-equal to `expected`; returns whether it
    /// was replaced.
    pub fn compare_and_set<T: Primitive, B>(
        &self,
        object: &StaticObject<B>,
        expected: T,
        new: T,
    ) -> Result<bool, AccessError> {
        let slot = self.word(object, T::KIND)?;
        Ok(slot.compare_exchange(expected.to_bits(), new.to_bits()).is_ok())
    }

    /// Replace the value if it is bit-equal to `expected`; returns the value
    /// observed, which equals `expected` exactly when the swap happened.
    pub fn compare_and_exchange<T: Primitive, B>(
        &self,
        object: &StaticObject<B>,
        expected: T,
        new: T,
    ) -> Result<T, AccessError> {
        let slot = self.word(object, T::KIND)?;
        let witness = match slot.compare_exchange(expected.to_bits(), new.to_bits()) {
            Ok(bits) | Err(bits) => bits,
        };
        Ok(T::from_bits(witness))
    }

    pub fn get_and_set<T: Primitive, B>(
        &self,
        object: &StaticObject<B>,
        value: T,
    ) -> Result<T, AccessError> {
        let slot = self.word(object, T::KIND)?;
        let bits = value.to_bits();
        Ok(T::from_bits(slot.fetch_update(|_| bits)))
    }

    /// Add `delta` with wrapping arithmetic; returns the previous value.
    pub fn get_and_add<T: Integral, B>(
        &self,
        object: &StaticObject<B>,
        delta: T,
    ) -> Result<T, AccessError> {
        let slot = self.word(object, T::KIND)?;
        Ok(T::from_bits(
            slot.fetch_update(|old| T::wrapping_add_bits(old, delta)),
        ))
    }

    // Reference accessors

    pub fn get_object<B>(
        &self,
        object: &StaticObject<B>,
    ) -> Result<Option<ObjectRef>, AccessError> {
        Ok(self.reference(object)?.load_full())
    }

    /// Reference slots are always accessed with at least acquire/release
    /// ordering, so this is the same as [`get_object`](Self::get_object).
    pub fn get_object_volatile<B>(
        &self,
        object: &StaticObject<B>,
    ) -> Result<Option<ObjectRef>, AccessError> {
        self.get_object(object)
    }

    pub fn set_object<B>(
        &self,
        object: &StaticObject<B>,
        value: Option<ObjectRef>,
    ) -> Result<(), AccessError> {
        self.reference(object)?.store(value);
        Ok(())
    }

    pub fn set_object_volatile<B>(
        &self,
        object: &StaticObject<B>,
        value: Option<ObjectRef>,
    ) -> Result<(), AccessError> {
        self.set_object(object, value)
    }

    /// Replace the reference if it is identical to `expected`.
    pub fn compare_and_set_object<B>(
        &self,
        object: &StaticObject<B>,
        expected: Option<&ObjectRef>,
        new: Option<ObjectRef>,
    ) -> Result<bool, AccessError> {
        let witness = self.compare_and_exchange_object(object, expected, new)?;
        Ok(same_reference(witness.as_ref(), expected))
    }

    /// Replace the reference if it is identical to `expected`; returns the
    /// reference observed.
    pub fn compare_and_exchange_object<B>(
        &self,
        object: &StaticObject<B>,
        expected: Option<&ObjectRef>,
        new: Option<ObjectRef>,
    ) -> Result<Option<ObjectRef>, AccessError> {
        let slot = self.reference(object)?;
        let current = expected.cloned();
        let previous = slot.compare_and_swap(&current, new);
        Ok(arc_swap::Guard::into_inner(previous))
    }

    pub fn get_and_set_object<B>(
        &self,
        object: &StaticObject<B>,
        value: Option<ObjectRef>,
    ) -> Result<Option<ObjectRef>, AccessError> {
        Ok(self.reference(object)?.swap(value))
    }
}

fn same_reference(a: Option<&ObjectRef>, b: Option<&ObjectRef>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl fmt::Debug for StaticProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticProperty")
            .field("id", &self.0.id)
            .field("kind", &self.kind())
            .field("offset", &self.offset())
            .field("shape", &self.shape().map(Shape::id))
            .finish()
    }
}
