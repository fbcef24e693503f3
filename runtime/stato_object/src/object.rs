//! Instances and the values their reference slots hold.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::shape::Shape;
use crate::storage::Storage;

/// Type-erased shared value stored in a reference slot.
pub struct Referent(Box<dyn Any + Send + Sync>);

/// Handle to a [`Referent`]; reference properties compare these by identity.
pub type ObjectRef = Arc<Referent>;

impl Referent {
    pub fn new<T: Any + Send + Sync>(value: T) -> ObjectRef {
        Arc::new(Referent(Box::new(value)))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for Referent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Referent(..)")
    }
}

/// One allocated instance of a shape.
///
/// Carries its base value `B` (produced by the factory constructor), the
/// backing storage for every property in its shape's chain, and a pointer to
/// the exact shape it was allocated from, checked on every property access.
pub struct StaticObject<B = ()> {
    shape: Shape,
    base: B,
    storage: Storage,
}

impl<B> StaticObject<B> {
    pub(crate) fn new(shape: Shape, base: B) -> Self {
        let storage = shape.storage_type().allocate();
        StaticObject {
            shape,
            base,
            storage,
        }
    }

    /// Shape this instance was allocated from.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    /// Whether properties of `shape` may be used on this instance.
    pub fn is_instance_of(&self, shape: &Shape) -> bool {
        shape.is_ancestor_of(&self.shape)
    }

    pub(crate) fn storage(&self) -> &Storage {
        &self.storage
    }
}

impl<B: fmt::Debug> fmt::Debug for StaticObject<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticObject")
            .field("shape", &self.shape.id())
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}
