//! Shapes: immutable layouts positioned in a single-inheritance hierarchy.
//!
//! A [`Shape`] is produced once by a [`ShapeBuilder`](crate::ShapeBuilder)
//! and never changes afterwards. It records its ancestor chain (root first,
//! itself last), which makes the property compatibility check a single
//! indexed comparison: a property owned by a shape at depth `d` may be used
//! on an instance whose shape has that same shape at index `d` of its chain.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;
use stato_layout::{Kind, Layout, LayoutConflict};

use crate::factory::Factory;
use crate::model::ModelId;
use crate::storage::StorageType;
use crate::{SafetyChecks, StorageStrategy};

/// Process-unique shape identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u32);

static NEXT_SHAPE_ID: AtomicU32 = AtomicU32::new(0);

impl ShapeId {
    fn next() -> Self {
        ShapeId(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A property as recorded by the shape that owns it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyInfo {
    pub id: Box<str>,
    pub kind: Kind,
    /// Byte offset or reference index (array storage), or cell index (field
    /// storage).
    pub offset: u32,
    pub store_as_final: bool,
}

struct ShapeCore {
    id: ShapeId,
    /// Root first, this shape last.
    ancestors: SmallVec<[ShapeId; 4]>,
    parent: Option<Shape>,
    layout: Layout,
    storage_type: StorageType,
    model: ModelId,
    safety: SafetyChecks,
    properties: Vec<PropertyInfo>,
}

/// Everything the builder hands over to create a shape.
pub(crate) struct ShapeParts {
    pub(crate) parent: Option<Shape>,
    pub(crate) layout: Layout,
    pub(crate) storage_type: StorageType,
    pub(crate) model: ModelId,
    pub(crate) safety: SafetyChecks,
    pub(crate) properties: Vec<PropertyInfo>,
}

/// Immutable, cheaply clonable shape handle.
#[derive(Clone)]
pub struct Shape(Arc<ShapeCore>);

impl Shape {
    pub(crate) fn new(parts: ShapeParts) -> Self {
        let id = ShapeId::next();
        let mut ancestors = parts
            .parent
            .as_ref()
            .map(|parent| parent.0.ancestors.clone())
            .unwrap_or_default();
        ancestors.push(id);
        Shape(Arc::new(ShapeCore {
            id,
            ancestors,
            parent: parts.parent,
            layout: parts.layout,
            storage_type: parts.storage_type,
            model: parts.model,
            safety: parts.safety,
            properties: parts.properties,
        }))
    }

    #[inline]
    pub fn id(&self) -> ShapeId {
        self.0.id
    }

    pub fn parent(&self) -> Option<&Shape> {
        self.0.parent.as_ref()
    }

    /// Ancestor chain, root first and ending with this shape.
    pub fn ancestors(&self) -> &[ShapeId] {
        &self.0.ancestors
    }

    pub fn layout(&self) -> &Layout {
        &self.0.layout
    }

    pub fn storage_type(&self) -> &StorageType {
        &self.0.storage_type
    }

    pub fn strategy(&self) -> StorageStrategy {
        self.0.storage_type.strategy()
    }

    /// Properties declared by this shape, in registration order.
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.0.properties
    }

    /// Whether `other` is this shape or one of its descendants.
    #[inline]
    pub fn is_ancestor_of(&self, other: &Shape) -> bool {
        let depth = self.0.ancestors.len() - 1;
        other.0.ancestors.get(depth) == Some(&self.0.id)
    }

    pub(crate) fn model(&self) -> ModelId {
        self.0.model
    }

    pub(crate) fn safety(&self) -> SafetyChecks {
        self.0.safety
    }

    /// This shape followed by its ancestors, nearest first.
    fn lineage(&self) -> impl Iterator<Item = &Shape> {
        std::iter::successors(Some(self), |shape| shape.parent())
    }

    /// Check every property of the chain against this shape's layout.
    ///
    /// Only array storage places properties at byte offsets; field storage
    /// offsets are cell indices and cannot overlap.
    pub(crate) fn verify_chain(&self) -> Result<(), LayoutConflict> {
        if self.strategy() != StorageStrategy::Array {
            return Ok(());
        }
        let fields: Vec<(Kind, u32)> = self
            .lineage()
            .flat_map(|shape| shape.properties().iter().map(|p| (p.kind, p.offset)))
            .collect();
        self.layout().verify(&fields)
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Shape {}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("id", &self.0.id)
            .field("ancestors", &self.0.ancestors)
            .field("strategy", &self.strategy())
            .field("layout", &self.0.layout)
            .field("properties", &self.0.properties)
            .finish()
    }
}

/// A built shape together with the factory that allocates its instances.
pub struct StaticShape<B = ()> {
    factory: Factory<B>,
}

impl<B> StaticShape<B> {
    pub(crate) fn new(factory: Factory<B>) -> Self {
        StaticShape { factory }
    }

    pub fn shape(&self) -> &Shape {
        self.factory.shape()
    }

    pub fn id(&self) -> ShapeId {
        self.shape().id()
    }

    pub fn factory(&self) -> &Factory<B> {
        &self.factory
    }
}

impl<B> Clone for StaticShape<B> {
    fn clone(&self) -> Self {
        StaticShape {
            factory: self.factory.clone(),
        }
    }
}

impl<B> fmt::Debug for StaticShape<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticShape").field(self.shape()).finish()
    }
}
