//! Single-use shape builder.

use rustc_hash::FxHashSet;
use stato_layout::{HoleReuse, Kind};
use tracing::debug;

use crate::factory::{BaseType, Bindings, FactoryInterface};
use crate::model::ObjectModel;
use crate::shape::{PropertyInfo, Shape, ShapeParts, StaticShape};
use crate::storage::{generate_fields, FieldRequest, StorageType};
use crate::{BuildError, StaticProperty, StorageStrategy};

/// Most properties a single builder accepts.
pub const MAX_PROPERTIES: usize = 65_535;

struct Entry {
    property: StaticProperty,
    kind: Kind,
    store_as_final: bool,
}

/// Collects properties and builds them into one [`StaticShape`].
///
/// Not thread-safe: registration and build must happen on one thread or
/// under external synchronisation. Once a build succeeds the builder is
/// closed and every further call fails with [`BuildError::BuilderClosed`].
pub struct ShapeBuilder {
    model: ObjectModel,
    entries: Vec<Entry>,
    ids: FxHashSet<Box<str>>,
    active: bool,
}

impl ShapeBuilder {
    pub(crate) fn new(model: ObjectModel) -> Self {
        ShapeBuilder {
            model,
            entries: Vec::new(),
            ids: FxHashSet::default(),
            active: true,
        }
    }

    pub fn model(&self) -> &ObjectModel {
        &self.model
    }

    /// Register `property` with the given kind.
    ///
    /// Fixes the property's kind, so a property can only ever be registered
    /// once across all builders.
    pub fn property(
        &mut self,
        property: &StaticProperty,
        kind: Kind,
        store_as_final: bool,
    ) -> Result<&mut Self, BuildError> {
        if !self.active {
            return Err(BuildError::BuilderClosed);
        }
        let id = property.id();
        if id.is_empty() {
            return Err(BuildError::InvalidId);
        }
        if self.ids.contains(id) {
            return Err(BuildError::DuplicateId { id: id.to_owned() });
        }
        if self.entries.len() >= MAX_PROPERTIES {
            return Err(BuildError::TooManyProperties {
                limit: MAX_PROPERTIES,
            });
        }
        property.init(kind, store_as_final)?;
        self.ids.insert(id.into());
        self.entries.push(Entry {
            property: property.clone(),
            kind,
            store_as_final,
        });
        Ok(self)
    }

    /// Build a root shape with the unit base type and default factory.
    pub fn build(&mut self) -> Result<StaticShape<()>, BuildError> {
        self.ensure_active()?;
        let base = BaseType::unit();
        let bindings = Bindings::resolve(&base, &FactoryInterface::default_for(&base))?;
        let shape = self.finish(None)?;
        Ok(StaticShape::new(bindings.attach(shape)))
    }

    /// Build a shape extending `parent`, allocating through the parent's
    /// factory methods.
    pub fn build_with_parent<B>(
        &mut self,
        parent: &StaticShape<B>,
    ) -> Result<StaticShape<B>, BuildError> {
        self.ensure_active()?;
        if parent.shape().model() != self.model.id() {
            return Err(BuildError::ModelMismatch);
        }
        let shape = self.finish(Some(parent.shape()))?;
        Ok(StaticShape::new(parent.factory().rebind(shape)))
    }

    /// Build a root shape whose instances embed a `B` produced through
    /// `interface`.
    ///
    /// The interface is validated before anything is laid out; a rejected
    /// interface leaves the builder open.
    pub fn build_with_factory<B>(
        &mut self,
        base: BaseType<B>,
        interface: &FactoryInterface,
    ) -> Result<StaticShape<B>, BuildError> {
        self.ensure_active()?;
        let bindings = Bindings::resolve(&base, interface)?;
        let shape = self.finish(None)?;
        Ok(StaticShape::new(bindings.attach(shape)))
    }

    fn ensure_active(&self) -> Result<(), BuildError> {
        if self.active {
            Ok(())
        } else {
            Err(BuildError::BuilderClosed)
        }
    }

    /// Lay out, generate storage, close the builder, and bind properties.
    fn finish(&mut self, parent: Option<&Shape>) -> Result<Shape, BuildError> {
        let config = self.model.config();
        let kinds: Vec<Kind> = self.entries.iter().map(|e| e.kind).collect();
        let reuse = match config.strategy {
            StorageStrategy::Array => HoleReuse::Inherit,
            StorageStrategy::Field => HoleReuse::Isolated,
        };
        let plan = self
            .model
            .engine()
            .compute(&kinds, parent.map(Shape::layout), reuse);

        let (storage_type, offsets) = match config.strategy {
            StorageStrategy::Array => (
                StorageType::Array {
                    primitive_size: plan.layout.primitive_size(),
                    reference_count: plan.layout.reference_count(),
                },
                plan.offsets,
            ),
            StorageStrategy::Field => {
                let requests: Vec<FieldRequest<'_>> = self
                    .entries
                    .iter()
                    .zip(&plan.offsets)
                    .map(|(entry, &layout_offset)| FieldRequest {
                        name: entry.property.id(),
                        kind: entry.kind,
                        layout_offset,
                        store_as_final: entry.store_as_final,
                    })
                    .collect();
                let parent_type = parent.and_then(|p| match p.storage_type() {
                    StorageType::Field(generated) => Some(generated),
                    StorageType::Array { .. } => None,
                });
                let (generated, native) = generate_fields(parent_type, &requests);
                (StorageType::Field(generated), native)
            }
        };
        self.active = false;

        let properties = self
            .entries
            .iter()
            .zip(&offsets)
            .map(|(entry, &offset)| PropertyInfo {
                id: entry.property.id().into(),
                kind: entry.kind,
                offset,
                store_as_final: entry.store_as_final,
            })
            .collect();
        let shape = Shape::new(ShapeParts {
            parent: parent.cloned(),
            layout: plan.layout,
            storage_type,
            model: self.model.id(),
            safety: config.safety,
            properties,
        });

        for (entry, &offset) in self.entries.iter().zip(&offsets) {
            entry.property.init_offset(offset)?;
            entry.property.init_shape(shape.clone())?;
        }

        debug!(
            shape = %shape.id(),
            parent = ?parent.map(Shape::id),
            strategy = config.strategy.name(),
            primitive_size = shape.layout().primitive_size(),
            reference_count = shape.layout().reference_count(),
            properties = self.entries.len(),
            "built shape"
        );
        debug_assert!(
            shape.verify_chain().is_ok(),
            "layout conflict in shape {}: {:?}",
            shape.id(),
            shape.verify_chain()
        );
        Ok(shape)
    }
}
