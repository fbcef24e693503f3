//! Field-based storage: one generated type per shape.
//!
//! The generator turns a shape's property list into a [`GeneratedType`]
//! that extends the parent's generated type. Each property becomes a named
//! field with its own cell; primitives are emitted in layout order and
//! references in registration order, after all fields of the parent.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use bitflags::bitflags;
use stato_layout::Kind;

use super::cas::WordSlot;
use super::{empty_references, zeroed_words};
use crate::object::Referent;
use crate::CasError;

bitflags! {
    /// Modifiers of a generated field.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct FieldFlags: u8 {
        /// Declared with `store_as_final`.
        const FINAL = 1 << 0;
        /// Holds an object reference rather than a primitive.
        const REFERENCE = 1 << 1;
    }
}

/// One field of a generated type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedField {
    /// Property id the field was generated for.
    pub name: Box<str>,
    pub kind: Kind,
    pub flags: FieldFlags,
    /// Cell index; primitives and references use separate index spaces.
    pub native_offset: u32,
}

/// Storage type synthesised for one field-based shape.
#[derive(Debug)]
pub struct GeneratedType {
    parent: Option<Arc<GeneratedType>>,
    fields: Vec<GeneratedField>,
    primitive_cells: u32,
    reference_cells: u32,
}

impl GeneratedType {
    /// The generated type this one extends.
    pub fn parent(&self) -> Option<&Arc<GeneratedType>> {
        self.parent.as_ref()
    }

    /// Fields declared by this type, in emission order.
    pub fn own_fields(&self) -> &[GeneratedField] {
        &self.fields
    }

    /// All fields including inherited ones, root type first.
    pub fn fields(&self) -> Vec<&GeneratedField> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(ty) = current {
            chain.push(ty);
            current = ty.parent.as_deref();
        }
        chain
            .into_iter()
            .rev()
            .flat_map(|ty| ty.fields.iter())
            .collect()
    }

    /// Total primitive cells, inherited ones included.
    pub fn primitive_cells(&self) -> u32 {
        self.primitive_cells
    }

    /// Total reference cells, inherited ones included.
    pub fn reference_cells(&self) -> u32 {
        self.reference_cells
    }
}

/// Input to the generator for one property.
pub(crate) struct FieldRequest<'a> {
    pub(crate) name: &'a str,
    pub(crate) kind: Kind,
    /// Offset assigned by the layout engine; orders primitive emission.
    pub(crate) layout_offset: u32,
    pub(crate) store_as_final: bool,
}

/// Generate the type for `requests` on top of `parent`.
///
/// Returns the type together with each request's native offset, in request
/// order.
pub(crate) fn generate_fields(
    parent: Option<&Arc<GeneratedType>>,
    requests: &[FieldRequest<'_>],
) -> (Arc<GeneratedType>, Vec<u32>) {
    let mut next_primitive = parent.map_or(0, |p| p.primitive_cells);
    let mut next_reference = parent.map_or(0, |p| p.reference_cells);

    let mut primitives: Vec<usize> = (0..requests.len())
        .filter(|&i| requests[i].kind.is_primitive())
        .collect();
    primitives.sort_by_key(|&i| requests[i].layout_offset);
    let references = (0..requests.len()).filter(|&i| !requests[i].kind.is_primitive());

    let mut native = vec![0; requests.len()];
    let mut fields = Vec::with_capacity(requests.len());
    for index in primitives.into_iter().chain(references) {
        let request = &requests[index];
        let mut flags = FieldFlags::empty();
        flags.set(FieldFlags::FINAL, request.store_as_final);
        let native_offset = if request.kind.is_primitive() {
            next_primitive += 1;
            next_primitive - 1
        } else {
            flags |= FieldFlags::REFERENCE;
            next_reference += 1;
            next_reference - 1
        };
        native[index] = native_offset;
        fields.push(GeneratedField {
            name: request.name.into(),
            kind: request.kind,
            flags,
            native_offset,
        });
    }

    let generated = GeneratedType {
        parent: parent.cloned(),
        fields,
        primitive_cells: next_primitive,
        reference_cells: next_reference,
    };
    (Arc::new(generated), native)
}

/// Dedicated cells of one instance of a generated type.
pub(crate) struct FieldStorage {
    cells: Box<[AtomicU64]>,
    references: Box<[ArcSwapOption<Referent>]>,
}

impl FieldStorage {
    pub(crate) fn new(generated: &GeneratedType) -> Self {
        FieldStorage {
            cells: zeroed_words(generated.primitive_cells),
            references: empty_references(generated.reference_cells),
        }
    }

    #[inline]
    pub(crate) fn primitive(&self, offset: u32, width: u32) -> Result<WordSlot<'_>, CasError> {
        WordSlot::dedicated(&self.cells[offset as usize], width)
    }

    #[inline]
    pub(crate) fn reference(&self, index: u32) -> &ArcSwapOption<Referent> {
        &self.references[index as usize]
    }
}
