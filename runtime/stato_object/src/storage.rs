//! Storage strategies.
//!
//! A shape's layout is realised by one of two interchangeable backends,
//! selected once per [`ObjectModel`](crate::ObjectModel):
//!
//! - **Array**: each instance owns a packed byte buffer (stored as atomic
//!   64-bit words in native byte order) sized to the primitive region, and a
//!   buffer of reference slots. Property offsets index these buffers
//!   directly, and fields narrower than a word share words with their
//!   neighbours.
//! - **Field**: a [`GeneratedType`] is produced per shape with one dedicated
//!   cell per property; the property offset is the field's native index.
//!   Fields never share cells, so no hole is ever shared across shapes.
//!
//! Both present the same accessor semantics; they differ only in
//! representation.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use stato_layout::Kind;

use crate::object::Referent;
use crate::{CasError, StorageStrategy};

mod array;
pub(crate) mod cas;
mod field;

pub use field::{FieldFlags, GeneratedField, GeneratedType};

pub(crate) use array::ArrayStorage;
pub(crate) use cas::WordSlot;
pub(crate) use field::{generate_fields, FieldRequest, FieldStorage};

/// Allocatable storage type produced for one shape.
#[derive(Clone, Debug)]
pub enum StorageType {
    /// Packed buffers of the given sizes.
    Array {
        primitive_size: u32,
        reference_count: u32,
    },
    /// Dedicated cells described by a generated type.
    Field(Arc<GeneratedType>),
}

impl StorageType {
    pub fn strategy(&self) -> StorageStrategy {
        match self {
            StorageType::Array { .. } => StorageStrategy::Array,
            StorageType::Field(_) => StorageStrategy::Field,
        }
    }

    /// Fresh, zeroed storage for one instance.
    pub(crate) fn allocate(&self) -> Storage {
        match self {
            StorageType::Array {
                primitive_size,
                reference_count,
            } => Storage::Array(ArrayStorage::new(*primitive_size, *reference_count)),
            StorageType::Field(generated) => Storage::Field(FieldStorage::new(generated)),
        }
    }
}

/// Backing storage of one instance.
pub(crate) enum Storage {
    Array(ArrayStorage),
    Field(FieldStorage),
}

impl Storage {
    /// Word view of the primitive field of `kind` at `offset`.
    #[inline]
    pub(crate) fn primitive(&self, offset: u32, kind: Kind) -> Result<WordSlot<'_>, CasError> {
        match self {
            Storage::Array(storage) => storage.primitive(offset, kind.byte_width()),
            Storage::Field(storage) => storage.primitive(offset, kind.byte_width()),
        }
    }

    /// Reference slot at `offset`.
    #[inline]
    pub(crate) fn reference(&self, offset: u32) -> &ArcSwapOption<Referent> {
        match self {
            Storage::Array(storage) => storage.reference(offset),
            Storage::Field(storage) => storage.reference(offset),
        }
    }
}

/// `count` zeroed words.
fn zeroed_words(count: u32) -> Box<[AtomicU64]> {
    (0..count).map(|_| AtomicU64::new(0)).collect()
}

/// `count` empty reference slots.
fn empty_references(count: u32) -> Box<[ArcSwapOption<Referent>]> {
    (0..count).map(|_| ArcSwapOption::empty()).collect()
}
