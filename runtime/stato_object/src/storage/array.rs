//! Packed array-based storage.

use std::sync::atomic::AtomicU64;

use arc_swap::ArcSwapOption;

use super::cas::{WordSlot, WORD_BYTES};
use super::{empty_references, zeroed_words};
use crate::object::Referent;
use crate::CasError;

/// Byte buffer plus reference buffer of one instance.
pub(crate) struct ArrayStorage {
    /// Primitive region; byte `n` is byte `n % 8` (native order) of word `n / 8`.
    words: Box<[AtomicU64]>,
    references: Box<[ArcSwapOption<Referent>]>,
}

impl ArrayStorage {
    pub(crate) fn new(primitive_size: u32, reference_count: u32) -> Self {
        ArrayStorage {
            words: zeroed_words(primitive_size.div_ceil(WORD_BYTES)),
            references: empty_references(reference_count),
        }
    }

    #[inline]
    pub(crate) fn primitive(&self, offset: u32, width: u32) -> Result<WordSlot<'_>, CasError> {
        WordSlot::packed(&self.words[(offset / WORD_BYTES) as usize], offset, width)
    }

    #[inline]
    pub(crate) fn reference(&self, index: u32) -> &ArcSwapOption<Referent> {
        &self.references[index as usize]
    }
}
