//! Atomic access to fields narrower than a machine word.
//!
//! Storage is an array of `AtomicU64` words; a field of `width` bytes at byte
//! `offset` lives in word `offset / 8`, at a bit position that depends on the
//! native byte order. Reads load the whole word. Writes and read-modify-write
//! operations run a compare-and-exchange loop on the whole word that only
//! changes the field's bits, so concurrent writers of neighbouring fields in
//! the same word never lose each other's updates.
//!
//! The loop retries only when the word changed underneath it while the field
//! itself still held the expected value, i.e. a neighbour was written. A real
//! mismatch on the field returns immediately with the witness value. This is
//! lock-free but not wait-free.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::utils::Backoff;
use tracing::trace;

use crate::CasError;

/// Bytes per storage word.
pub(crate) const WORD_BYTES: u32 = 8;

/// Mask covering the low `width` bytes.
#[inline]
fn width_mask(width: u32) -> u64 {
    if width >= WORD_BYTES {
        u64::MAX
    } else {
        (1u64 << (width * 8)) - 1
    }
}

/// Bit shift of a `width`-byte field at byte `position` within a word.
#[inline]
fn field_shift(position: u32, width: u32) -> u32 {
    if cfg!(target_endian = "big") {
        (WORD_BYTES - position - width) * 8
    } else {
        position * 8
    }
}

/// View of one field inside one storage word.
#[derive(Copy, Clone)]
pub(crate) struct WordSlot<'a> {
    word: &'a AtomicU64,
    shift: u32,
    /// Unshifted value mask.
    mask: u64,
    /// No other field shares the word.
    exclusive: bool,
}

impl<'a> WordSlot<'a> {
    /// Field of `width` bytes at byte `offset` of a packed buffer whose word
    /// `offset / 8` is `word`.
    pub(crate) fn packed(word: &'a AtomicU64, offset: u32, width: u32) -> Result<Self, CasError> {
        if !matches!(width, 1 | 2 | 4 | 8) {
            return Err(CasError::UnsupportedWidth { width });
        }
        let position = offset % WORD_BYTES;
        if position + width > WORD_BYTES {
            return Err(CasError::SpansWords { offset, width });
        }
        Ok(WordSlot {
            word,
            shift: field_shift(position, width),
            mask: width_mask(width),
            exclusive: width == WORD_BYTES,
        })
    }

    /// Field of `width` bytes that owns `word` outright.
    pub(crate) fn dedicated(word: &'a AtomicU64, width: u32) -> Result<Self, CasError> {
        if !matches!(width, 1 | 2 | 4 | 8) {
            return Err(CasError::UnsupportedWidth { width });
        }
        Ok(WordSlot {
            word,
            shift: 0,
            mask: width_mask(width),
            exclusive: true,
        })
    }

    #[inline]
    fn extract(&self, word: u64) -> u64 {
        (word >> self.shift) & self.mask
    }

    #[inline]
    fn merge(&self, word: u64, bits: u64) -> u64 {
        (word & !(self.mask << self.shift)) | ((bits & self.mask) << self.shift)
    }

    /// Read the field.
    #[inline]
    pub(crate) fn load(&self, order: Ordering) -> u64 {
        self.extract(self.word.load(order))
    }

    /// Write the field. `order` is the ordering of the final store.
    pub(crate) fn store(&self, bits: u64, order: Ordering) {
        if self.exclusive {
            self.word.store(bits & self.mask, order);
            return;
        }
        self.update(order, |_| bits);
    }

    /// Replace the field if it holds `expected`.
    ///
    /// Returns `Ok(expected)` on success and `Err(witness)` with the field's
    /// current value otherwise.
    pub(crate) fn compare_exchange(&self, expected: u64, new: u64) -> Result<u64, u64> {
        let expected = expected & self.mask;
        if self.exclusive {
            return self
                .word
                .compare_exchange(expected, new & self.mask, Ordering::AcqRel, Ordering::Acquire);
        }

        let backoff = Backoff::new();
        loop {
            let current = self.word.load(Ordering::Acquire);
            let witness = self.extract(current);
            if witness != expected {
                return Err(witness);
            }
            let next = self.merge(current, new);
            if self
                .word
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(expected);
            }
            trace!(shift = self.shift, "sub-word CAS lost to a neighbouring write");
            backoff.spin();
        }
    }

    /// Atomically replace the field with `f(old)`, returning `old`.
    pub(crate) fn fetch_update(&self, f: impl FnMut(u64) -> u64) -> u64 {
        self.update(Ordering::AcqRel, f)
    }

    fn update(&self, order: Ordering, mut f: impl FnMut(u64) -> u64) -> u64 {
        let failure = match order {
            Ordering::Relaxed | Ordering::Release => Ordering::Relaxed,
            _ => Ordering::Acquire,
        };
        let backoff = Backoff::new();
        let mut current = self.word.load(failure);
        loop {
            let old = self.extract(current);
            let next = self.merge(current, f(old));
            match self.word.compare_exchange_weak(current, next, order, failure) {
                Ok(_) => return old,
                Err(actual) => {
                    current = actual;
                    backoff.spin();
                }
            }
        }
    }
}
