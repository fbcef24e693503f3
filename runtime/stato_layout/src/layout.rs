//! Computed per-shape layout: region sizes and leftover holes.

use smallvec::SmallVec;

use crate::Kind;

/// Half-open byte range `[start, end)` in the primitive region.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Hole {
    pub start: u32,
    pub end: u32,
}

impl Hole {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Hole { start, end }
    }

    /// Number of bytes in the hole.
    #[inline]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// Drop everything at or beyond `limit`.
    pub(crate) fn clip(self, limit: u32) -> Option<Hole> {
        if self.start >= limit {
            None
        } else {
            Some(Hole::new(self.start, self.end.min(limit)))
        }
    }

    fn intersects(self, start: u32, end: u32) -> bool {
        self.start < end && start < self.end
    }
}

/// Layout of one shape.
///
/// Owned by exactly one shape and never mutated after the layout engine
/// produced it. Descendants copy `primitive_size`, `reference_count` and
/// (in array mode) `leftover_holes` as their starting point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub(crate) primitive_size: u32,
    pub(crate) reference_count: u32,
    pub(crate) leftover_holes: SmallVec<[Hole; 4]>,
}

impl Layout {
    /// Bytes spanned by the primitive region, including any base offset.
    #[inline]
    pub fn primitive_size(&self) -> u32 {
        self.primitive_size
    }

    /// Number of reference slots, inherited ones included.
    #[inline]
    pub fn reference_count(&self) -> u32 {
        self.reference_count
    }

    /// Unused byte ranges a descendant may fill.
    #[inline]
    pub fn leftover_holes(&self) -> &[Hole] {
        &self.leftover_holes
    }

    /// Check a set of `(kind, offset)` assignments against this layout.
    ///
    /// `fields` must cover the whole inheritance chain for the result to be
    /// meaningful. Reference offsets are slot indices, primitive offsets are
    /// byte offsets.
    pub fn verify(&self, fields: &[(Kind, u32)]) -> Result<(), LayoutConflict> {
        let mut ranges: Vec<(u32, u32)> = Vec::with_capacity(fields.len());
        let mut seen_references = vec![false; self.reference_count as usize];

        for &(kind, offset) in fields {
            if !kind.is_primitive() {
                match seen_references.get_mut(offset as usize) {
                    None => return Err(LayoutConflict::OutOfRegion { kind, offset }),
                    Some(true) => return Err(LayoutConflict::DuplicateReference { index: offset }),
                    Some(seen) => *seen = true,
                }
                continue;
            }
            let width = kind.byte_width();
            if offset % width != 0 {
                return Err(LayoutConflict::Misaligned { kind, offset });
            }
            if offset + width > self.primitive_size {
                return Err(LayoutConflict::OutOfRegion { kind, offset });
            }
            ranges.push((offset, offset + width));
        }

        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            if pair[1].0 < pair[0].1 {
                return Err(LayoutConflict::Overlap {
                    first: pair[0].0,
                    second: pair[1].0,
                });
            }
        }

        for &hole in &self.leftover_holes {
            if hole.end > self.primitive_size {
                return Err(LayoutConflict::HoleOutOfRegion { hole });
            }
            if let Some(&(start, _)) = ranges.iter().find(|&&(s, e)| hole.intersects(s, e)) {
                return Err(LayoutConflict::HoleOverlapsField { hole, offset: start });
            }
        }
        Ok(())
    }
}

/// Violation found by [`Layout::verify`].
///
/// The packer never produces these; they indicate a bug, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutConflict {
    #[error("fields at offsets {first} and {second} overlap")]
    Overlap { first: u32, second: u32 },

    #[error("{kind} field at offset {offset} is outside its region")]
    OutOfRegion { kind: Kind, offset: u32 },

    #[error("{kind} field at offset {offset} is not aligned to its width")]
    Misaligned { kind: Kind, offset: u32 },

    #[error("reference slot {index} assigned twice")]
    DuplicateReference { index: u32 },

    #[error("leftover hole {hole:?} extends past the primitive region")]
    HoleOutOfRegion { hole: Hole },

    #[error("leftover hole {hole:?} overlaps the field at offset {offset}")]
    HoleOverlapsField { hole: Hole, offset: u32 },
}
