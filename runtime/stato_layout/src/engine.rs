//! Hole-filling bin packer for primitive fields.
//!
//! Given the kinds requested by a builder and (optionally) the layout of the
//! parent shape, the engine assigns every property an offset and produces the
//! child's [`Layout`].
//!
//! # Algorithm
//!
//! 1. Start from the parent's size and leftover holes. A root layout starts
//!    at the configured base offset; if that offset is not word aligned, the
//!    padding up to the next word boundary becomes a hole.
//! 2. The widest requested kind fixes `start`, the current size rounded up to
//!    that kind's width. The rounding gap is a hole as well.
//! 3. Every known hole is filled from its high end, scanning kinds widest
//!    first. A slot that would be misaligned is pushed down to the aligned
//!    boundary below it and the bytes above it are offered to narrower kinds.
//!    Whatever nothing fits into is kept as a leftover hole for descendants.
//! 4. Fields no hole absorbed are laid out back to back from `start`, one
//!    region per kind in packing order.
//! 5. References get consecutive slot indices after the parent's.
//!
//! The order in which kinds and holes are visited fixes the offsets; it is
//! part of the contract, not an implementation detail.

use smallvec::{smallvec, SmallVec};
use tracing::trace;

use crate::{Hole, Kind, Layout, LayoutError};

/// Whether a child may reuse its parent's leftover holes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HoleReuse {
    /// Fill holes inherited from the parent.
    Inherit,
    /// Keep the parent's size but ignore its holes.
    Isolated,
}

/// Machine parameters the packer needs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LayoutConfig {
    base_offset: u32,
    word_width: u32,
}

impl LayoutConfig {
    /// `base_offset` is where the primitive region starts inside storage;
    /// `word_width` is the machine word the region is aligned to.
    pub fn new(base_offset: u32, word_width: u32) -> Result<Self, LayoutError> {
        if !matches!(word_width, 4 | 8) {
            return Err(LayoutError::InvalidWordWidth { width: word_width });
        }
        Ok(LayoutConfig {
            base_offset,
            word_width,
        })
    }

    #[inline]
    pub fn base_offset(&self) -> u32 {
        self.base_offset
    }

    #[inline]
    pub fn word_width(&self) -> u32 {
        self.word_width
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            base_offset: 0,
            word_width: 8,
        }
    }
}

/// Result of packing one builder's properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutPlan {
    /// Layout of the new shape.
    pub layout: Layout,
    /// One offset per requested kind, in request order. Byte offsets for
    /// primitives, slot indices for references.
    pub offsets: Vec<u32>,
}

/// Stateless packer parameterised by a [`LayoutConfig`].
#[derive(Copy, Clone, Debug, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        LayoutEngine { config }
    }

    #[inline]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Assign offsets to `kinds`, extending `parent` if given.
    pub fn compute(&self, kinds: &[Kind], parent: Option<&Layout>, reuse: HoleReuse) -> LayoutPlan {
        let (base_size, mut holes, reference_base) = match parent {
            Some(parent) => {
                let holes = match reuse {
                    HoleReuse::Inherit => parent.leftover_holes.clone(),
                    HoleReuse::Isolated => SmallVec::new(),
                };
                (parent.primitive_size, holes, parent.reference_count)
            }
            None => {
                let (size, holes) = self.root_region();
                (size, holes, 0)
            }
        };

        let mut pending = [0u32; Kind::PRIMITIVE_COUNT];
        for kind in kinds {
            if let Some(index) = kind.packing_index() {
                pending[index] += 1;
            }
        }

        let start = pending
            .iter()
            .position(|&count| count > 0)
            .map_or(base_size, |index| {
                align_up(base_size, Kind::PACKING_ORDER[index].byte_width())
            });
        if start > base_size {
            holes.push(Hole::new(base_size, start));
        }

        let mut scheduler = HoleScheduler::new(pending);
        for hole in holes {
            scheduler.fill(hole, 0);
        }

        // Region cursors for whatever the holes did not absorb.
        let mut cursors = [0u32; Kind::PRIMITIVE_COUNT];
        let mut region_end = start;
        for (index, kind) in Kind::PACKING_ORDER.iter().enumerate() {
            cursors[index] = region_end;
            region_end += scheduler.pending[index] * kind.byte_width();
        }

        let mut hole_taken = [0usize; Kind::PRIMITIVE_COUNT];
        let mut high_water = base_size;
        let mut next_reference = reference_base;
        let mut offsets = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            let Some(index) = kind.packing_index() else {
                offsets.push(next_reference);
                next_reference += 1;
                continue;
            };
            let width = kind.byte_width();
            let offset = if let Some(&slot) = scheduler.slots[index].get(hole_taken[index]) {
                hole_taken[index] += 1;
                slot
            } else {
                let slot = cursors[index];
                cursors[index] += width;
                trace!(%kind, offset = slot, "placed in region");
                slot
            };
            high_water = high_water.max(offset + width);
            offsets.push(offset);
        }

        let leftover_holes: SmallVec<[Hole; 4]> = scheduler
            .leftovers
            .into_iter()
            .filter_map(|hole| hole.clip(high_water))
            .collect();

        trace!(
            primitive_size = high_water,
            reference_count = next_reference,
            holes = leftover_holes.len(),
            "layout computed"
        );

        LayoutPlan {
            layout: Layout {
                primitive_size: high_water,
                reference_count: next_reference,
                leftover_holes,
            },
            offsets,
        }
    }

    /// Starting size and holes of a parentless layout.
    fn root_region(&self) -> (u32, SmallVec<[Hole; 4]>) {
        let base = self.config.base_offset;
        let aligned = align_up(base, self.config.word_width);
        if aligned == base {
            (base, SmallVec::new())
        } else {
            (aligned, smallvec![Hole::new(base, aligned)])
        }
    }
}

/// Round `value` up to a multiple of `align` (a power of two).
#[inline]
fn align_up(value: u32, align: u32) -> u32 {
    (value + align - 1) & !(align - 1)
}

/// Carves field slots out of holes and tracks what remains.
struct HoleScheduler {
    /// Fields per kind still waiting for a slot.
    pending: [u32; Kind::PRIMITIVE_COUNT],
    /// Hole slots handed out per kind, in carving order.
    slots: [SmallVec<[u32; 4]>; Kind::PRIMITIVE_COUNT],
    /// Unused remainders, kept for descendants.
    leftovers: SmallVec<[Hole; 4]>,
}

impl HoleScheduler {
    fn new(pending: [u32; Kind::PRIMITIVE_COUNT]) -> Self {
        HoleScheduler {
            pending,
            slots: Default::default(),
            leftovers: SmallVec::new(),
        }
    }

    /// Fill `hole` from its high end with kinds from `first` onwards.
    fn fill(&mut self, hole: Hole, first: usize) {
        let start = hole.start;
        let mut end = hole.end;

        for index in first..Kind::PRIMITIVE_COUNT {
            let kind = Kind::PACKING_ORDER[index];
            let width = kind.byte_width();
            while self.pending[index] > 0 && end - start >= width {
                let mut slot = end - width;
                let misalignment = slot % width;
                if misalignment != 0 {
                    let aligned = slot - misalignment;
                    if aligned < start {
                        break;
                    }
                    // The bytes above the realigned slot go to narrower kinds.
                    self.fill(Hole::new(aligned + width, end), index + 1);
                    slot = aligned;
                }
                self.pending[index] -= 1;
                self.slots[index].push(slot);
                trace!(%kind, offset = slot, "filled hole");
                end = slot;
            }
        }

        if end > start {
            self.leftovers.push(Hole::new(start, end));
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
