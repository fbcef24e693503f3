//! Property kinds and their packing order.
//!
//! `Kind` is the type tag of a static property slot. The eight primitive
//! kinds are listed in packing order (widest first); the layout engine walks
//! them in exactly this order, which is what makes offsets deterministic.
//!
//! # Raw tags
//!
//! | Tag | Kind      | Width |
//! |-----|-----------|-------|
//! | 0   | `long`    | 8     |
//! | 1   | `double`  | 8     |
//! | 2   | `int`     | 4     |
//! | 3   | `float`   | 4     |
//! | 4   | `short`   | 2     |
//! | 5   | `char`    | 2     |
//! | 6   | `byte`    | 1     |
//! | 7   | `boolean` | 1     |
//! | 8   | `Object`  | ptr   |

use std::fmt;

use crate::LayoutError;

/// Type tag of a static property.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Kind {
    /// 64-bit signed integer.
    Long = 0,
    /// 64-bit IEEE 754 float.
    Double = 1,
    /// 32-bit signed integer.
    Int = 2,
    /// 32-bit IEEE 754 float.
    Float = 3,
    /// 16-bit signed integer.
    Short = 4,
    /// 16-bit unsigned code unit.
    Char = 5,
    /// 8-bit signed integer.
    Byte = 6,
    /// Boolean stored as a single byte (0 or 1).
    Boolean = 7,
    /// Shared reference, stored outside the primitive region.
    Reference = 8,
}

impl Kind {
    /// Number of primitive kinds.
    pub const PRIMITIVE_COUNT: usize = 8;

    /// Primitive kinds, widest first. Ties keep this exact order.
    pub const PACKING_ORDER: [Kind; Self::PRIMITIVE_COUNT] = [
        Kind::Long,
        Kind::Double,
        Kind::Int,
        Kind::Float,
        Kind::Short,
        Kind::Char,
        Kind::Byte,
        Kind::Boolean,
    ];

    /// Every kind in raw-tag order.
    pub const ALL: [Kind; 9] = [
        Kind::Long,
        Kind::Double,
        Kind::Int,
        Kind::Float,
        Kind::Short,
        Kind::Char,
        Kind::Byte,
        Kind::Boolean,
        Kind::Reference,
    ];

    /// Size of one slot of this kind, in bytes.
    #[inline]
    pub const fn byte_width(self) -> u32 {
        match self {
            Kind::Long | Kind::Double => 8,
            Kind::Int | Kind::Float => 4,
            Kind::Short | Kind::Char => 2,
            Kind::Byte | Kind::Boolean => 1,
            Kind::Reference => usize::BITS / 8,
        }
    }

    /// `true` for every kind that lives in the primitive byte region.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        !matches!(self, Kind::Reference)
    }

    /// Position in [`Kind::PACKING_ORDER`], or `None` for references.
    #[inline]
    pub const fn packing_index(self) -> Option<usize> {
        if self.is_primitive() {
            Some(self as usize)
        } else {
            None
        }
    }

    /// Raw tag of this kind.
    #[inline]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Long => "long",
            Kind::Double => "double",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Short => "short",
            Kind::Char => "char",
            Kind::Byte => "byte",
            Kind::Boolean => "boolean",
            Kind::Reference => "Object",
        }
    }
}

impl TryFrom<u8> for Kind {
    type Error = LayoutError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Kind::ALL
            .get(usize::from(raw))
            .copied()
            .ok_or(LayoutError::InvalidKind { raw })
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
