//! Rust types that map onto primitive property kinds.
//!
//! Every primitive travels through storage as its raw bits, zero-extended to
//! 64 bits. Floats use their raw bit patterns, so `-0.0` and every NaN
//! payload survive a round trip and compare-and-set compares bits, not
//! numeric values.

// Narrowing casts below reinterpret bit patterns on purpose.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]

use stato_layout::Kind;

mod sealed {
    pub trait Sealed {}
}

/// A value type accessible through a primitive property.
pub trait Primitive: Copy + Send + Sync + 'static + sealed::Sealed {
    /// Kind a property must be declared with to be accessed as `Self`.
    const KIND: Kind;

    /// Raw bits, zero-extended.
    fn to_bits(self) -> u64;

    /// Rebuild a value from the low `KIND.byte_width()` bytes of `bits`.
    fn from_bits(bits: u64) -> Self;
}

/// Primitive types that support atomic `get_and_add`.
pub trait Integral: Primitive {
    /// `bits + delta`, wrapping within the type's width.
    fn wrapping_add_bits(bits: u64, delta: Self) -> u64;
}

macro_rules! primitive {
    ($ty:ty, $kind:ident, |$v:ident| $to:expr, |$b:ident| $from:expr) => {
        impl sealed::Sealed for $ty {}

        impl Primitive for $ty {
            const KIND: Kind = Kind::$kind;

            #[inline]
            fn to_bits(self) -> u64 {
                let $v = self;
                $to
            }

            #[inline]
            fn from_bits(bits: u64) -> Self {
                let $b = bits;
                $from
            }
        }
    };
}

primitive!(i64, Long, |v| v as u64, |b| b as i64);
primitive!(f64, Double, |v| v.to_bits(), |b| f64::from_bits(b));
primitive!(i32, Int, |v| u64::from(v as u32), |b| b as u32 as i32);
primitive!(f32, Float, |v| u64::from(v.to_bits()), |b| f32::from_bits(b as u32));
primitive!(i16, Short, |v| u64::from(v as u16), |b| b as u16 as i16);
primitive!(u16, Char, |v| u64::from(v), |b| b as u16);
primitive!(i8, Byte, |v| u64::from(v as u8), |b| b as u8 as i8);
primitive!(bool, Boolean, |v| u64::from(v), |b| (b & 0xFF) != 0);

impl Integral for i32 {
    #[inline]
    fn wrapping_add_bits(bits: u64, delta: Self) -> u64 {
        Self::from_bits(bits).wrapping_add(delta).to_bits()
    }
}

impl Integral for i64 {
    #[inline]
    fn wrapping_add_bits(bits: u64, delta: Self) -> u64 {
        Self::from_bits(bits).wrapping_add(delta).to_bits()
    }
}
