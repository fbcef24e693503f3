//! Field layout for static object shapes.
//!
//! This crate provides:
//!
//! - **Kind table** ([`Kind`]): the nine slot kinds, their byte widths and
//!   the fixed widest-first packing order.
//! - **Layout engine** ([`LayoutEngine`]): a deterministic hole-filling
//!   packer that assigns offsets to a shape's properties, optionally
//!   extending a parent [`Layout`] without moving any of its fields.
//!
//! Nothing here touches storage. `stato_object` turns a [`LayoutPlan`] into
//! allocatable storage and typed accessors.
//!
//! # Tracing
//!
//! Placements are reported at `trace` level:
//! `RUST_LOG=stato_layout=trace`.

mod engine;
mod error;
mod kind;
mod layout;

pub use engine::{HoleReuse, LayoutConfig, LayoutEngine, LayoutPlan};
pub use error::LayoutError;
pub use kind::Kind;
pub use layout::{Hole, Layout, LayoutConflict};
