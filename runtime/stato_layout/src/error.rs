//! Errors raised by the kind table and layout configuration.

/// Error produced while decoding kinds or configuring the layout engine.
///
/// Packing itself never fails: once every kind is valid and the
/// configuration is accepted, `LayoutEngine::compute` is infallible.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// Raw tag does not name any [`Kind`](crate::Kind).
    #[error("invalid property kind tag {raw}")]
    InvalidKind { raw: u8 },

    /// Word width the storage cannot address atomically.
    #[error("unsupported word width {width} (expected 4 or 8)")]
    InvalidWordWidth { width: u32 },
}
