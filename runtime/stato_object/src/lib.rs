//! Static objects: instances with a fixed, shape-defined set of typed slots.
//!
//! # Overview
//!
//! 1. Create [`StaticProperty`] descriptors.
//! 2. Register them on a [`ShapeBuilder`] from [`new_builder`] or
//!    [`ObjectModel::builder`].
//! 3. Build a [`StaticShape`], optionally extending a parent shape or
//!    embedding a base value through a [`FactoryInterface`].
//! 4. Allocate instances through [`StaticShape::factory`] and access them
//!    through the properties.
//!
//! Offsets come from the hole-filling layout engine in `stato_layout`.
//! Storage is either packed byte and reference buffers or one dedicated cell
//! per property ([`StorageStrategy`]); both expose the same accessors.
//! Primitive fields narrower than a word support lock-free compare-and-set
//! through a masked whole-word CAS.
//!
//! ```
//! use stato_object::{Kind, ModelConfig, ObjectModel, StaticProperty};
//!
//! let model = ObjectModel::new(ModelConfig::default());
//! let count = StaticProperty::new("count");
//! let flag = StaticProperty::new("flag");
//!
//! let mut builder = model.builder();
//! builder.property(&count, Kind::Int, false)?.property(&flag, Kind::Boolean, false)?;
//! let shape = builder.build()?;
//!
//! let object = shape.factory().create_default();
//! count.set(&object, 41i32)?;
//! assert_eq!(count.get_and_add(&object, 1i32)?, 41);
//! assert!(flag.compare_and_set(&object, false, true)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Tracing
//!
//! Call [`init_tracing`] and set `RUST_LOG`, e.g.
//! `RUST_LOG=stato_object=debug,stato_layout=trace`.

mod builder;
mod config;
mod error;
mod factory;
mod model;
mod object;
mod primitive;
mod property;
mod shape;
mod storage;

use std::sync::Once;

pub use builder::{ShapeBuilder, MAX_PROPERTIES};
pub use config::{ModelConfig, SafetyChecks, StorageStrategy};
pub use error::{
    AccessError, BuildError, CasError, ConfigError, FactoryError, InitSlot, PropertyError,
};
pub use factory::{
    Arg, BaseType, Constructor, Factory, FactoryInterface, FactoryMethod, Init, ParamType,
    TypeForm, Visibility, DEFAULT_METHOD,
};
pub use model::{configure, new_builder, ModelId, ObjectModel};
pub use object::{ObjectRef, Referent, StaticObject};
pub use primitive::{Integral, Primitive};
pub use property::StaticProperty;
pub use shape::{PropertyInfo, Shape, ShapeId, StaticShape};
pub use storage::{FieldFlags, GeneratedField, GeneratedType, StorageType};
pub use stato_layout::{Hole, Kind, Layout, LayoutConfig, LayoutError};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// - `RUST_LOG=stato_object=debug`: one event per built shape.
/// - `RUST_LOG=stato_object::storage=trace`: sub-word CAS retries.
/// - `RUST_LOG=stato_layout=trace`: every hole fill and region placement.
///
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
