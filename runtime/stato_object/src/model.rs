//! Object models: the storage strategy, safety mode, and layout parameters
//! every shape of a hierarchy shares.
//!
//! The process has one global model, fixed by [`configure`] or, failing
//! that, by the environment on first use. Independent models can be created
//! with [`ObjectModel::new`]; shapes of different models never mix.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use stato_layout::LayoutEngine;
use tracing::warn;

use crate::{ConfigError, ModelConfig, ShapeBuilder};

/// Identity of an [`ObjectModel`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelId(u32);

static NEXT_MODEL_ID: AtomicU32 = AtomicU32::new(0);

static GLOBAL: OnceLock<ObjectModel> = OnceLock::new();

/// A fixed configuration shapes are built under.
#[derive(Copy, Clone, Debug)]
pub struct ObjectModel {
    id: ModelId,
    config: ModelConfig,
    engine: LayoutEngine,
}

impl ObjectModel {
    pub fn new(config: ModelConfig) -> Self {
        ObjectModel {
            id: ModelId(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed)),
            config,
            engine: LayoutEngine::new(config.layout),
        }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn config(&self) -> ModelConfig {
        self.config
    }

    pub(crate) fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    /// A fresh builder for shapes of this model.
    pub fn builder(&self) -> ShapeBuilder {
        ShapeBuilder::new(*self)
    }

    /// The process-wide model.
    ///
    /// Created on first use from [`ModelConfig::from_env`] unless
    /// [`configure`] ran first. An invalid environment falls back to the
    /// defaults.
    pub fn global() -> ObjectModel {
        *GLOBAL.get_or_init(|| {
            let config = ModelConfig::from_env().unwrap_or_else(|error| {
                warn!(%error, "invalid object model environment; using defaults");
                ModelConfig::default()
            });
            ObjectModel::new(config)
        })
    }
}

/// Fix the process-wide model.
///
/// Fails with [`ConfigError::AlreadyConfigured`] once the global model
/// exists, whether from an earlier call or from first use.
pub fn configure(config: ModelConfig) -> Result<ObjectModel, ConfigError> {
    let mut installed = false;
    let model = GLOBAL.get_or_init(|| {
        installed = true;
        ObjectModel::new(config)
    });
    if installed {
        Ok(*model)
    } else {
        Err(ConfigError::AlreadyConfigured)
    }
}

/// A builder for the process-wide model.
pub fn new_builder() -> ShapeBuilder {
    ObjectModel::global().builder()
}
