//! Object model configuration.
//!
//! # Environment
//!
//! - `STATO_STORAGE`: `array` (default) or `field`.
//! - `STATO_SAFETY`: `checked` (default) or `relaxed`.
//! - `STATO_BASE_OFFSET`: byte offset of the primitive region (default 0).
//! - `STATO_WORD_WIDTH`: `4` or `8` (default).

use stato_layout::LayoutConfig;

use crate::ConfigError;

/// Physical realisation of a shape's layout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum StorageStrategy {
    /// One packed byte buffer plus one reference buffer per instance.
    #[default]
    Array,
    /// One dedicated cell per property on a type generated per shape.
    Field,
}

impl StorageStrategy {
    pub fn name(self) -> &'static str {
        match self {
            StorageStrategy::Array => "array",
            StorageStrategy::Field => "field",
        }
    }
}

impl std::str::FromStr for StorageStrategy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "array" => Ok(StorageStrategy::Array),
            "field" => Ok(StorageStrategy::Field),
            _ => Err(ConfigError::InvalidValue {
                key: STORAGE_VAR,
                value: value.to_owned(),
            }),
        }
    }
}

/// How much validation every property access performs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SafetyChecks {
    /// Kind and shape are verified on every access.
    #[default]
    Checked,
    /// Kind and shape are only verified in debug builds.
    ///
    /// For call sites that already proved the property matches the object.
    /// Accessing an incompatible object gives unspecified results: another
    /// field's bytes, or a panic on an out-of-range offset.
    Relaxed,
}

impl std::str::FromStr for SafetyChecks {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "checked" => Ok(SafetyChecks::Checked),
            "relaxed" => Ok(SafetyChecks::Relaxed),
            _ => Err(ConfigError::InvalidValue {
                key: SAFETY_VAR,
                value: value.to_owned(),
            }),
        }
    }
}

const STORAGE_VAR: &str = "STATO_STORAGE";
const SAFETY_VAR: &str = "STATO_SAFETY";
const BASE_OFFSET_VAR: &str = "STATO_BASE_OFFSET";
const WORD_WIDTH_VAR: &str = "STATO_WORD_WIDTH";

fn parse_u32(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_owned(),
    })
}

/// Everything an [`ObjectModel`](crate::ObjectModel) is fixed to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelConfig {
    pub strategy: StorageStrategy,
    pub safety: SafetyChecks,
    pub layout: LayoutConfig,
}

impl ModelConfig {
    /// Defaults overridden by the `STATO_*` variables listed in the module
    /// docs.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = ModelConfig::default();
        if let Some(value) = lookup(STORAGE_VAR) {
            config.strategy = value.parse()?;
        }
        if let Some(value) = lookup(SAFETY_VAR) {
            config.safety = value.parse()?;
        }
        let base_offset = match lookup(BASE_OFFSET_VAR) {
            Some(value) => parse_u32(BASE_OFFSET_VAR, &value)?,
            None => config.layout.base_offset(),
        };
        let word_width = match lookup(WORD_WIDTH_VAR) {
            Some(value) => parse_u32(WORD_WIDTH_VAR, &value)?,
            None => config.layout.word_width(),
        };
        config.layout = LayoutConfig::new(base_offset, word_width)?;
        Ok(config)
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: StorageStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_safety(mut self, safety: SafetyChecks) -> Self {
        self.safety = safety;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }
}
