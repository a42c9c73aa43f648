//! core::config::schema
//!
//! Configuration schema types.
//!
//! # File
//!
//! Configuration is TOML, loaded from an explicit `--config` path or from
//! `glyphsync.toml` in the working directory; absence of both means stock
//! defaults.
//!
//! # Validation
//!
//! Values are validated after parsing: fetch tuning must be non-zero where
//! it gates progress, axis definitions must produce a valid variant space,
//! and preferred tokens must exist on their axis.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::variants::{AxisValue, PreferenceTable, VariantAxis, VariantSpace};

/// Top-level configuration.
///
/// # Example
///
/// ```toml
/// [source]
/// base_url = "https://assets.glyphsync.dev/icons"
///
/// [fetch]
/// batch_size = 20
/// inter_batch_delay_ms = 500
/// max_attempts = 5
/// backoff_base_secs = 60
/// backoff_cap_secs = 600
///
/// [reconcile]
/// delete_extra = true
///
/// [[axis]]
/// name = "style"
/// label = "Style"
/// preferred = "outlined"
/// values = [
///     { token = "outlined", label = "Outlined" },
///     { token = "rounded", label = "Rounded" },
/// ]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Remote source settings.
    pub source: SourceConfig,

    /// Fetch pipeline tuning.
    pub fetch: FetchConfig,

    /// Reconciliation behavior.
    pub reconcile: ReconcileConfig,

    /// Variant axes. Empty means the stock five-axis space.
    #[serde(rename = "axis")]
    pub axes: Vec<AxisConfig>,
}

/// Remote source settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Base URL the source reference builder prefixes onto every asset path.
    pub base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://assets.glyphsync.dev/icons".into(),
        }
    }
}

/// Fetch pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Items per batch; a whole batch is in flight at once.
    pub batch_size: usize,

    /// Pacing delay between batches, in milliseconds.
    pub inter_batch_delay_ms: u64,

    /// Maximum whole-pipeline attempts per entity (first pass + retries).
    pub max_attempts: u32,

    /// First inter-attempt backoff delay, in seconds. Doubles per attempt.
    pub backoff_base_secs: u64,

    /// Backoff ceiling, in seconds.
    pub backoff_cap_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            inter_batch_delay_ms: 500,
            max_attempts: 5,
            backoff_base_secs: 60,
            backoff_cap_secs: 600,
        }
    }
}

impl FetchConfig {
    /// Pacing delay as a `Duration`.
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }

    /// Backoff delay before retry attempt `attempt` (1-based), doubling
    /// from the base and clamped to the cap: ~1, 2, 4, 8 minutes with the
    /// stock values, capped at 10.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.backoff_base_secs.max(1);
        let factor = 1u64 << attempt.saturating_sub(1).min(32);
        Duration::from_secs(base.saturating_mul(factor).min(self.backoff_cap_secs.max(base)))
    }
}

/// Reconciliation behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Whether existing children outside the desired variant set are
    /// deleted. Default: permitted.
    pub delete_extra: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self { delete_extra: true }
    }
}

/// One configured axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    /// Canonical lowercase axis name.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Ordered values.
    pub values: Vec<AxisValueConfig>,
    /// Preferred value token for default-variant selection.
    /// Defaults to the first value.
    #[serde(default)]
    pub preferred: Option<String>,
}

/// One configured axis value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AxisValueConfig {
    /// Canonical lowercase token.
    pub token: String,
    /// Display label; defaults to the token.
    #[serde(default)]
    pub label: Option<String>,
}

impl SyncConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for bad tuning values or a
    /// preferred token missing from its axis; axis problems surface as
    /// `ConfigError::Space`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.base_url.is_empty() {
            return Err(ConfigError::InvalidValue(
                "source.base_url cannot be empty".into(),
            ));
        }
        if self.fetch.batch_size == 0 {
            return Err(ConfigError::InvalidValue(
                "fetch.batch_size must be at least 1".into(),
            ));
        }
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "fetch.max_attempts must be at least 1".into(),
            ));
        }
        if self.fetch.backoff_cap_secs < self.fetch.backoff_base_secs {
            return Err(ConfigError::InvalidValue(
                "fetch.backoff_cap_secs cannot be below fetch.backoff_base_secs".into(),
            ));
        }

        // Axis definitions must build, and preferred tokens must exist.
        let space = self.variant_space()?;
        for axis_cfg in &self.axes {
            if let Some(preferred) = &axis_cfg.preferred {
                let known = space
                    .axis(&axis_cfg.name)
                    .is_some_and(|axis| axis.value_by_token(preferred).is_some());
                if !known {
                    return Err(ConfigError::InvalidValue(format!(
                        "axis '{}' has no value with token '{}'",
                        axis_cfg.name, preferred
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build the variant space from the configured axes, or the stock space
    /// when none are configured.
    pub fn variant_space(&self) -> Result<VariantSpace, ConfigError> {
        if self.axes.is_empty() {
            return Ok(VariantSpace::standard());
        }
        let axes = self
            .axes
            .iter()
            .map(|axis| {
                VariantAxis::new(
                    axis.name.clone(),
                    axis.label.clone(),
                    axis.values
                        .iter()
                        .map(|v| match &v.label {
                            Some(label) => AxisValue::new(v.token.clone(), label.clone()),
                            None => AxisValue::plain(v.token.clone()),
                        })
                        .collect(),
                )
            })
            .collect();
        Ok(VariantSpace::new(axes)?)
    }

    /// Build the default-variant preference table.
    ///
    /// Configured `preferred` tokens override the first-value default;
    /// relaxation priority is declared axis order.
    pub fn preference_table(&self, space: &VariantSpace) -> PreferenceTable {
        if self.axes.is_empty() {
            return PreferenceTable::for_space(space);
        }
        let preferred = self
            .axes
            .iter()
            .filter_map(|axis_cfg| {
                let token = match &axis_cfg.preferred {
                    Some(token) => token.clone(),
                    None => axis_cfg.values.first()?.token.clone(),
                };
                Some((axis_cfg.name.clone(), token))
            })
            .collect();
        let priority = self.axes.iter().map(|a| a.name.clone()).collect();
        PreferenceTable::new(preferred, priority)
    }
}
