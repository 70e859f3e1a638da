//! Runtime configuration loaded from TOML.

use std::io;
use std::path::Path;

use scopeline_tokenizer::EngineCfg;
use serde::Deserialize;
use tracing::debug;

/// Errors loading a [`ScopelineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config: {0}")]
	Io(#[from] io::Error),
	#[error("invalid config TOML: {0}")]
	Toml(#[from] toml::de::Error),
	#[error("invalid config value `{key}`: {reason}")]
	Invalid { key: &'static str, reason: String },
}

/// Tuning for the incremental parse scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerCfg {
	/// Upper bound on tokenization tasks running at once.
	pub max_concurrency: usize,
	/// Lines tokenized between two cancellation checks.
	pub cancel_check_lines: usize,
}

impl Default for SchedulerCfg {
	fn default() -> Self {
		Self {
			max_concurrency: 4,
			cancel_check_lines: 64,
		}
	}
}

impl SchedulerCfg {
	/// Clamps every knob to at least 1.
	pub fn normalized(self) -> Self {
		Self {
			max_concurrency: self.max_concurrency.max(1),
			cancel_check_lines: self.cancel_check_lines.max(1),
		}
	}
}

/// Top-level configuration file.
///
/// ```toml
/// [scheduler]
/// max_concurrency = 2
///
/// [engine]
/// max_nesting = 32
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopelineConfig {
	pub scheduler: SchedulerCfg,
	pub engine: EngineCfg,
}

impl ScopelineConfig {
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let cfg: Self = toml::from_str(input)?;
		cfg.validate()?;
		Ok(cfg)
	}

	/// Loads `path`; a missing file yields the defaults.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		match std::fs::read_to_string(path) {
			Ok(input) => Self::from_toml_str(&input),
			Err(err) if err.kind() == io::ErrorKind::NotFound => {
				debug!(path = %path.display(), "config.missing");
				Ok(Self::default())
			}
			Err(err) => Err(err.into()),
		}
	}

	/// The engine settings with the scheduler's cancellation cadence applied.
	pub fn engine_cfg(&self) -> EngineCfg {
		EngineCfg {
			cancel_check_lines: self.scheduler.cancel_check_lines,
			..self.engine.clone()
		}
		.normalized()
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.scheduler.max_concurrency == 0 {
			return Err(ConfigError::Invalid {
				key: "scheduler.max_concurrency",
				reason: "must be at least 1".into(),
			});
		}
		if self.engine.max_nesting == 0 {
			return Err(ConfigError::Invalid {
				key: "engine.max_nesting",
				reason: "must be at least 1".into(),
			});
		}
		Ok(())
	}
}
