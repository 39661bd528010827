// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The configuration of a whole strata instance, stored as RON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strata_control::ControlConfig;
use strata_core::{DisplayConfig, FrameTimerLimits};
use strata_infra::LoopConfig;
use strata_telemetry::LogConfig;
use thiserror::Error;

/// Errors while reading or writing a [`StrataConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        /// The file concerned.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// The text is not a valid configuration.
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The configuration could not be written out.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Every tunable of a strata instance. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    /// Logger setup.
    pub log: LogConfig,
    /// Reconciler behaviour.
    pub control: ControlConfig,
    /// How the renderer schedule is driven.
    pub renderer_loop: LoopConfig,
    /// Initial per-frame budgets of the renderer.
    pub frame_timer_limits: FrameTimerLimits,
    /// Settings of the display opened by [`Strata::open_display`](crate::Strata::open_display).
    pub display: DisplayConfig,
    /// Seconds between two statistics summaries in the log.
    pub statistics_interval_secs: u64,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            control: ControlConfig::default(),
            renderer_loop: LoopConfig::default(),
            frame_timer_limits: FrameTimerLimits::default(),
            display: DisplayConfig::default(),
            statistics_interval_secs: 10,
        }
    }
}

impl StrataConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads a configuration from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Writes the configuration as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty_config)?)
    }
}
