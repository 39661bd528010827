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

//! Logger installation on top of `env_logger`.

use env_logger::{Builder, Env};
use serde::{Deserialize, Serialize};

/// How the process-wide logger is set up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set, e.g. `"info"` or `"strata_control=debug"`.
    pub default_filter: String,
    /// Extra per-module levels applied on top, as `(module, level)`.
    pub module_levels: Vec<(String, String)>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            module_levels: Vec::new(),
        }
    }
}

/// Installs `env_logger` as the global logger.
///
/// `RUST_LOG` wins over [`LogConfig::default_filter`]. Calling this more than
/// once is harmless: later calls leave the first logger in place.
///
/// ## Returns
/// `true` if this call installed the logger.
pub fn init_logging(config: &LogConfig) -> bool {
    let mut builder = Builder::from_env(Env::default().default_filter_or(&config.default_filter));
    for (module, level) in &config.module_levels {
        match level.parse::<log::LevelFilter>() {
            Ok(filter) => {
                builder.filter_module(module, filter);
            }
            Err(_) => eprintln!("Ignoring invalid log level '{level}' for module '{module}'."),
        }
    }

    let installed = builder.try_init().is_ok();
    if installed {
        log::debug!("Logger initialized with default filter '{}'.", config.default_filter);
    }
    installed
}
