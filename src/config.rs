// Copyright 2025 Chris Custine
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

//! Application configuration management.
//!
//! Configuration is stored in TOML format via confy, either at the platform
//! default location or at an explicit path given on the command line.

use std::path::{Path, PathBuf};

use map_resources::SourceOptions;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "mapview";
const CONFIG_NAME: &str = "config";

/// Default sprite atlas base URL (no extension, no `@2x`)
pub const DEFAULT_SPRITE_URL: &str = "https://demotiles.maplibre.org/styles/osm-bright-gl-style/sprite";

/// Default raster tile template
pub const DEFAULT_TILE_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Sprite atlas base URL
    #[serde(default = "default_sprite_url")]
    pub sprite_url: String,

    /// Display pixel ratio; above 1.0 selects the @2x atlas
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f64,

    /// Bearer token attached to tile requests only
    #[serde(default)]
    pub access_token: Option<String>,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Raster source: inline TileJSON fields and/or a manifest URL
    #[serde(default = "default_source")]
    pub source: SourceOptions,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_sprite_url() -> String {
    DEFAULT_SPRITE_URL.to_string()
}

fn default_pixel_ratio() -> f64 {
    1.0
}

fn default_source() -> SourceOptions {
    SourceOptions::from_template(DEFAULT_TILE_TEMPLATE)
}

fn default_user_agent() -> String {
    format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            sprite_url: default_sprite_url(),
            pixel_ratio: default_pixel_ratio(),
            access_token: None,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            source: default_source(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Load configuration from an explicit file path
    pub fn load_from(path: &Path) -> Result<Self, confy::ConfyError> {
        confy::load_path(path)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Access token with surrounding whitespace removed; empty counts as unset
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}
