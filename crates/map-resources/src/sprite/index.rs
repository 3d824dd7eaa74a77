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

use std::collections::HashMap;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::request::FetchError;

/// Location of one icon inside the sprite atlas.
///
/// The default value (empty rectangle, pixel ratio 1, not SDF) is what lookups
/// return for unknown names or before the atlas has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpritePosition {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: u32,
    pub sdf: bool,
}

impl Default for SpritePosition {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            pixel_ratio: 1,
            sdf: false,
        }
    }
}

/// Name → position table parsed from the sprite JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SpriteIndex {
    positions: HashMap<String, SpritePosition>,
}

impl SpriteIndex {
    /// Parse the sprite metadata document.
    pub fn from_json(value: serde_json::Value) -> Result<Self, FetchError> {
        Ok(serde_json::from_value(value)?)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SpritePosition> {
        self.positions.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }
}

impl FromIterator<(String, SpritePosition)> for SpriteIndex {
    fn from_iter<T: IntoIterator<Item = (String, SpritePosition)>>(iter: T) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

/// Decoded atlas image.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pixels: RgbaImage,
}

impl SpriteSheet {
    #[must_use]
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}
