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

//! TileJSON manifest fields and tile URL templating.

use serde::{Deserialize, Serialize};

use crate::geo::GeoBounds;
use crate::request::FetchError;
use crate::tile::TileCoordinate;

pub const DEFAULT_MINZOOM: u8 = 0;
pub const DEFAULT_MAXZOOM: u8 = 22;
pub const DEFAULT_RASTER_TILE_SIZE: u32 = 512;

/// Row numbering of the tile grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Row 0 at the north edge.
    #[default]
    Xyz,
    /// Row 0 at the south edge.
    Tms,
}

/// Manifest fields consumed from a TileJSON document.
///
/// Every field is optional so a manifest can be layered over inline options
/// with [`TileJson::overlay`]. Bounds are clamped on parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<GeoBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_size: Option<u32>,
}

impl TileJson {
    /// Parse a fetched manifest document.
    pub fn from_json(value: serde_json::Value) -> Result<Self, FetchError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Fields present in `over` replace the ones in `self`.
    #[must_use]
    pub fn overlay(self, over: TileJson) -> TileJson {
        TileJson {
            tiles: over.tiles.or(self.tiles),
            minzoom: over.minzoom.or(self.minzoom),
            maxzoom: over.maxzoom.or(self.maxzoom),
            attribution: over.attribution.or(self.attribution),
            bounds: over.bounds.or(self.bounds),
            scheme: over.scheme.or(self.scheme),
            tile_size: over.tile_size.or(self.tile_size),
        }
    }
}

/// Substitute a tile address into a URL template.
///
/// Supports `{z}`, `{x}`, `{y}`, `{quadkey}` and `{prefix}` (the last hex
/// digit of x followed by that of y). Under [`Scheme::Tms`] the row is flipped.
/// Coordinates deeper than [`MAX_ZOOM`](crate::tile::MAX_ZOOM) are addressed
/// by their ancestor there.
#[must_use]
pub fn expand_template(template: &str, coord: &TileCoordinate, scheme: Scheme) -> String {
    let coord = coord.capped();
    let y = match scheme {
        Scheme::Xyz => i64::from(coord.y),
        Scheme::Tms => (coord.grid_dim() - 1 - i64::from(coord.y)).max(0),
    };
    let prefix = format!("{:x}{:x}", coord.x % 16, coord.y % 16);

    let url = template
        .replace("{prefix}", &prefix)
        .replace("{z}", &coord.zoom.to_string())
        .replace("{x}", &coord.x.to_string())
        .replace("{y}", &y.to_string());

    if url.contains("{quadkey}") {
        url.replace("{quadkey}", &coord.quadkey())
    } else {
        url
    }
}

/// Pick a template for `coord`, spreading neighbouring tiles across hosts.
#[must_use]
pub fn select_template<'a>(templates: &'a [String], coord: &TileCoordinate) -> Option<&'a str> {
    if templates.is_empty() {
        return None;
    }
    let index = (u64::from(coord.x) + u64::from(coord.y)) % templates.len() as u64;
    templates
        .get(usize::try_from(index).unwrap_or(0))
        .map(String::as_str)
}
