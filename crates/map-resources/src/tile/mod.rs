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

//! Tile addressing and bounds filtering.
//!
//! A [`TileCoordinate`] addresses one cell of the web-mercator quad tree.
//! [`TileRange`] is the bounds filter: it turns a [`GeoBounds`](crate::geo::GeoBounds)
//! into the inclusive block of tiles covering it at one zoom level and
//! answers membership, including ranges that wrap across the antimeridian.

mod range;

pub use range::{compute_tile_range, is_in_range, TileRange};

use std::fmt;

/// Highest zoom level the tile grid supports (x and y stay within `u32`).
pub const MAX_ZOOM: u8 = 30;

/// Integer (zoom, x, y) tile address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoordinate {
    #[must_use]
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Build a coordinate from an unwrapped column.
    ///
    /// Renderers draw copies of the world side by side, so a column may lie
    /// outside `[0, 2^zoom)`. The column is folded back onto the canonical
    /// world so copies compare equal. The row is clamped to the grid.
    #[must_use]
    pub fn wrapping(zoom: u8, x: i64, y: i64) -> Self {
        let zoom = zoom.min(MAX_ZOOM);
        let dim = grid_dim(zoom);
        let x = x.rem_euclid(dim);
        let y = y.clamp(0, dim - 1);
        Self {
            zoom,
            x: u32::try_from(x).unwrap_or(u32::MAX),
            y: u32::try_from(y).unwrap_or(u32::MAX),
        }
    }

    /// Number of tiles along each axis at this coordinate's zoom.
    #[must_use]
    pub fn grid_dim(&self) -> i64 {
        grid_dim(self.zoom)
    }

    /// Whether x and y lie inside the grid for this zoom.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.zoom <= MAX_ZOOM
            && i64::from(self.x) < self.grid_dim()
            && i64::from(self.y) < self.grid_dim()
    }

    /// Reproject this coordinate to another zoom with an integer shift.
    ///
    /// Zooming out yields the ancestor tile containing this one; zooming in
    /// yields the north-west descendant. The target zoom is capped at
    /// [`MAX_ZOOM`].
    #[must_use]
    pub fn scaled_to(&self, zoom: u8) -> Self {
        let zoom = zoom.min(MAX_ZOOM);
        if zoom >= self.zoom {
            let shift = u32::from(zoom - self.zoom);
            Self::new(zoom, self.x << shift, self.y << shift)
        } else {
            let shift = u32::from(self.zoom - zoom);
            Self::new(
                zoom,
                self.x.checked_shr(shift).unwrap_or(0),
                self.y.checked_shr(shift).unwrap_or(0),
            )
        }
    }

    /// This coordinate, or its ancestor at [`MAX_ZOOM`] when it lies deeper.
    #[must_use]
    pub fn capped(&self) -> Self {
        if self.zoom > MAX_ZOOM {
            self.scaled_to(MAX_ZOOM)
        } else {
            *self
        }
    }

    /// Whether `self` is `other` or one of its descendants.
    #[must_use]
    pub fn is_within(&self, other: &Self) -> bool {
        self.zoom >= other.zoom && self.scaled_to(other.zoom) == *other
    }

    /// Bing-style quadkey for this tile. Empty at zoom 0.
    ///
    /// Tiles deeper than [`MAX_ZOOM`] use the key of their ancestor there.
    #[must_use]
    pub fn quadkey(&self) -> String {
        let tile = self.capped();
        (1..=tile.zoom)
            .rev()
            .map(|level| {
                let mask = 1u32 << (level - 1);
                let mut digit = b'0';
                if tile.x & mask != 0 {
                    digit += 1;
                }
                if tile.y & mask != 0 {
                    digit += 2;
                }
                char::from(digit)
            })
            .collect()
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

fn grid_dim(zoom: u8) -> i64 {
    1_i64 << zoom.min(MAX_ZOOM)
}
