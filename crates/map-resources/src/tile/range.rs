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

use super::{grid_dim, TileCoordinate, MAX_ZOOM};
use crate::geo::{GeoBounds, WebMercator};

/// Inclusive block of tiles covering a [`GeoBounds`] at one zoom level.
///
/// Edges are signed so an empty axis can be represented as `max < min`.
/// When `wraps` is set the x axis covers `[min_x, dim)` and `[0, max_x]`
/// instead of `[min_x, max_x]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
    pub wraps: bool,
}

impl TileRange {
    /// Project `bounds` onto the tile grid at `zoom`.
    ///
    /// West and north edges are inclusive; a tile whose west edge lies exactly
    /// on the bounds' east edge (or whose north edge lies on the south edge)
    /// is outside. Zooms above [`MAX_ZOOM`] are computed at `MAX_ZOOM`.
    #[must_use]
    pub fn compute(bounds: &GeoBounds, zoom: u8) -> Self {
        let zoom = zoom.min(MAX_ZOOM);
        let dim = grid_dim(zoom);

        let west = WebMercator::lon_to_x(bounds.west(), zoom);
        let east = WebMercator::lon_to_x(bounds.east(), zoom);
        let north = WebMercator::lat_to_y(bounds.north(), zoom);
        let south = WebMercator::lat_to_y(bounds.south(), zoom);

        Self {
            zoom,
            min_x: lower_edge(west, dim),
            max_x: upper_edge(east, dim),
            min_y: lower_edge(north, dim),
            max_y: upper_edge(south, dim),
            wraps: west > east,
        }
    }

    /// Whether the range contains no tile at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        if self.min_y > self.max_y {
            return true;
        }
        if self.wraps {
            // Both halves empty: min_x sits past the last column and max_x
            // before the first.
            self.min_x >= grid_dim(self.zoom) && self.max_x < 0
        } else {
            self.min_x > self.max_x
        }
    }

    /// Membership test.
    ///
    /// A coordinate at another zoom is first reprojected to the range's zoom,
    /// so a descendant of a covered tile is covered too.
    #[must_use]
    pub fn contains(&self, coord: &TileCoordinate) -> bool {
        let coord = if coord.zoom == self.zoom {
            *coord
        } else {
            coord.scaled_to(self.zoom)
        };
        let x = i64::from(coord.x);
        let y = i64::from(coord.y);

        let in_x = if self.wraps {
            x >= self.min_x || x <= self.max_x
        } else {
            x >= self.min_x && x <= self.max_x
        };

        in_x && y >= self.min_y && y <= self.max_y
    }

    /// Number of tiles in the range.
    #[must_use]
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let dim = grid_dim(self.zoom);
        let columns = if self.wraps {
            (dim - self.min_x.min(dim)) + (self.max_x + 1).max(0)
        } else {
            self.max_x - self.min_x + 1
        };
        let rows = self.max_y - self.min_y + 1;
        u64::try_from(columns * rows).unwrap_or(0)
    }

    /// Every tile in the range, row by row from the north-west corner.
    pub fn iter(&self) -> impl Iterator<Item = TileCoordinate> + '_ {
        let dim = grid_dim(self.zoom);
        let rows = if self.is_empty() {
            1..=0
        } else {
            self.min_y..=self.max_y
        };

        rows.flat_map(move |y| {
            let (head, tail) = if self.wraps {
                (self.min_x..dim, 0..=self.max_x)
            } else {
                (self.min_x..self.max_x + 1, 1..=0)
            };
            head.chain(tail)
                .map(move |x| TileCoordinate::wrapping(self.zoom, x, y))
        })
    }
}

/// Inclusive tile range covering `bounds` at `zoom`.
#[must_use]
pub fn compute_tile_range(bounds: &GeoBounds, zoom: u8) -> TileRange {
    TileRange::compute(bounds, zoom)
}

/// Whether `coord` falls inside `range`, honouring antimeridian wrap.
#[must_use]
pub fn is_in_range(coord: &TileCoordinate, range: &TileRange) -> bool {
    range.contains(coord)
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "value is finite and already within [0, dim]"
)]
fn lower_edge(value: f64, dim: i64) -> i64 {
    (value.floor() as i64).clamp(0, dim)
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "value is finite and already within [0, dim]"
)]
fn upper_edge(value: f64, dim: i64) -> i64 {
    (value.ceil() as i64 - 1).clamp(-1, dim - 1)
}
