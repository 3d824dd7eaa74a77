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

//! Geographic primitives.
//!
//! [`GeoBounds`] is the validated rectangle used to restrict tile
//! availability. It is built from raw `[west, south, east, north]` input and
//! never rejects a value: anything out of range is pulled to the nearest
//! valid edge.

mod mercator;

pub use mercator::{WebMercator, MAX_MERCATOR_LATITUDE};

use serde::{Deserialize, Serialize};

pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;
pub const MIN_LNG: f64 = -180.0;
pub const MAX_LNG: f64 = 180.0;

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    #[must_use]
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Geographic rectangle with clamped corners.
///
/// Latitudes are kept in `[-90, 90]` and longitudes in `[-180, 180]`. A west
/// edge greater than the east edge is kept as is: it describes a rectangle
/// that crosses the antimeridian.
///
/// Serializes as the `[west, south, east, north]` array used by TileJSON, and
/// deserializing goes through the same clamping as [`GeoBounds::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct GeoBounds {
    sw: LngLat,
    ne: LngLat,
}

impl GeoBounds {
    /// Bounds covering the whole world.
    pub const WORLD: Self = Self {
        sw: LngLat {
            lng: MIN_LNG,
            lat: MIN_LAT,
        },
        ne: LngLat {
            lng: MAX_LNG,
            lat: MAX_LAT,
        },
    };

    /// Build bounds from `[west, south, east, north]`.
    ///
    /// Out-of-range values are clamped, NaN edges open up to the world edge on
    /// that side, and an inverted south/north pair is swapped.
    #[must_use]
    pub fn from_raw(raw: [f64; 4]) -> Self {
        let [west, south, east, north] = raw;
        let west = clamp_or(west, MIN_LNG, MAX_LNG, MIN_LNG);
        let east = clamp_or(east, MIN_LNG, MAX_LNG, MAX_LNG);
        let mut south = clamp_or(south, MIN_LAT, MAX_LAT, MIN_LAT);
        let mut north = clamp_or(north, MIN_LAT, MAX_LAT, MAX_LAT);

        if south > north {
            std::mem::swap(&mut south, &mut north);
        }

        Self {
            sw: LngLat::new(west, south),
            ne: LngLat::new(east, north),
        }
    }

    /// Build bounds from south-west and north-east corners.
    #[must_use]
    pub fn new(sw: LngLat, ne: LngLat) -> Self {
        Self::from_raw([sw.lng, sw.lat, ne.lng, ne.lat])
    }

    #[must_use]
    pub fn south_west(&self) -> LngLat {
        self.sw
    }

    #[must_use]
    pub fn north_east(&self) -> LngLat {
        self.ne
    }

    #[must_use]
    pub fn west(&self) -> f64 {
        self.sw.lng
    }

    #[must_use]
    pub fn south(&self) -> f64 {
        self.sw.lat
    }

    #[must_use]
    pub fn east(&self) -> f64 {
        self.ne.lng
    }

    #[must_use]
    pub fn north(&self) -> f64 {
        self.ne.lat
    }

    /// Whether the rectangle runs east across the ±180° seam.
    #[must_use]
    pub fn crosses_antimeridian(&self) -> bool {
        self.west() > self.east()
    }

    /// The `[west, south, east, north]` array form.
    #[must_use]
    pub fn to_array(&self) -> [f64; 4] {
        [self.west(), self.south(), self.east(), self.north()]
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::WORLD
    }
}

impl From<[f64; 4]> for GeoBounds {
    fn from(raw: [f64; 4]) -> Self {
        Self::from_raw(raw)
    }
}

impl From<GeoBounds> for [f64; 4] {
    fn from(bounds: GeoBounds) -> Self {
        bounds.to_array()
    }
}

fn clamp_or(value: f64, min: f64, max: f64, nan: f64) -> f64 {
    if value.is_nan() {
        nan
    } else {
        value.clamp(min, max)
    }
}
