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

use std::f64::consts::PI;

/// Largest latitude representable in the square web-mercator world.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Web Mercator projection utilities.
///
/// All results are in tile-grid units at the requested zoom, i.e. in the
/// interval `[0, 2^zoom]`.
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Convert latitude to a Web Mercator Y coordinate in tile units.
    ///
    /// Latitudes beyond the mercator limit are pinned to the limit, so the
    /// poles map onto the top and bottom edges of the grid.
    #[must_use]
    pub fn lat_to_y(lat: f64, zoom: u8) -> f64 {
        let lat_rad = lat
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
            .to_radians();
        let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0;
        y * world_size(zoom)
    }

    /// Convert longitude to a Web Mercator X coordinate in tile units.
    #[must_use]
    pub fn lon_to_x(lon: f64, zoom: u8) -> f64 {
        ((lon + 180.0) / 360.0) * world_size(zoom)
    }

    /// Convert a tile-unit Y coordinate back to latitude.
    #[must_use]
    pub fn tile_to_lat(y: f64, zoom: u8) -> f64 {
        let n = world_size(zoom);
        let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();
        lat_rad.to_degrees()
    }

    /// Convert a tile-unit X coordinate back to longitude.
    #[must_use]
    pub fn tile_to_lon(x: f64, zoom: u8) -> f64 {
        x / world_size(zoom) * 360.0 - 180.0
    }
}

fn world_size(zoom: u8) -> f64 {
    2_f64.powi(i32::from(zoom))
}
