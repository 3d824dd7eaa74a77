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

//! Map resource loading for interactive map renderers.
//!
//! This library covers two resource types a renderer needs before it can
//! draw anything:
//!
//! - **Sprite atlas**: icon metadata (JSON) and the packed icon image, fetched
//!   concurrently and exposed only once both have arrived. A change of display
//!   density swaps in the `@2x` variant without tearing.
//! - **Raster tile source**: URL templating, TileJSON manifest resolution and
//!   a geographic bounds filter that handles rectangles crossing the
//!   antimeridian.
//!
//! Networking is left to the embedding application through the [`Fetcher`]
//! trait, and every outgoing URL passes through an optional
//! [`RequestTransform`] hook.
//!
//! # Sprite Atlas
//!
//! ```no_run
//! use map_resources::{SharedFetcher, SpriteAtlas};
//!
//! async fn show_icon(fetcher: SharedFetcher) {
//!     let mut atlas = SpriteAtlas::new("https://example.com/sprite", 2.0, fetcher, None);
//!
//!     while !atlas.loaded() && atlas.process_next().await {}
//!
//!     println!("{:?}", atlas.sprite_position("airport-15"));
//! }
//! ```
//!
//! # Tile Availability
//!
//! ```
//! use map_resources::geo::GeoBounds;
//! use map_resources::tile::{compute_tile_range, is_in_range, TileCoordinate};
//!
//! let bounds = GeoBounds::from_raw([-47.0, -7.0, -45.0, -5.0]);
//! let range = compute_tile_range(&bounds, 8);
//!
//! assert!(is_in_range(&TileCoordinate::new(8, 95, 132), &range));
//! assert!(!is_in_range(&TileCoordinate::new(8, 96, 132), &range));
//! ```

pub mod event;
pub mod geo;
pub mod request;
pub mod source;
pub mod sprite;
pub mod tile;

#[cfg(test)]
mod testing;

pub use event::{DataType, EventSender, MapEvent};
pub use geo::{GeoBounds, LngLat};
pub use request::{
    resolve_request, BoxFuture, Credentials, FetchError, Fetcher, Request, RequestTransform,
    ResourceKind, SharedFetcher, SharedTransform,
};
pub use source::{RasterTileSource, Scheme, SourceOptions, SourceState, TileJson, TileLoadError};
pub use sprite::{SpriteAtlas, SpriteIndex, SpritePosition, SpriteSheet};
pub use tile::{TileCoordinate, TileRange, MAX_ZOOM};
