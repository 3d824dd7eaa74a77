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

//! Raster tile sources.
//!
//! A [`RasterTileSource`] is configured either inline (tile URL templates,
//! zoom range, bounds) or with the URL of a TileJSON manifest. Once loaded it
//! answers which tiles exist and resolves the request for each one through
//! the request-transform hook.

mod tilejson;

pub use tilejson::{
    expand_template, select_template, Scheme, TileJson, DEFAULT_MAXZOOM, DEFAULT_MINZOOM,
    DEFAULT_RASTER_TILE_SIZE,
};

use std::sync::Arc;

use image::RgbaImage;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::event::{DataType, EventSender, MapEvent};
use crate::geo::GeoBounds;
use crate::request::{
    resolve_request, FetchError, Request, ResourceKind, SharedFetcher, SharedTransform,
};
use crate::tile::{compute_tile_range, is_in_range, TileCoordinate};

/// Source configuration: inline TileJSON fields, optionally a manifest URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOptions {
    /// Manifest to fetch. Its fields take precedence over the inline ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub tilejson: TileJson,
}

impl SourceOptions {
    /// Options pointing at a remote manifest.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            tilejson: TileJson::default(),
        }
    }

    /// Inline options with a single tile URL template.
    #[must_use]
    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            url: None,
            tilejson: TileJson {
                tiles: Some(vec![template.into()]),
                ..TileJson::default()
            },
        }
    }
}

/// Lifecycle of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Uninitialized,
    LoadingManifest,
    Ready,
}

/// Errors from [`RasterTileSource::load_tile`].
#[derive(Debug, Error)]
pub enum TileLoadError {
    #[error("source '{0}' has no tile URL template")]
    NoTemplate(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Raster tile source with bounds-restricted availability.
pub struct RasterTileSource {
    id: String,
    options: SourceOptions,
    fetcher: SharedFetcher,
    transform: Option<SharedTransform>,
    state: SourceState,
    tiles: Vec<String>,
    minzoom: u8,
    maxzoom: u8,
    attribution: Option<String>,
    scheme: Scheme,
    tile_size: u32,
    bounds: Option<GeoBounds>,
    events: EventSender,
}

impl std::fmt::Debug for RasterTileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterTileSource")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("tiles", &self.tiles)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl RasterTileSource {
    /// Create a source. Nothing is fetched until [`load`](Self::load).
    ///
    /// Bounds given inline apply immediately.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        options: SourceOptions,
        fetcher: SharedFetcher,
        transform: Option<SharedTransform>,
    ) -> Self {
        let bounds = options.tilejson.bounds;
        Self {
            id: id.into(),
            options,
            fetcher,
            transform,
            state: SourceState::Uninitialized,
            tiles: Vec::new(),
            minzoom: DEFAULT_MINZOOM,
            maxzoom: DEFAULT_MAXZOOM,
            attribution: None,
            scheme: Scheme::Xyz,
            tile_size: DEFAULT_RASTER_TILE_SIZE,
            bounds,
            events: EventSender::default(),
        }
    }

    /// Resolve the source's metadata.
    ///
    /// With a manifest URL the manifest is fetched (as a
    /// [`ResourceKind::Source`] request) and layered over the inline options.
    /// On failure an error event is published and the source stays unloaded;
    /// calling `load` again retries.
    pub async fn load(&mut self) -> Result<(), Arc<FetchError>> {
        let tilejson = match self.options.url.clone() {
            Some(url) => {
                self.state = SourceState::LoadingManifest;
                let request = resolve_request(self.transform.as_deref(), &url, ResourceKind::Source);
                let manifest = self
                    .fetcher
                    .get_json(request)
                    .await
                    .and_then(TileJson::from_json);

                match manifest {
                    Ok(manifest) => self.options.tilejson.clone().overlay(manifest),
                    Err(e) => {
                        warn!("Source '{}': manifest {} failed: {}", self.id, url, e);
                        self.state = SourceState::Uninitialized;
                        let error = Arc::new(e);
                        self.events.error(Arc::clone(&error));
                        return Err(error);
                    }
                }
            }
            None => self.options.tilejson.clone(),
        };

        self.apply(tilejson);
        self.state = SourceState::Ready;
        info!(
            "Source '{}' ready: {} template(s), zoom {}-{}",
            self.id,
            self.tiles.len(),
            self.minzoom,
            self.maxzoom
        );
        self.events.data(DataType::Metadata);
        Ok(())
    }

    fn apply(&mut self, tilejson: TileJson) {
        self.tiles = tilejson.tiles.unwrap_or_default();
        self.minzoom = tilejson.minzoom.unwrap_or(DEFAULT_MINZOOM);
        self.maxzoom = tilejson.maxzoom.unwrap_or(DEFAULT_MAXZOOM);
        self.attribution = tilejson.attribution;
        self.scheme = tilejson.scheme.unwrap_or_default();
        self.tile_size = tilejson.tile_size.unwrap_or(DEFAULT_RASTER_TILE_SIZE);
        if let Some(bounds) = tilejson.bounds {
            self.bounds = Some(bounds);
        }
    }

    /// Restrict availability to `[west, south, east, north]`.
    ///
    /// Out-of-range values are clamped to the nearest valid rectangle.
    pub fn set_bounds(&mut self, raw: [f64; 4]) {
        self.bounds = Some(GeoBounds::from_raw(raw));
    }

    /// Remove any bounds restriction.
    pub fn clear_bounds(&mut self) {
        self.bounds = None;
    }

    #[must_use]
    pub fn bounds(&self) -> Option<&GeoBounds> {
        self.bounds.as_ref()
    }

    /// Whether `coord` lies inside the source bounds. Without bounds every
    /// tile exists.
    #[must_use]
    pub fn has_tile(&self, coord: &TileCoordinate) -> bool {
        match &self.bounds {
            Some(bounds) => is_in_range(coord, &compute_tile_range(bounds, coord.zoom)),
            None => true,
        }
    }

    /// Templated URL for `coord`, before the transform hook.
    #[must_use]
    pub fn tile_url(&self, coord: &TileCoordinate) -> Option<String> {
        select_template(&self.tiles, coord)
            .map(|template| expand_template(template, coord, self.scheme))
    }

    /// Fully resolved request for `coord`, passed through the transform hook.
    #[must_use]
    pub fn tile_request(&self, coord: &TileCoordinate) -> Option<Request> {
        self.tile_url(coord)
            .map(|url| resolve_request(self.transform.as_deref(), &url, ResourceKind::Tile))
    }

    /// Fetch the image for `coord`.
    pub async fn load_tile(&self, coord: &TileCoordinate) -> Result<RgbaImage, TileLoadError> {
        let request = self
            .tile_request(coord)
            .ok_or_else(|| TileLoadError::NoTemplate(self.id.clone()))?;
        Ok(self.fetcher.get_image(request).await?)
    }

    #[must_use]
    pub fn loaded(&self) -> bool {
        self.state == SourceState::Ready
    }

    #[must_use]
    pub fn state(&self) -> SourceState {
        self.state
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn tiles(&self) -> &[String] {
        &self.tiles
    }

    #[must_use]
    pub fn minzoom(&self) -> u8 {
        self.minzoom
    }

    #[must_use]
    pub fn maxzoom(&self) -> u8 {
        self.maxzoom
    }

    #[must_use]
    pub fn attribution(&self) -> Option<&str> {
        self.attribution.as_deref()
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Subscribe to `data` / `error` events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.events.subscribe()
    }
}
