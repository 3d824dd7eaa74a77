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

//! Two-resource load state for one sprite atlas generation.
//!
//! A [`SpriteLoader`] tracks the metadata document and the atlas image as two
//! independent slots. Completions arrive in any order; the loader reports
//! [`LoaderSignal::Data`] exactly once, when the second slot fills.

use std::sync::Arc;

use image::RgbaImage;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use super::index::{SpriteIndex, SpritePosition, SpriteSheet};
use crate::request::{resolve_request, FetchError, Request, RequestTransform, ResourceKind};

/// State of one fetched resource.
#[derive(Debug, Clone, Default)]
pub enum Slot<T> {
    /// No request issued yet.
    #[default]
    Empty,
    /// Request in flight.
    Loading,
    /// Payload received.
    Ready(T),
    /// The fetch failed; nothing further will arrive for this slot.
    Failed,
}

impl<T> Slot<T> {
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Whether the "data ready" transition has happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    NotReady,
    Ready,
}

/// Identity of one load operation.
///
/// Invalidating the handle cancels its outstanding fetches and makes any
/// completion that still arrives a no-op.
#[derive(Debug, Clone)]
pub struct LoadHandle {
    id: u64,
    token: CancellationToken,
}

impl LoadHandle {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            token: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn invalidate(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// What the owner should publish after a completion.
#[derive(Debug, Clone)]
pub enum LoaderSignal {
    /// Both slots are now filled. Emitted once per loader.
    Data,
    /// One fetch failed.
    Error(Arc<FetchError>),
}

/// Build the URL of a sprite resource: `base` + optional `@2x` + `ext`,
/// keeping any query string at the end.
#[must_use]
pub fn sprite_url(base: &str, retina: bool, ext: &str) -> String {
    let format = if retina { "@2x" } else { "" };
    match base.split_once('?') {
        Some((path, query)) => format!("{path}{format}{ext}?{query}"),
        None => format!("{base}{format}{ext}"),
    }
}

/// Metadata + image load state for one atlas generation.
#[derive(Debug)]
pub struct SpriteLoader {
    handle: LoadHandle,
    retina: bool,
    metadata: Slot<SpriteIndex>,
    sheet: Slot<SpriteSheet>,
    readiness: Readiness,
}

impl SpriteLoader {
    #[must_use]
    pub fn new(handle: LoadHandle, retina: bool) -> Self {
        Self {
            handle,
            retina,
            metadata: Slot::Empty,
            sheet: Slot::Empty,
            readiness: Readiness::NotReady,
        }
    }

    /// Mark both slots in flight and return the metadata and image requests,
    /// each passed through the transform hook.
    pub fn begin(
        &mut self,
        base: &str,
        transform: Option<&dyn RequestTransform>,
    ) -> (Request, Request) {
        self.metadata = Slot::Loading;
        self.sheet = Slot::Loading;

        let json = resolve_request(
            transform,
            &sprite_url(base, self.retina, ".json"),
            ResourceKind::SpriteJson,
        );
        let image = resolve_request(
            transform,
            &sprite_url(base, self.retina, ".png"),
            ResourceKind::SpriteImage,
        );
        (json, image)
    }

    /// Record the outcome of the metadata fetch.
    pub fn complete_metadata(
        &mut self,
        result: Result<SpriteIndex, FetchError>,
    ) -> Option<LoaderSignal> {
        if !self.accepts(self.metadata.is_loading(), "metadata") {
            return None;
        }
        match result {
            Ok(index) => {
                debug!("sprite load {}: metadata with {} icons", self.handle.id, index.len());
                self.metadata = Slot::Ready(index);
                self.settle()
            }
            Err(e) => {
                warn!("sprite load {}: metadata fetch failed: {}", self.handle.id, e);
                self.metadata = Slot::Failed;
                Some(LoaderSignal::Error(Arc::new(e)))
            }
        }
    }

    /// Record the outcome of the image fetch.
    pub fn complete_image(&mut self, result: Result<RgbaImage, FetchError>) -> Option<LoaderSignal> {
        if !self.accepts(self.sheet.is_loading(), "image") {
            return None;
        }
        match result {
            Ok(pixels) => {
                debug!(
                    "sprite load {}: image {}x{}",
                    self.handle.id,
                    pixels.width(),
                    pixels.height()
                );
                self.sheet = Slot::Ready(SpriteSheet::new(pixels));
                self.settle()
            }
            Err(e) => {
                warn!("sprite load {}: image fetch failed: {}", self.handle.id, e);
                self.sheet = Slot::Failed;
                Some(LoaderSignal::Error(Arc::new(e)))
            }
        }
    }

    fn accepts(&self, loading: bool, what: &str) -> bool {
        if !self.handle.is_valid() {
            debug!("sprite load {}: ignoring {} after invalidation", self.handle.id, what);
            return false;
        }
        if !loading {
            debug!("sprite load {}: ignoring unexpected {} completion", self.handle.id, what);
            return false;
        }
        true
    }

    fn settle(&mut self) -> Option<LoaderSignal> {
        if self.readiness == Readiness::NotReady && self.loaded() {
            self.readiness = Readiness::Ready;
            info!(
                "sprite load {} ready ({})",
                self.handle.id,
                if self.retina { "@2x" } else { "@1x" }
            );
            return Some(LoaderSignal::Data);
        }
        None
    }

    /// True once both metadata and image are present.
    #[must_use]
    pub fn loaded(&self) -> bool {
        self.metadata.is_ready() && self.sheet.is_ready()
    }

    /// True while either fetch is still outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.metadata.is_loading() || self.sheet.is_loading()
    }

    /// True if either fetch failed, so this loader can never become ready.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.metadata.is_failed() || self.sheet.is_failed()
    }

    /// Look up an icon, falling back to the empty position.
    #[must_use]
    pub fn position(&self, name: &str) -> SpritePosition {
        match (self.metadata.ready(), self.sheet.is_ready()) {
            (Some(index), true) => index.get(name).copied().unwrap_or_default(),
            _ => SpritePosition::default(),
        }
    }

    #[must_use]
    pub fn handle(&self) -> &LoadHandle {
        &self.handle
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.handle.id
    }

    #[must_use]
    pub fn is_retina(&self) -> bool {
        self.retina
    }

    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    #[must_use]
    pub fn index(&self) -> Option<&SpriteIndex> {
        self.metadata.ready()
    }

    #[must_use]
    pub fn sheet(&self) -> Option<&SpriteSheet> {
        self.sheet.ready()
    }

    #[must_use]
    pub fn width(&self) -> Option<u32> {
        self.sheet.ready().map(SpriteSheet::width)
    }
}
