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

//! Sprite atlas loading and icon lookup.
//!
//! [`SpriteAtlas`] fetches `<base>.json` and `<base>.png` (or the `@2x`
//! variants on high-density displays) concurrently. Fetches run on spawned
//! tasks, but their results are only applied when the owner drains them with
//! [`SpriteAtlas::process_next`] or [`SpriteAtlas::drain_completions`], so all
//! state changes happen on the owner's side.
//!
//! A change of display density starts a second load. Its results replace the
//! current atlas in one step once both of its resources have arrived; the
//! previous generation is invalidated and anything it still delivers is
//! dropped.

mod index;
mod loader;

pub use index::{SpriteIndex, SpritePosition, SpriteSheet};
pub use loader::{sprite_url, LoadHandle, LoaderSignal, Readiness, Slot, SpriteLoader};

use std::future::Future;

use image::RgbaImage;
use log::{debug, info};
use serde::{Serialize, Serializer};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::event::{DataType, EventSender, MapEvent};
use crate::request::{FetchError, SharedFetcher, SharedTransform};

/// Result of one sprite fetch, tagged with the load that issued it.
#[derive(Debug)]
struct Completion {
    loader: u64,
    payload: Payload,
}

#[derive(Debug)]
enum Payload {
    Metadata(Result<SpriteIndex, FetchError>),
    Image(Result<RgbaImage, FetchError>),
}

/// Whether a display with this device pixel ratio uses the `@2x` atlas.
#[must_use]
pub fn is_retina(pixel_ratio: f64) -> bool {
    pixel_ratio > 1.0
}

/// Sprite atlas for one style.
pub struct SpriteAtlas {
    base: String,
    fetcher: SharedFetcher,
    transform: Option<SharedTransform>,
    active: SpriteLoader,
    pending: Option<SpriteLoader>,
    next_id: u64,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    events: EventSender,
}

impl std::fmt::Debug for SpriteAtlas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpriteAtlas")
            .field("base", &self.base)
            .field("active", &self.active.id())
            .field("retina", &self.active.is_retina())
            .field("loaded", &self.active.loaded())
            .field("pending", &self.pending.as_ref().map(SpriteLoader::id))
            .finish_non_exhaustive()
    }
}

impl SpriteAtlas {
    /// Start loading the atlas at `base` for a display with `pixel_ratio`.
    ///
    /// Must be called from within a Tokio runtime: both fetches are spawned
    /// immediately.
    #[must_use]
    pub fn new(
        base: impl Into<String>,
        pixel_ratio: f64,
        fetcher: SharedFetcher,
        transform: Option<SharedTransform>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let placeholder = SpriteLoader::new(LoadHandle::new(0), is_retina(pixel_ratio));

        let mut atlas = Self {
            base: base.into(),
            fetcher,
            transform,
            active: placeholder,
            pending: None,
            next_id: 1,
            completion_tx,
            completion_rx,
            events: EventSender::default(),
        };
        atlas.active = atlas.start(is_retina(pixel_ratio));
        atlas
    }

    /// Issue both fetches for a new load generation.
    fn start(&mut self, retina: bool) -> SpriteLoader {
        let id = self.next_id;
        self.next_id += 1;

        let mut loader = SpriteLoader::new(LoadHandle::new(id), retina);
        let (json_request, image_request) = loader.begin(&self.base, self.transform.as_deref());
        info!("Loading sprite {} (load {})", json_request.url, id);

        let json = self.fetcher.get_json(json_request);
        self.spawn_completion(id, loader.handle().token(), async move {
            Payload::Metadata(json.await.and_then(SpriteIndex::from_json))
        });

        let image = self.fetcher.get_image(image_request);
        self.spawn_completion(id, loader.handle().token(), async move {
            Payload::Image(image.await)
        });

        loader
    }

    fn spawn_completion<F>(&self, loader: u64, token: CancellationToken, fetch: F)
    where
        F: Future<Output = Payload> + Send + 'static,
    {
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!("sprite load {} superseded, dropping fetch", loader);
                }
                payload = fetch => {
                    let _ = tx.send(Completion { loader, payload });
                }
            }
        });
    }

    /// React to a change of display density.
    ///
    /// When the density class (standard vs `@2x`) differs from the loaded
    /// atlas, a new load is started; it replaces the current atlas only once
    /// it has fully arrived. Returns `true` if a new load was started.
    pub fn resize(&mut self, pixel_ratio: f64) -> bool {
        let retina = is_retina(pixel_ratio);

        if self.active.is_retina() == retina {
            if let Some(stale) = self.pending.take() {
                debug!("density restored, abandoning sprite load {}", stale.id());
                stale.handle().invalidate();
            }
            return false;
        }

        if let Some(pending) = &self.pending {
            if pending.is_retina() == retina && !pending.has_failed() {
                return false;
            }
        }

        if let Some(stale) = self.pending.take() {
            stale.handle().invalidate();
        }
        let loader = self.start(retina);
        self.pending = Some(loader);
        true
    }

    /// Wait for the next fetch completion and apply it.
    ///
    /// Returns `false` without waiting when no fetch of the active or pending
    /// load is outstanding, so a loop driving a failed atlas terminates.
    pub async fn process_next(&mut self) -> bool {
        if !self.is_loading() {
            return false;
        }
        match self.completion_rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Apply every completion that has already arrived without waiting.
    ///
    /// Returns how many of them belonged to a live load.
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Route a completion to the load that issued it.
    ///
    /// Completions from a load that is neither active nor pending come from a
    /// superseded generation and are dropped.
    fn apply(&mut self, completion: Completion) -> bool {
        let Completion { loader, payload } = completion;

        if loader == self.active.id() {
            if let Some(signal) = complete(&mut self.active, payload) {
                self.publish(signal);
            }
            return true;
        }

        let Some(pending) = self.pending.as_mut().filter(|p| p.id() == loader) else {
            debug!("discarding completion from superseded sprite load {}", loader);
            return false;
        };

        match complete(pending, payload) {
            Some(LoaderSignal::Data) => self.promote_pending(),
            Some(signal) => self.publish(signal),
            None => {}
        }
        true
    }

    /// Swap the fully loaded pending generation in as the active atlas.
    fn promote_pending(&mut self) {
        let Some(fresh) = self.pending.take() else {
            return;
        };
        let previous = std::mem::replace(&mut self.active, fresh);
        previous.handle().invalidate();
        info!(
            "Sprite atlas replaced by load {} ({})",
            self.active.id(),
            if self.active.is_retina() { "@2x" } else { "@1x" }
        );
        self.events.data(DataType::Style);
    }

    fn publish(&self, signal: LoaderSignal) {
        match signal {
            LoaderSignal::Data => self.events.data(DataType::Style),
            LoaderSignal::Error(error) => self.events.error(error),
        }
    }

    /// True once both metadata and image of the active atlas are present.
    #[must_use]
    pub fn loaded(&self) -> bool {
        self.active.loaded()
    }

    /// True while any fetch of the active or pending load is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.active.is_loading() || self.pending.as_ref().is_some_and(SpriteLoader::is_loading)
    }

    /// Position of icon `name`, or the empty position if unknown or not loaded.
    #[must_use]
    pub fn sprite_position(&self, name: &str) -> SpritePosition {
        self.active.position(name)
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Whether the active atlas is the `@2x` variant.
    #[must_use]
    pub fn is_retina(&self) -> bool {
        self.active.is_retina()
    }

    /// Pixel width of the active atlas image, once it has arrived.
    #[must_use]
    pub fn width(&self) -> Option<u32> {
        self.active.width()
    }

    #[must_use]
    pub fn image(&self) -> Option<&SpriteSheet> {
        self.active.sheet()
    }

    #[must_use]
    pub fn index(&self) -> Option<&SpriteIndex> {
        self.active.index()
    }

    /// Subscribe to `data` / `error` events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.events.subscribe()
    }
}

impl Serialize for SpriteAtlas {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.base)
    }
}

fn complete(loader: &mut SpriteLoader, payload: Payload) -> Option<LoaderSignal> {
    match payload {
        Payload::Metadata(result) => loader.complete_metadata(result),
        Payload::Image(result) => loader.complete_image(result),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::request::{Request, ResourceKind};
    use crate::testing::ScriptedFetcher;

    const BASE: &str = "http://example.com/sprite";

    fn metadata() -> serde_json::Value {
        json!({
            "airport": {"x": 0, "y": 0, "width": 24, "height": 24, "pixelRatio": 1},
            "heliport": {"x": 24, "y": 0, "width": 24, "height": 24, "pixelRatio": 1, "sdf": true}
        })
    }

    fn metadata_2x() -> serde_json::Value {
        json!({
            "airport": {"x": 0, "y": 0, "width": 48, "height": 48, "pixelRatio": 2}
        })
    }

    fn not_found(url: &str) -> FetchError {
        FetchError::Http {
            url: url.to_string(),
            status: 404,
        }
    }

    fn atlas(fetcher: &Arc<ScriptedFetcher>, pixel_ratio: f64) -> SpriteAtlas {
        SpriteAtlas::new(BASE, pixel_ratio, fetcher.clone(), None)
    }

    fn assert_no_event(events: &mut broadcast::Receiver<MapEvent>) {
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    fn assert_style_data(events: &mut broadcast::Receiver<MapEvent>) {
        assert!(matches!(
            events.try_recv(),
            Ok(MapEvent::Data {
                data_type: DataType::Style
            })
        ));
    }

    #[tokio::test]
    async fn test_issues_both_fetches() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let atlas = atlas(&fetcher, 1.0);

        assert_eq!(
            fetcher.urls(),
            vec!["http://example.com/sprite.json", "http://example.com/sprite.png"]
        );
        assert!(!atlas.loaded());
        assert!(atlas.is_loading());
        assert!(!atlas.is_retina());
    }

    #[tokio::test]
    async fn test_retina_uses_2x_resources() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let atlas = atlas(&fetcher, 2.0);

        assert!(atlas.is_retina());
        assert_eq!(
            fetcher.urls(),
            vec!["http://example.com/sprite@2x.json", "http://example.com/sprite@2x.png"]
        );
    }

    #[tokio::test]
    async fn test_transform_sees_sprite_kinds() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let transform: SharedTransform = Arc::new(|url: &str, kind: ResourceKind| {
            Request::new(format!("{url}#{kind}"))
        });
        let _atlas = SpriteAtlas::new(BASE, 1.0, fetcher.clone(), Some(transform));

        assert_eq!(
            fetcher.urls(),
            vec![
                "http://example.com/sprite.json#SpriteJSON",
                "http://example.com/sprite.png#SpriteImage"
            ]
        );
    }

    #[tokio::test]
    async fn test_metadata_first_fires_data_after_image() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        let mut events = atlas.subscribe();

        fetcher.resolve_json("http://example.com/sprite.json", Ok(metadata()));
        assert!(atlas.process_next().await);
        assert!(!atlas.loaded());
        assert_no_event(&mut events);

        fetcher.resolve_image("http://example.com/sprite.png", Ok(RgbaImage::new(64, 32)));
        assert!(atlas.process_next().await);
        assert!(atlas.loaded());
        assert_style_data(&mut events);
        assert_no_event(&mut events);
        assert_eq!(atlas.width(), Some(64));
    }

    #[tokio::test]
    async fn test_image_first_fires_data_after_metadata() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        let mut events = atlas.subscribe();

        fetcher.resolve_image("http://example.com/sprite.png", Ok(RgbaImage::new(64, 32)));
        atlas.process_next().await;
        assert!(!atlas.loaded());
        assert_no_event(&mut events);

        fetcher.resolve_json("http://example.com/sprite.json", Ok(metadata()));
        atlas.process_next().await;
        assert!(atlas.loaded());
        assert_style_data(&mut events);
        assert_no_event(&mut events);
    }

    #[tokio::test]
    async fn test_metadata_failure_emits_error_without_data() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        let mut events = atlas.subscribe();

        fetcher.resolve_json(
            "http://example.com/sprite.json",
            Err(not_found("http://example.com/sprite.json")),
        );
        atlas.process_next().await;
        assert!(matches!(events.try_recv(), Ok(MapEvent::Error { .. })));

        fetcher.resolve_image("http://example.com/sprite.png", Ok(RgbaImage::new(64, 32)));
        atlas.process_next().await;
        assert_no_event(&mut events);
        assert!(!atlas.loaded());
        assert_eq!(atlas.width(), Some(64));
        assert!(!atlas.is_loading());
    }

    #[tokio::test]
    async fn test_malformed_metadata_is_a_fetch_error() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        let mut events = atlas.subscribe();

        fetcher.resolve_json("http://example.com/sprite.json", Ok(json!("not a table")));
        atlas.process_next().await;

        match events.try_recv() {
            Ok(MapEvent::Error { error }) => assert!(matches!(*error, FetchError::Json(_))),
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sprite_position_sentinel_before_and_after_load() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);

        assert_eq!(atlas.sprite_position("airport"), SpritePosition::default());
        assert_eq!(atlas.sprite_position("x"), SpritePosition::default());

        fetcher.resolve_json("http://example.com/sprite.json", Ok(metadata()));
        atlas.process_next().await;
        // Metadata alone is not enough.
        assert_eq!(atlas.sprite_position("airport"), SpritePosition::default());

        fetcher.resolve_image("http://example.com/sprite.png", Ok(RgbaImage::new(64, 32)));
        atlas.process_next().await;

        let heliport = atlas.sprite_position("heliport");
        assert_eq!((heliport.x, heliport.width), (24, 24));
        assert!(heliport.sdf);

        let missing = atlas.sprite_position("missing");
        assert_eq!(missing, SpritePosition::default());
        assert_eq!(missing.pixel_ratio, 1);
        assert!(!missing.sdf);
    }

    async fn load_1x(fetcher: &Arc<ScriptedFetcher>, atlas: &mut SpriteAtlas) {
        fetcher.resolve_json("http://example.com/sprite.json", Ok(metadata()));
        fetcher.resolve_image("http://example.com/sprite.png", Ok(RgbaImage::new(64, 32)));
        atlas.process_next().await;
        atlas.process_next().await;
        assert!(atlas.loaded());
    }

    async fn load_2x(fetcher: &Arc<ScriptedFetcher>, atlas: &mut SpriteAtlas) {
        fetcher.resolve_json("http://example.com/sprite@2x.json", Ok(metadata_2x()));
        fetcher.resolve_image("http://example.com/sprite@2x.png", Ok(RgbaImage::new(128, 64)));
        atlas.process_next().await;
        atlas.process_next().await;
    }

    #[tokio::test]
    async fn test_resize_same_density_is_noop() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        load_1x(&fetcher, &mut atlas).await;

        assert!(!atlas.resize(1.0));
        assert!(!atlas.resize(0.5));
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_resize_replaces_state_only_when_new_load_is_ready() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        load_1x(&fetcher, &mut atlas).await;
        let mut events = atlas.subscribe();

        assert!(atlas.resize(2.0));
        assert!(!atlas.resize(2.0));
        assert_eq!(fetcher.requests().len(), 4);

        fetcher.resolve_json("http://example.com/sprite@2x.json", Ok(metadata_2x()));
        atlas.process_next().await;
        // Half-arrived generation leaves the old atlas untouched.
        assert!(!atlas.is_retina());
        assert_eq!(atlas.width(), Some(64));
        assert_eq!(atlas.sprite_position("airport").width, 24);
        assert_no_event(&mut events);

        fetcher.resolve_image("http://example.com/sprite@2x.png", Ok(RgbaImage::new(128, 64)));
        atlas.process_next().await;
        assert!(atlas.is_retina());
        assert_eq!(atlas.width(), Some(128));
        assert_eq!(atlas.sprite_position("airport").width, 48);
        assert_eq!(atlas.sprite_position("airport").pixel_ratio, 2);
        assert_eq!(atlas.sprite_position("heliport"), SpritePosition::default());
        assert_style_data(&mut events);
    }

    #[tokio::test]
    async fn test_superseded_load_cannot_corrupt_state() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);

        // Density changes before the first load has delivered anything.
        assert!(atlas.resize(2.0));
        load_2x(&fetcher, &mut atlas).await;
        assert!(atlas.loaded());
        assert!(atlas.is_retina());

        // The first generation resolves late.
        fetcher.resolve_json("http://example.com/sprite.json", Ok(metadata()));
        fetcher.resolve_image("http://example.com/sprite.png", Ok(RgbaImage::new(64, 32)));
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(atlas.drain_completions(), 0);

        assert!(atlas.is_retina());
        assert_eq!(atlas.width(), Some(128));
        assert_eq!(atlas.sprite_position("airport").width, 48);
        assert!(atlas.index().is_some_and(|index| index.get("heliport").is_none()));
    }

    #[tokio::test]
    async fn test_stale_completion_in_queue_is_discarded() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        let first = atlas.active.id();

        assert!(atlas.resize(2.0));
        load_2x(&fetcher, &mut atlas).await;

        // A completion from the first load that was already queued when the
        // swap happened.
        atlas
            .completion_tx
            .send(Completion {
                loader: first,
                payload: Payload::Image(Ok(RgbaImage::new(1, 1))),
            })
            .unwrap();
        assert_eq!(atlas.drain_completions(), 0);
        assert_eq!(atlas.width(), Some(128));
        assert!(atlas.is_retina());
    }

    async fn next_or_timeout(atlas: &mut SpriteAtlas) -> bool {
        tokio::time::timeout(Duration::from_millis(200), atlas.process_next())
            .await
            .expect("process_next blocked with nothing outstanding")
    }

    #[tokio::test]
    async fn test_image_failure_emits_error_and_stops_processing() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        let mut events = atlas.subscribe();

        fetcher.resolve_image(
            "http://example.com/sprite.png",
            Err(not_found("http://example.com/sprite.png")),
        );
        assert!(next_or_timeout(&mut atlas).await);
        match events.try_recv() {
            Ok(MapEvent::Error { error }) => {
                assert!(matches!(*error, FetchError::Http { status: 404, .. }));
            }
            other => panic!("expected error event, got {other:?}"),
        }

        fetcher.resolve_json("http://example.com/sprite.json", Ok(metadata()));
        assert!(next_or_timeout(&mut atlas).await);
        assert_no_event(&mut events);
        assert!(!atlas.loaded());
        assert!(!atlas.is_loading());
        assert_eq!(atlas.width(), None);
        assert_eq!(atlas.sprite_position("airport"), SpritePosition::default());

        // Nothing outstanding: returns instead of waiting forever.
        assert!(!next_or_timeout(&mut atlas).await);
    }

    #[tokio::test]
    async fn test_failed_resize_load_keeps_active_atlas() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        load_1x(&fetcher, &mut atlas).await;
        let mut events = atlas.subscribe();

        assert!(atlas.resize(2.0));
        fetcher.resolve_json(
            "http://example.com/sprite@2x.json",
            Err(not_found("http://example.com/sprite@2x.json")),
        );
        assert!(next_or_timeout(&mut atlas).await);
        assert!(matches!(events.try_recv(), Ok(MapEvent::Error { .. })));

        fetcher.resolve_image("http://example.com/sprite@2x.png", Ok(RgbaImage::new(128, 64)));
        assert!(next_or_timeout(&mut atlas).await);
        assert_no_event(&mut events);

        assert!(atlas.loaded());
        assert!(!atlas.is_retina());
        assert_eq!(atlas.width(), Some(64));
        assert_eq!(atlas.sprite_position("airport").width, 24);
        assert!(!atlas.is_loading());

        // Another resize to the same density retries the failed load.
        assert!(atlas.resize(2.0));
        assert_eq!(fetcher.requests().len(), 6);
        load_2x(&fetcher, &mut atlas).await;
        assert!(atlas.is_retina());
        assert_eq!(atlas.width(), Some(128));
        assert_style_data(&mut events);
    }

    #[tokio::test]
    async fn test_resize_recovers_from_failed_initial_load() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        let mut events = atlas.subscribe();

        fetcher.resolve_json(
            "http://example.com/sprite.json",
            Err(not_found("http://example.com/sprite.json")),
        );
        fetcher.resolve_image("http://example.com/sprite.png", Ok(RgbaImage::new(64, 32)));
        assert!(next_or_timeout(&mut atlas).await);
        assert!(next_or_timeout(&mut atlas).await);
        assert!(matches!(events.try_recv(), Ok(MapEvent::Error { .. })));
        assert!(!atlas.loaded());

        assert!(atlas.resize(2.0));
        load_2x(&fetcher, &mut atlas).await;

        assert!(atlas.loaded());
        assert!(atlas.is_retina());
        assert_eq!(atlas.sprite_position("airport").width, 48);
        assert_style_data(&mut events);
        assert_no_event(&mut events);
    }

    #[tokio::test]
    async fn test_first_load_finishing_during_resize_still_reports_data() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        let mut events = atlas.subscribe();

        assert!(atlas.resize(2.0));
        load_1x(&fetcher, &mut atlas).await;
        assert_style_data(&mut events);
        assert!(!atlas.is_retina());

        load_2x(&fetcher, &mut atlas).await;
        assert_style_data(&mut events);
        assert!(atlas.is_retina());
        assert_no_event(&mut events);
    }

    #[tokio::test]
    async fn test_density_restored_abandons_pending_load() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut atlas = atlas(&fetcher, 1.0);
        load_1x(&fetcher, &mut atlas).await;

        assert!(atlas.resize(2.0));
        assert!(!atlas.resize(1.0));
        assert!(!atlas.is_loading());

        fetcher.resolve_json("http://example.com/sprite@2x.json", Ok(metadata_2x()));
        fetcher.resolve_image("http://example.com/sprite@2x.png", Ok(RgbaImage::new(128, 64)));
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(atlas.drain_completions(), 0);
        assert!(!atlas.is_retina());
        assert_eq!(atlas.width(), Some(64));
    }

    #[tokio::test]
    async fn test_serializes_as_base_url() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let atlas = atlas(&fetcher, 1.0);
        assert_eq!(
            serde_json::to_string(&atlas).unwrap(),
            "\"http://example.com/sprite\""
        );
    }
}
