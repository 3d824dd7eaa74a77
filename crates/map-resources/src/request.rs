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

//! Outgoing request description and the transport seams.
//!
//! Nothing in this crate talks to the network directly. Every fetch is
//! described as a [`Request`], optionally rewritten by a [`RequestTransform`]
//! hook, and handed to a [`Fetcher`] supplied by the embedding application.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use image::RgbaImage;
use log::debug;
use thiserror::Error;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Shared request-transform hook.
pub type SharedTransform = Arc<dyn RequestTransform>;

/// Shared fetch collaborator.
pub type SharedFetcher = Arc<dyn Fetcher>;

/// What an outgoing request is for.
///
/// Transform hooks use this to apply kind-specific policy, e.g. attaching
/// credentials to tile requests only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A tile source manifest (TileJSON).
    Source,
    /// Sprite atlas metadata.
    SpriteJson,
    /// Sprite atlas image.
    SpriteImage,
    /// A single map tile.
    Tile,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::SpriteJson => "SpriteJSON",
            Self::SpriteImage => "SpriteImage",
            Self::Tile => "Tile",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential mode for transports that distinguish cross-origin requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials {
    Omit,
    SameOrigin,
    Include,
}

/// A fully resolved outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub credentials: Option<Credentials>,
}

impl Request {
    /// A plain GET for `url` with no extra headers.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            credentials: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Look up a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Hook that may rewrite every outgoing URL and attach request options.
///
/// Any `Fn(&str, ResourceKind) -> Request` closure is a transform.
pub trait RequestTransform: Send + Sync {
    fn transform(&self, url: &str, kind: ResourceKind) -> Request;
}

impl<F> RequestTransform for F
where
    F: Fn(&str, ResourceKind) -> Request + Send + Sync,
{
    fn transform(&self, url: &str, kind: ResourceKind) -> Request {
        self(url, kind)
    }
}

/// Resolve `url` through the optional hook; without one the URL is used as is.
#[must_use]
pub fn resolve_request(
    transform: Option<&dyn RequestTransform>,
    url: &str,
    kind: ResourceKind,
) -> Request {
    let request = match transform {
        Some(hook) => hook.transform(url, kind),
        None => Request::new(url),
    };
    debug!("{} request: {}", kind, request.url);
    request
}

/// Errors surfaced by a [`Fetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// External transport used for every fetch.
///
/// Futures are `'static` so they can be driven on a spawned task;
/// implementations clone whatever client handle they need into the future.
pub trait Fetcher: Send + Sync {
    /// Fetch and parse a JSON document.
    fn get_json(&self, request: Request) -> BoxFuture<'static, Result<serde_json::Value, FetchError>>;

    /// Fetch and decode an image into RGBA pixels.
    fn get_image(&self, request: Request) -> BoxFuture<'static, Result<RgbaImage, FetchError>>;
}
