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

//! In-memory fetcher whose requests are resolved by the test, in any order.

use std::sync::Mutex;

use image::RgbaImage;
use tokio::sync::oneshot;

use crate::request::{BoxFuture, FetchError, Fetcher, Request};

type JsonReply = oneshot::Sender<Result<serde_json::Value, FetchError>>;
type ImageReply = oneshot::Sender<Result<RgbaImage, FetchError>>;

#[derive(Debug, Default)]
pub(crate) struct ScriptedFetcher {
    log: Mutex<Vec<Request>>,
    json: Mutex<Vec<(String, JsonReply)>>,
    images: Mutex<Vec<(String, ImageReply)>>,
}

impl ScriptedFetcher {
    /// Every request seen so far, in dispatch order.
    pub(crate) fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    /// Resolve the oldest outstanding JSON request for `url`.
    pub(crate) fn resolve_json(&self, url: &str, result: Result<serde_json::Value, FetchError>) {
        let mut pending = self.json.lock().unwrap();
        let pos = pending
            .iter()
            .position(|(u, _)| u == url)
            .unwrap_or_else(|| panic!("no pending JSON request for {url}"));
        let (_, reply) = pending.remove(pos);
        let _ = reply.send(result);
    }

    /// Resolve the oldest outstanding image request for `url`.
    pub(crate) fn resolve_image(&self, url: &str, result: Result<RgbaImage, FetchError>) {
        let mut pending = self.images.lock().unwrap();
        let pos = pending
            .iter()
            .position(|(u, _)| u == url)
            .unwrap_or_else(|| panic!("no pending image request for {url}"));
        let (_, reply) = pending.remove(pos);
        let _ = reply.send(result);
    }
}

impl Fetcher for ScriptedFetcher {
    fn get_json(&self, request: Request) -> BoxFuture<'static, Result<serde_json::Value, FetchError>> {
        let (tx, rx) = oneshot::channel();
        let url = request.url.clone();
        self.json.lock().unwrap().push((url.clone(), tx));
        self.log.lock().unwrap().push(request);
        Box::pin(async move {
            rx.await.unwrap_or_else(|_| {
                Err(FetchError::Transport {
                    url,
                    message: "reply dropped".to_string(),
                })
            })
        })
    }

    fn get_image(&self, request: Request) -> BoxFuture<'static, Result<RgbaImage, FetchError>> {
        let (tx, rx) = oneshot::channel();
        let url = request.url.clone();
        self.images.lock().unwrap().push((url.clone(), tx));
        self.log.lock().unwrap().push(request);
        Box::pin(async move {
            rx.await.unwrap_or_else(|_| {
                Err(FetchError::Transport {
                    url,
                    message: "reply dropped".to_string(),
                })
            })
        })
    }
}

/// Fetcher that answers every request immediately from fixed payloads.
#[derive(Debug, Clone)]
pub(crate) struct StaticFetcher {
    pub(crate) json: serde_json::Value,
    pub(crate) image: RgbaImage,
    pub(crate) log: std::sync::Arc<Mutex<Vec<Request>>>,
}

impl StaticFetcher {
    pub(crate) fn new(json: serde_json::Value, image: RgbaImage) -> Self {
        Self {
            json,
            image,
            log: std::sync::Arc::default(),
        }
    }
}

impl Fetcher for StaticFetcher {
    fn get_json(&self, request: Request) -> BoxFuture<'static, Result<serde_json::Value, FetchError>> {
        self.log.lock().unwrap().push(request);
        let json = self.json.clone();
        Box::pin(async move { Ok(json) })
    }

    fn get_image(&self, request: Request) -> BoxFuture<'static, Result<RgbaImage, FetchError>> {
        self.log.lock().unwrap().push(request);
        let image = self.image.clone();
        Box::pin(async move { Ok(image) })
    }
}

/// Fetcher that fails every request with the given HTTP status.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FailingFetcher {
    pub(crate) status: u16,
}

impl Fetcher for FailingFetcher {
    fn get_json(&self, request: Request) -> BoxFuture<'static, Result<serde_json::Value, FetchError>> {
        let status = self.status;
        Box::pin(async move {
            Err(FetchError::Http {
                url: request.url,
                status,
            })
        })
    }

    fn get_image(&self, request: Request) -> BoxFuture<'static, Result<RgbaImage, FetchError>> {
        let status = self.status;
        Box::pin(async move {
            Err(FetchError::Http {
                url: request.url,
                status,
            })
        })
    }
}
