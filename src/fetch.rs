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

//! HTTP transport for map resources using reqwest.

use std::time::Duration;

use image::RgbaImage;
use log::{debug, trace};
use map_resources::{BoxFuture, FetchError, Fetcher, Request, ResourceKind};

/// Async HTTP fetcher backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

/// Issue `request` and return the body bytes of a successful response.
async fn fetch_bytes(client: reqwest::Client, request: Request) -> Result<Vec<u8>, FetchError> {
    let Request { url, headers, .. } = request;

    let mut builder = client.get(&url);
    for (name, value) in &headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = builder.send().await.map_err(|e| transport(&url, &e))?;
    let status = response.status();
    if !status.is_success() {
        debug!("HTTP {} for {}", status, url);
        return Err(FetchError::Http {
            url,
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(|e| transport(&url, &e))?;
    trace!("Fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}

fn transport(url: &str, error: &reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        message: error.to_string(),
    }
}

impl Fetcher for HttpFetcher {
    fn get_json(&self, request: Request) -> BoxFuture<'static, Result<serde_json::Value, FetchError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let bytes = fetch_bytes(client, request).await?;
            Ok(serde_json::from_slice(&bytes)?)
        })
    }

    fn get_image(&self, request: Request) -> BoxFuture<'static, Result<RgbaImage, FetchError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let bytes = fetch_bytes(client, request).await?;
            Ok(image::load_from_memory(&bytes)?.to_rgba8())
        })
    }
}

/// Request transform that attaches a bearer token to tile requests only.
#[derive(Clone)]
pub struct TileTokenTransform {
    token: String,
}

impl std::fmt::Debug for TileTokenTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileTokenTransform").finish_non_exhaustive()
    }
}

impl TileTokenTransform {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl map_resources::RequestTransform for TileTokenTransform {
    fn transform(&self, url: &str, kind: ResourceKind) -> Request {
        let request = Request::new(url);
        match kind {
            ResourceKind::Tile => {
                request.with_header("Authorization", format!("Bearer {}", self.token))
            }
            _ => request,
        }
    }
}
