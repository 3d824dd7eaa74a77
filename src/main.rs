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

//! mapview - inspect sprite atlases and raster tile sources from the command line.

mod config;
mod fetch;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use map_resources::tile::compute_tile_range;
use map_resources::{
    MapEvent, RasterTileSource, SharedFetcher, SharedTransform, SpriteAtlas, TileCoordinate,
};

use config::AppConfig;
use fetch::{HttpFetcher, TileTokenTransform};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "mapview")]
#[command(about = "Inspect map sprite atlases and raster tile sources", long_about = None)]
struct Args {
    /// Configuration file (defaults to the platform config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the sprite atlas and print icon positions
    Sprite {
        /// Icon names to look up (all icons when empty)
        names: Vec<String>,

        /// Sprite base URL, overriding the configuration
        #[arg(long)]
        url: Option<String>,

        /// Display pixel ratio, overriding the configuration
        #[arg(long)]
        pixel_ratio: Option<f64>,
    },
    /// Report whether the source has a tile and the request used to fetch it
    HasTile { z: u8, x: u32, y: u32 },
    /// Print the tile range covered by the source bounds
    Range { zoom: u8 },
    /// Print the configuration file path
    ConfigPath,
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), BoxError> {
    let path = args.config.as_deref();
    match args.command {
        Command::Sprite {
            names,
            url,
            pixel_ratio,
        } => {
            let config = load_config(path)?;
            let base = url.unwrap_or_else(|| config.sprite_url.clone());
            let ratio = pixel_ratio.unwrap_or(config.pixel_ratio);
            show_sprites(&config, base, ratio, &names).await
        }
        Command::HasTile { z, x, y } => {
            let config = load_config(path)?;
            report_tile(&config, TileCoordinate::new(z, x, y)).await
        }
        Command::Range { zoom } => {
            let config = load_config(path)?;
            print_range(&config, zoom).await
        }
        Command::ConfigPath => {
            let path = match path {
                Some(path) => path.to_path_buf(),
                None => AppConfig::get_config_path()?,
            };
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, confy::ConfyError> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            AppConfig::load_from(path)
        }
        None => AppConfig::load(),
    }
}

fn fetcher(config: &AppConfig) -> Result<SharedFetcher, reqwest::Error> {
    let fetcher = HttpFetcher::new(&config.user_agent, Duration::from_secs(config.timeout_secs))?;
    Ok(Arc::new(fetcher))
}

fn transform(config: &AppConfig) -> Option<SharedTransform> {
    config
        .access_token()
        .map(|token| Arc::new(TileTokenTransform::new(token)) as SharedTransform)
}

async fn show_sprites(
    config: &AppConfig,
    base: String,
    pixel_ratio: f64,
    names: &[String],
) -> Result<(), BoxError> {
    let mut atlas = SpriteAtlas::new(base, pixel_ratio, fetcher(config)?, transform(config));
    let mut events = atlas.subscribe();

    while !atlas.loaded() {
        if !atlas.process_next().await {
            return Err("sprite atlas has no outstanding fetches but is not loaded".into());
        }
        while let Ok(event) = events.try_recv() {
            if let MapEvent::Error { error } = event {
                return Err(error.into());
            }
        }
    }

    println!(
        "{} ({}, {} px wide)",
        atlas.base(),
        if atlas.is_retina() { "@2x" } else { "@1x" },
        atlas.width().unwrap_or(0)
    );

    let mut names: Vec<String> = if names.is_empty() {
        atlas
            .index()
            .map(|index| index.names().map(str::to_string).collect())
            .unwrap_or_default()
    } else {
        names.to_vec()
    };
    names.sort();

    for name in &names {
        if atlas.index().and_then(|index| index.get(name)).is_none() {
            warn!("Icon '{}' not found in atlas", name);
        }
        let position = atlas.sprite_position(name);
        println!(
            "{}: x={} y={} {}x{} ratio={}{}",
            name,
            position.x,
            position.y,
            position.width,
            position.height,
            position.pixel_ratio,
            if position.sdf { " sdf" } else { "" }
        );
    }
    Ok(())
}

async fn load_source(config: &AppConfig) -> Result<RasterTileSource, BoxError> {
    let mut source = RasterTileSource::new(
        "raster",
        config.source.clone(),
        fetcher(config)?,
        transform(config),
    );
    source.load().await?;
    Ok(source)
}

async fn report_tile(config: &AppConfig, coord: TileCoordinate) -> Result<(), BoxError> {
    if !coord.is_valid() {
        return Err(format!("{coord} is not a valid tile address").into());
    }
    let source = load_source(config).await?;

    if coord.zoom < source.minzoom() || coord.zoom > source.maxzoom() {
        warn!(
            "Zoom {} is outside the source range {}-{}",
            coord.zoom,
            source.minzoom(),
            source.maxzoom()
        );
    }

    let available = source.has_tile(&coord);
    println!(
        "{}: {}",
        coord,
        if available { "available" } else { "outside source bounds" }
    );

    if let Some(request) = source.tile_request(&coord) {
        println!("url: {}", request.url);
        for (name, _) in &request.headers {
            println!("header: {name}");
        }
    }
    if let Some(attribution) = source.attribution() {
        println!("attribution: {attribution}");
    }
    Ok(())
}

async fn print_range(config: &AppConfig, zoom: u8) -> Result<(), BoxError> {
    let source = load_source(config).await?;

    let Some(bounds) = source.bounds() else {
        println!("No bounds configured: every tile at zoom {zoom} is available");
        return Ok(());
    };

    let range = compute_tile_range(bounds, zoom);
    println!("bounds: {:?}", bounds.to_array());
    println!(
        "zoom {}: x {}..={}{} y {}..={} ({} tiles)",
        range.zoom,
        range.min_x,
        range.max_x,
        if range.wraps { " (wraps)" } else { "" },
        range.min_y,
        range.max_y,
        range.len()
    );
    Ok(())
}
