//! ComfyGallery - gallery browser for ComfyUI output
//!
//! Command-line entry point: loads one listing through the gallery controller
//! and prints the rendered view.

mod output;

use anyhow::{Context, Result};
use app_api::HttpApi;
use app_core::{AppConfig, GalleryController, PanelStates, ViewMode};
use clap::Parser;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "comfy_gallery", version, about = "Browse a ComfyUI gallery server")]
struct Args {
    /// Gallery server base URL (overrides config and GALLERY_SERVER_URL)
    #[arg(long, short)]
    server: Option<String>,

    /// Folder to open, relative to the gallery root
    #[arg(long, short, default_value = "")]
    path: String,

    /// Show the favorites set instead of a folder
    #[arg(long)]
    favorites: bool,

    /// Start in grid mode
    #[arg(long)]
    grid: bool,

    /// Print the view model as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logging and panic hook first
    let _log_guard = app_log::init()?;

    if let Err(e) = app_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("ComfyGallery starting...");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default configuration: {}", e);
        AppConfig::default()
    });
    if let Some(server) = args.server.clone() {
        config.server.base_url = server;
    }
    if args.grid {
        config.viewer.default_view_mode = ViewMode::Grid;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("gallery-worker")
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(args, config))
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    let api = HttpApi::new(&config.server.base_url, config.server.timeout())
        .with_context(|| format!("Invalid server URL {}", config.server.base_url))?;
    tracing::info!("Using gallery server at {}", config.server.base_url);

    let mut gallery = GalleryController::new(Arc::new(api), &config)
        .with_panel_states(PanelStates::open(&AppConfig::panel_state_path()));

    gallery.navigate(&args.path).await;
    if args.favorites {
        gallery.toggle_favorites_filter().await;
    }
    gallery.wait_for_thumbnails().await;

    let view = app_core::render(&gallery);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", output::summary(&view)?);
    }

    tracing::info!("ComfyGallery finished");
    Ok(())
}
