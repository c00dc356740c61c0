//! ComfyGallery backend API
//!
//! Provides:
//! - Wire types shared with the gallery server (listings, metadata, acks)
//! - The `GalleryApi` trait the view controller talks to
//! - `HttpApi`, the reqwest implementation of that trait

mod client;
mod types;

pub use client::HttpApi;
pub use types::{
    Download, DownloadRequest, Folder, Image, ImageMetadata, ImageSize, Listing, Resource,
    SummaryNode, ThumbnailJob, WorkflowSummary,
};

use async_trait::async_trait;
use thiserror::Error;

/// Backend errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// The gallery server contract.
///
/// Every call is independent and may fail on its own; callers decide how a
/// failure is surfaced.
#[async_trait]
pub trait GalleryApi: Send + Sync {
    /// `GET /api/tree`
    async fn tree(&self) -> Result<Vec<Folder>>;

    /// `GET /api/browse[/<path>]`; the empty path is the root
    async fn browse(&self, path: &str) -> Result<Listing>;

    /// `GET /api/favorites`
    async fn favorites(&self) -> Result<Vec<Image>>;

    /// `GET /api/metadata/<path>`
    async fn metadata(&self, path: &str) -> Result<ImageMetadata>;

    /// `POST /api/generate-thumbnails`
    async fn generate_thumbnails(&self, paths: &[String]) -> Result<ThumbnailJob>;

    /// `POST /api/favorite/<path>`; returns the new favorite flag
    async fn toggle_favorite(&self, path: &str) -> Result<bool>;

    /// `POST /api/favorite-batch`; returns the server-reported update count
    async fn set_favorites(&self, paths: &[String], is_favorite: bool) -> Result<usize>;

    /// `/api/download`, `/api/download-folder`, `/api/download-multiple`
    async fn download(&self, request: &DownloadRequest) -> Result<Download>;
}
