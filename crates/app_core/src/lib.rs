//! ComfyGallery core view logic
//!
//! This crate contains:
//! - The gallery controller and its pure render projection
//! - Navigation, selection, zoom/pan and thumbnail retry state
//! - Metadata panel model with persisted section state
//! - Context menu commands, clipboard and downloads
//! - Configuration and error types

pub mod clipboard;
pub mod command;
pub mod config;
pub mod download;
pub mod error;
pub mod format;
pub mod metadata;
pub mod navigation;
pub mod render;
pub mod selection;
pub mod state;
pub mod thumbnail_manager;
pub mod view_transform;

pub use clipboard::{default_clipboard, Clipboard, MemoryClipboard};
#[cfg(feature = "clipboard")]
pub use clipboard::SystemClipboard;
pub use command::{ContextAction, ContextMenu, ContextTarget};
pub use config::{AppConfig, DownloadConfig, ServerConfig, ThumbnailConfig, ViewMode, ViewerConfig};
pub use download::Downloader;
pub use error::AppError;
pub use metadata::{MetadataState, MetadataView, PanelStates};
pub use navigation::{ListingRequest, ListingSource, LoadOutcome, LoadState, NavigationState};
pub use render::{render, BodyView, DetailContent, GalleryView, Tile};
pub use selection::SelectionState;
pub use state::{GalleryController, Notification};
pub use thumbnail_manager::{RetryPolicy, RetryTick, ThumbnailManager, ThumbnailStatus};
pub use view_transform::{ViewTransform, ViewerTransform, ZoomLimits};
