//! Gallery view controller
//!
//! Owns every piece of client-side gallery state and drives the backend.
//! Async operations take `&mut self`, so state changes between await points
//! are never interleaved. Overlapping listing loads can still be expressed
//! with `begin_navigation` / `finish_listing`, which discard stale responses.

use crate::clipboard::{default_clipboard, Clipboard};
use crate::command::{ContextAction, ContextMenu, ContextTarget};
use crate::download::Downloader;
use crate::format::{display_value, pretty_json};
use crate::metadata::{MetadataState, PanelStates};
use crate::navigation::{ListingRequest, ListingSource, LoadOutcome, NavigationState};
use crate::selection::SelectionState;
use crate::thumbnail_manager::{RetryPolicy, ThumbnailManager};
use crate::view_transform::{ViewTransform, ViewerTransform, ZoomLimits};
use crate::{AppConfig, AppError, ViewMode};
use app_api::{ApiError, DownloadRequest, GalleryApi, Image, ImageMetadata, Listing};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// User-facing toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub is_error: bool,
}

/// Gallery state plus the operations the presentation layer invokes
pub struct GalleryController {
    api: Arc<dyn GalleryApi>,
    navigation: NavigationState,
    selection: SelectionState,
    viewer: ViewerTransform,
    view_mode: ViewMode,
    current_image_index: Option<usize>,
    thumbnails: ThumbnailManager,
    pregenerate_task: Option<JoinHandle<()>>,
    metadata: MetadataState,
    panels: PanelStates,
    context_menu: Option<ContextMenu>,
    notifications: Vec<Notification>,
    clipboard: Box<dyn Clipboard>,
    downloader: Downloader,
}

impl GalleryController {
    pub fn new(api: Arc<dyn GalleryApi>, config: &AppConfig) -> Self {
        Self {
            api,
            navigation: NavigationState::new(),
            selection: SelectionState::new(),
            viewer: ViewerTransform::new(ZoomLimits::from(&config.viewer)),
            view_mode: config.viewer.default_view_mode,
            current_image_index: None,
            thumbnails: ThumbnailManager::new(RetryPolicy::from(&config.thumbnails)),
            pregenerate_task: None,
            metadata: MetadataState::Idle,
            panels: PanelStates::in_memory(),
            context_menu: None,
            notifications: Vec::new(),
            clipboard: default_clipboard(),
            downloader: Downloader::new(config.downloads.resolve_dir()),
        }
    }

    pub fn with_panel_states(mut self, panels: PanelStates) -> Self {
        self.panels = panels;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_downloader(mut self, downloader: Downloader) -> Self {
        self.downloader = downloader;
        self
    }

    // ===== Accessors =====

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn current_image_index(&self) -> Option<usize> {
        self.current_image_index
    }

    pub fn current_image(&self) -> Option<&Image> {
        self.current_image_index.and_then(|i| self.navigation.images().get(i))
    }

    pub fn transform(&self) -> ViewTransform {
        self.viewer.transform
    }

    pub fn viewer(&self) -> &ViewerTransform {
        &self.viewer
    }

    pub fn thumbnails(&self) -> &ThumbnailManager {
        &self.thumbnails
    }

    pub fn metadata(&self) -> &MetadataState {
        &self.metadata
    }

    pub fn panels(&self) -> &PanelStates {
        &self.panels
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.context_menu.as_ref()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drain pending notifications
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.notifications.push(Notification { message: message.into(), is_error: false });
    }

    fn notify_error(&mut self, message: impl Into<String>) {
        self.notifications.push(Notification { message: message.into(), is_error: true });
    }

    // ===== Navigation & listing =====

    /// Browse `path` (`""` is the root) and reload
    pub async fn navigate(&mut self, path: &str) {
        self.navigation.set_path(path);
        self.load().await;
    }

    /// Reload the active source without changing the path
    pub async fn refresh(&mut self) {
        self.load().await;
    }

    /// Flip between folder browsing and the favorites set, then reload.
    /// Returns the new flag.
    pub async fn toggle_favorites_filter(&mut self) -> bool {
        let enabled = self.navigation.toggle_favorites();
        tracing::info!(enabled, "Favorites filter toggled");
        self.load().await;
        enabled
    }

    async fn load(&mut self) {
        let request = self.begin_navigation();
        let api = Arc::clone(&self.api);

        let outcome = match &request.source {
            ListingSource::Folder(path) => {
                let (tree, listing) = futures::join!(api.tree(), api.browse(path));
                self.navigation.finish_tree(&request, tree.map_err(|e| e.to_string()));
                self.finish_listing(&request, listing)
            }
            ListingSource::Favorites => {
                let listing = api.favorites().await.map(|images| Listing::new(Vec::new(), images));
                self.finish_listing(&request, listing)
            }
        };

        if outcome == LoadOutcome::Applied {
            self.start_thumbnail_pregeneration();
        }
        self.settle().await;
    }

    /// Issue a listing request for the active source
    pub fn begin_navigation(&mut self) -> ListingRequest {
        let request = self.navigation.begin();
        tracing::debug!(generation = request.generation, source = ?request.source, "Loading listing");
        request
    }

    /// Feed a listing response back in. Stale responses change nothing.
    pub fn finish_listing(&mut self, request: &ListingRequest, result: Result<Listing, ApiError>) -> LoadOutcome {
        let result = result.map_err(|e| {
            tracing::error!("Error loading {:?}: {}", request.source, e);
            e.to_string()
        });

        let outcome = self.navigation.finish(request, result);
        if outcome != LoadOutcome::Applied {
            return outcome;
        }

        tracing::info!("{}", self.navigation.stats);
        self.thumbnails
            .track(self.navigation.images().iter().map(|img| img.path.as_str()));

        match self.view_mode {
            ViewMode::Grid => self.clear_detail(),
            ViewMode::Detail => self.show_first_or_empty(),
        }
        outcome
    }

    fn clear_detail(&mut self) {
        self.current_image_index = None;
        self.metadata = MetadataState::Idle;
    }

    fn show_first_or_empty(&mut self) {
        if self.navigation.images().is_empty() {
            self.clear_detail();
        } else {
            self.show_image(0);
        }
    }

    fn start_thumbnail_pregeneration(&mut self) {
        let paths: Vec<String> = self.navigation.images().iter().map(|img| img.path.clone()).collect();
        if let Some(previous) = self.pregenerate_task.take() {
            previous.abort();
        }
        self.pregenerate_task = self.thumbnails.pregenerate(Arc::clone(&self.api), paths);
    }

    /// Wait for thumbnail pre-generation and its retry loop to finish
    pub async fn wait_for_thumbnails(&mut self) {
        if let Some(task) = self.pregenerate_task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::error!("Thumbnail pre-generation failed: {}", e);
                }
            }
        }
        self.thumbnails.wait_retry().await;
    }

    pub fn thumbnail_loaded(&self, path: &str) {
        self.thumbnails.mark_loaded(path);
    }

    pub fn thumbnail_failed(&self, path: &str) {
        self.thumbnails.mark_failed(path);
    }

    // ===== Detail view =====

    /// Show `images[index]` and load its metadata. Out-of-range indices are ignored.
    pub async fn open_detail_view(&mut self, index: usize) {
        if self.show_image(index) {
            self.settle().await;
        }
    }

    /// Make `images[index]` current with its metadata pending
    fn show_image(&mut self, index: usize) -> bool {
        let Some(image) = self.navigation.images().get(index) else {
            tracing::warn!(index, len = self.navigation.images().len(), "Detail index out of range");
            return false;
        };

        let path = image.path.clone();
        tracing::debug!("Opening {}", path);
        self.current_image_index = Some(index);
        self.metadata = MetadataState::Loading { path };
        self.viewer.expect_image();
        true
    }

    /// Step through the listing, wrapping at both ends.
    /// With no image open, `+1` lands on the first image and `-1` on the last.
    pub async fn navigate_detail(&mut self, direction: isize) {
        if self.step_detail(direction) {
            self.settle().await;
        }
    }

    fn step_detail(&mut self, direction: isize) -> bool {
        let len = self.navigation.images().len();
        if len == 0 {
            return false;
        }

        let current = self.current_image_index.map_or(-1, |i| i as isize);
        let next = (current + direction).rem_euclid(len as isize) as usize;
        self.show_image(next)
    }

    /// The presenter finished loading the detail image
    pub fn on_image_loaded(&mut self, natural_width: f32, natural_height: f32) {
        self.viewer.on_image_loaded(natural_width, natural_height);
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewer.set_viewport(width, height);
    }

    pub fn zoom_in(&mut self) {
        self.viewer.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewer.zoom_out();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.viewer.wheel(delta_y);
    }

    pub fn reset_zoom(&mut self) {
        self.viewer.reset_zoom();
    }

    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.viewer.begin_drag(x, y);
    }

    pub fn drag_to(&mut self, x: f32, y: f32) {
        self.viewer.drag_to(x, y);
    }

    pub fn end_drag(&mut self) {
        self.viewer.end_drag();
    }

    // ===== Metadata =====

    /// Load metadata for the current image if it is still pending
    pub async fn settle(&mut self) {
        let Some(path) = self.begin_metadata() else {
            return;
        };
        let result = self.api.metadata(&path).await;
        self.finish_metadata(&path, result);
    }

    /// Path whose metadata is awaited, if any
    pub fn begin_metadata(&self) -> Option<String> {
        match &self.metadata {
            MetadataState::Loading { path } => Some(path.clone()),
            _ => None,
        }
    }

    /// Apply a metadata response; false when the image is no longer current
    pub fn finish_metadata(&mut self, path: &str, result: Result<ImageMetadata, ApiError>) -> bool {
        let current = self.current_image().map(|img| img.path.as_str());
        if current != Some(path) || self.metadata.path() != Some(path) {
            tracing::debug!("Discarding metadata for {}", path);
            return false;
        }

        self.metadata = match result {
            Ok(metadata) => MetadataState::Loaded { path: path.to_string(), metadata: Box::new(metadata) },
            Err(e) => {
                tracing::error!("Error loading metadata for {}: {}", path, e);
                MetadataState::Failed { path: path.to_string(), message: e.to_string() }
            }
        };
        true
    }

    /// Flip a metadata section; returns the new collapsed flag
    pub fn toggle_metadata_section(&mut self, section: &str) -> bool {
        self.panels.toggle(section)
    }

    // ===== Selection & view mode =====

    pub fn click_grid_item(&mut self, index: usize, shift: bool) {
        self.selection.click(self.navigation.images(), index, shift);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Detail <-> grid. Entering detail opens the first image.
    pub async fn toggle_view_mode(&mut self) -> ViewMode {
        self.view_mode = self.view_mode.toggled();
        if self.view_mode == ViewMode::Detail {
            self.show_first_or_empty();
            self.settle().await;
        }
        self.view_mode
    }

    // ===== Favorites =====

    /// Toggle one image server-side. Returns the acknowledged flag.
    pub async fn toggle_favorite(&mut self, path: &str) -> Option<bool> {
        match self.api.toggle_favorite(path).await {
            Ok(is_favorite) => {
                self.navigation.set_favorite(path, is_favorite);
                self.notify(if is_favorite { "Added to favorites" } else { "Removed from favorites" });
                Some(is_favorite)
            }
            Err(e) => {
                tracing::error!("Error toggling favorite for {}: {}", path, e);
                self.notify_error("Error updating favorite");
                None
            }
        }
    }

    pub async fn toggle_favorite_current(&mut self) -> Option<bool> {
        let path = self.current_image()?.path.clone();
        self.toggle_favorite(&path).await
    }

    /// Set `is_favorite` on every path in one request
    pub async fn set_favorites_batch(&mut self, paths: &[String], is_favorite: bool) -> bool {
        match self.api.set_favorites(paths, is_favorite).await {
            Ok(updated) => {
                for path in paths {
                    self.navigation.set_favorite(path, is_favorite);
                }
                self.notify(format!("Updated favorites for {} file(s)", updated));
                true
            }
            Err(e) => {
                tracing::error!("Error updating {} favorites: {}", paths.len(), e);
                self.notify_error("Error updating favorites");
                false
            }
        }
    }

    pub async fn favorite_selected(&mut self) -> bool {
        self.batch_selected(true).await
    }

    pub async fn unfavorite_selected(&mut self) -> bool {
        self.batch_selected(false).await
    }

    async fn batch_selected(&mut self, is_favorite: bool) -> bool {
        let Some(paths) = self.selected_paths() else {
            return false;
        };
        self.set_favorites_batch(&paths, is_favorite).await
    }

    fn selected_paths(&mut self) -> Option<Vec<String>> {
        if self.selection.is_empty() {
            self.notify(AppError::NothingSelected("No images selected".to_string()).user_message());
            return None;
        }
        Some(self.selection.paths(self.navigation.images()))
    }

    // ===== Context menu =====

    pub fn open_context_menu(&mut self, target: ContextTarget, x: f32, y: f32) {
        self.context_menu = Some(ContextMenu::new(target, x, y));
    }

    pub fn close_context_menu(&mut self) {
        self.context_menu = None;
    }

    /// Run `action` on the open menu's target and close the menu.
    /// Returns false when no menu is open or the action does not apply.
    pub async fn run_context_action(&mut self, action: ContextAction) -> bool {
        let Some(menu) = self.context_menu.take() else {
            return false;
        };
        if !action.applies_to(&menu.target) {
            tracing::debug!("{} does not apply to {:?}", action.id(), menu.target);
            return false;
        }

        match (action, menu.target) {
            (ContextAction::Download, ContextTarget::Image(path)) => {
                self.download(DownloadRequest::Image(path)).await;
            }
            (ContextAction::DownloadFolder, ContextTarget::Folder(path)) => {
                self.download(DownloadRequest::Folder(path)).await;
            }
            (ContextAction::CopyPath, target) => {
                self.copy_text(target.path(), "Path");
            }
            (ContextAction::CopyMetadata, ContextTarget::Image(path)) => {
                self.copy_metadata(&path).await;
            }
            (ContextAction::CopyWorkflow, ContextTarget::Image(path)) => {
                self.copy_workflow(&path).await;
            }
            _ => return false,
        }
        true
    }

    // ===== Clipboard =====

    /// Copy `text`, notifying `"<label> copied to clipboard!"`
    pub fn copy_text(&mut self, text: &str, label: &str) -> bool {
        match self.clipboard.set_text(text) {
            Ok(()) => {
                self.notify(format!("{} copied to clipboard!", label));
                true
            }
            Err(e) => {
                tracing::error!("Failed to copy {}: {}", label, e);
                self.notify_error(e.user_message());
                false
            }
        }
    }

    /// Copy one workflow-summary parameter of the loaded metadata
    pub fn copy_summary_param(&mut self, node_id: &str, key: &str) -> bool {
        let value = self
            .metadata
            .metadata()
            .and_then(|meta| meta.workflow_summary.as_ref())
            .and_then(|summary| summary.nodes.iter().find(|n| display_value(&n.id) == node_id))
            .and_then(|node| node.params.get(key))
            .map(display_value);

        match value {
            Some(value) => self.copy_text(&value, key),
            None => {
                tracing::warn!("No parameter {} on node {}", key, node_id);
                false
            }
        }
    }

    /// Loaded metadata when it is for `path`, otherwise a fresh fetch
    async fn fetch_metadata(&mut self, path: &str) -> Option<ImageMetadata> {
        if self.metadata.path() == Some(path) {
            if let Some(metadata) = self.metadata.metadata() {
                return Some(metadata.clone());
            }
        }

        match self.api.metadata(path).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::error!("Failed to fetch metadata for {}: {}", path, e);
                self.notify_error(AppError::from(e).user_message());
                None
            }
        }
    }

    pub async fn copy_metadata(&mut self, path: &str) -> bool {
        let Some(metadata) = self.fetch_metadata(path).await else {
            return false;
        };
        let text = match &metadata.raw {
            Some(document) => pretty_json(document),
            None => pretty_json(&metadata),
        };
        self.copy_text(&text, "Metadata")
    }

    pub async fn copy_workflow(&mut self, path: &str) -> bool {
        let Some(metadata) = self.fetch_metadata(path).await else {
            return false;
        };
        match &metadata.workflow {
            Some(workflow) => self.copy_text(&pretty_json(workflow), "Workflow"),
            None => {
                self.notify("No workflow found in image");
                false
            }
        }
    }

    // ===== Downloads =====

    /// Fetch and save a download. Returns where it was written.
    pub async fn download(&mut self, request: DownloadRequest) -> Option<PathBuf> {
        match self.fetch_download(&request).await {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.notify(format!("Saved {}", name));
                Some(path)
            }
            Err(e) => {
                tracing::error!("Download {:?} failed: {}", request, e);
                self.notify_error(format!("Download failed: {}", e.user_message()));
                None
            }
        }
    }

    async fn fetch_download(&self, request: &DownloadRequest) -> Result<PathBuf, AppError> {
        let download = self.api.download(request).await?;
        self.downloader.save(&download).await
    }

    pub async fn download_selected(&mut self) -> Option<PathBuf> {
        let paths = self.selected_paths()?;
        self.download(DownloadRequest::Multiple(paths)).await
    }

    pub async fn download_current_image(&mut self) -> Option<PathBuf> {
        let path = self.current_image()?.path.clone();
        self.download(DownloadRequest::Image(path)).await
    }
}

impl Drop for GalleryController {
    fn drop(&mut self) {
        if let Some(task) = self.pregenerate_task.take() {
            task.abort();
        }
        self.thumbnails.stop_retry();
    }
}
