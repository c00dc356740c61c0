//! Pure projection of controller state into a view model

use crate::command::{ContextAction, ContextTarget};
use crate::format::format_file_size;
use crate::metadata::MetadataView;
use crate::navigation::{Breadcrumb, ListingSource, TreeRow};
use crate::state::{GalleryController, Notification};
use crate::view_transform::ViewTransform;
use crate::ViewMode;
use app_api::Resource;
use serde::Serialize;

/// Everything a presenter needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryView {
    pub stats: String,
    pub loading: bool,
    pub breadcrumb: Breadcrumb,
    pub tree: Vec<TreeRow>,
    pub favorites_filter_active: bool,
    pub mode: ViewMode,
    pub body: BodyView,
    /// `"<n> selected"`; grid mode with a non-empty selection only
    pub selection_badge: Option<String>,
    pub context_menu: Option<ContextMenuView>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BodyView {
    Detail(DetailView),
    Grid(GridView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub content: DetailContent,
    /// Folders first, then images
    pub strip: Vec<Tile>,
    pub info: Option<ImageInfo>,
    pub metadata: Option<MetadataView>,
    pub current_is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DetailContent {
    Image {
        source: String,
        transform: ViewTransform,
        awaiting_fit: bool,
    },
    Empty {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridView {
    pub tiles: Vec<Tile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Tile {
    Folder {
        path: String,
        name: String,
    },
    Image {
        index: usize,
        path: String,
        name: String,
        thumbnail: String,
        favorite: bool,
        /// Current detail image
        active: bool,
        selected: bool,
    },
}

/// Info bar under the detail image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub name: String,
    pub size: String,
    pub modified: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextMenuView {
    pub target: ContextTarget,
    pub x: f32,
    pub y: f32,
    pub actions: Vec<ActionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionView {
    pub id: &'static str,
    pub label: &'static str,
}

impl From<ContextAction> for ActionView {
    fn from(action: ContextAction) -> Self {
        Self { id: action.id(), label: action.label() }
    }
}

pub fn render(gallery: &GalleryController) -> GalleryView {
    let nav = gallery.navigation();
    let mode = gallery.view_mode();

    let body = match mode {
        ViewMode::Detail => BodyView::Detail(render_detail(gallery)),
        ViewMode::Grid => BodyView::Grid(GridView { tiles: tiles(gallery) }),
    };

    let selection = gallery.selection();
    let selection_badge =
        (mode == ViewMode::Grid && !selection.is_empty()).then(|| format!("{} selected", selection.len()));

    let context_menu = gallery.context_menu().map(|menu| ContextMenuView {
        target: menu.target.clone(),
        x: menu.x,
        y: menu.y,
        actions: menu.actions().iter().copied().map(ActionView::from).collect(),
    });

    GalleryView {
        stats: nav.stats.clone(),
        loading: nav.is_loading(),
        breadcrumb: nav.breadcrumb(),
        tree: nav.tree_rows(),
        favorites_filter_active: nav.show_favorites_only,
        mode,
        body,
        selection_badge,
        context_menu,
        notifications: gallery.notifications().to_vec(),
    }
}

fn render_detail(gallery: &GalleryController) -> DetailView {
    let Some(image) = gallery.current_image() else {
        return DetailView {
            content: DetailContent::Empty {
                message: gallery.navigation().empty_message().to_string(),
            },
            strip: tiles(gallery),
            info: None,
            metadata: None,
            current_is_favorite: false,
        };
    };

    DetailView {
        content: DetailContent::Image {
            source: Resource::Image.source(&image.path, None),
            transform: gallery.transform(),
            awaiting_fit: gallery.viewer().is_awaiting_fit(),
        },
        strip: tiles(gallery),
        info: Some(ImageInfo {
            name: image.name.clone(),
            size: format_file_size(image.size),
            modified: image.modified_str.clone(),
        }),
        metadata: MetadataView::build(gallery.metadata(), gallery.panels()),
        current_is_favorite: image.is_favorite,
    }
}

fn tiles(gallery: &GalleryController) -> Vec<Tile> {
    let nav = gallery.navigation();
    let current = gallery.current_image_index();

    // Favorites listings never carry folders
    let folders = match nav.shown_source {
        Some(ListingSource::Favorites) => &[][..],
        _ => nav.folders(),
    };

    let folder_tiles = folders.iter().map(|folder| Tile::Folder {
        path: folder.path.clone(),
        name: folder.name.clone(),
    });
    let image_tiles = nav.images().iter().enumerate().map(|(index, image)| Tile::Image {
        index,
        path: image.path.clone(),
        name: image.name.clone(),
        thumbnail: gallery.thumbnails().source(&image.path),
        favorite: image.is_favorite,
        active: current == Some(index),
        selected: gallery.selection().contains(&image.path),
    });

    folder_tiles.chain(image_tiles).collect()
}
