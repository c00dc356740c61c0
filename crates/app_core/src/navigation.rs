//! Navigation and listing state machine

use app_api::{Folder, Image, Listing};
use serde::Serialize;

/// Where the current listing comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ListingSource {
    /// Path-scoped folder browse; `""` is the root
    Folder(String),
    /// Global favorites set, no folder scoping
    Favorites,
}

/// Lifecycle of the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Error(String),
}

/// A listing request in flight, tagged with its generation.
///
/// Only the most recently issued generation may change state; anything older
/// is discarded when it arrives, so the last navigation issued always wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub generation: u64,
    pub source: ListingSource,
}

/// Result of feeding a response back into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed,
    Stale,
}

/// One entry of the breadcrumb bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub label: String,
    /// Navigation target, `None` for the current (last) crumb
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub crumbs: Vec<Crumb>,
    pub visible: bool,
}

/// Flattened sidebar tree row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub path: String,
    pub name: String,
    pub depth: usize,
    pub active: bool,
}

/// Navigation + listing state
#[derive(Debug, Clone)]
pub struct NavigationState {
    /// Last navigated folder; favorites mode leaves it untouched
    pub current_path: String,
    pub show_favorites_only: bool,
    pub tree: Vec<Folder>,
    pub listing: Listing,
    pub load_state: LoadState,
    pub stats: String,
    /// Source the displayed listing was loaded from
    pub shown_source: Option<ListingSource>,
    issued: u64,
}

impl NavigationState {
    pub fn new() -> Self {
        Self {
            current_path: String::new(),
            show_favorites_only: false,
            tree: Vec::new(),
            listing: Listing::default(),
            load_state: LoadState::Idle,
            stats: String::new(),
            shown_source: None,
            issued: 0,
        }
    }

    /// Source selected by the favorites flag
    pub fn active_source(&self) -> ListingSource {
        if self.show_favorites_only {
            ListingSource::Favorites
        } else {
            ListingSource::Folder(self.current_path.clone())
        }
    }

    /// Record a new folder as the navigation target
    pub fn set_path(&mut self, path: &str) {
        self.current_path = normalize_path(path);
    }

    /// Flip the favorites filter, returning the new value
    pub fn toggle_favorites(&mut self) -> bool {
        self.show_favorites_only = !self.show_favorites_only;
        self.show_favorites_only
    }

    /// Issue a request for the active source and enter `Loading`
    pub fn begin(&mut self) -> ListingRequest {
        self.issued += 1;
        let source = self.active_source();

        self.load_state = LoadState::Loading;
        self.stats = match source {
            ListingSource::Favorites => "Loading favorites...".to_string(),
            ListingSource::Folder(_) => "Loading...".to_string(),
        };

        ListingRequest {
            generation: self.issued,
            source,
        }
    }

    pub fn is_current(&self, request: &ListingRequest) -> bool {
        request.generation == self.issued
    }

    /// Apply a listing response. Failures leave the previous listing in place.
    pub fn finish(&mut self, request: &ListingRequest, result: Result<Listing, String>) -> LoadOutcome {
        if !self.is_current(request) {
            tracing::debug!(
                generation = request.generation,
                latest = self.issued,
                "Discarding stale listing response"
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(mut listing) => {
                if request.source == ListingSource::Favorites {
                    listing.folders.clear();
                }
                self.stats = stats_text(&request.source, &listing);
                self.listing = listing;
                self.load_state = LoadState::Loaded;
                self.shown_source = Some(request.source.clone());
                LoadOutcome::Applied
            }
            Err(message) => {
                self.stats = match request.source {
                    ListingSource::Favorites => "Error loading favorites".to_string(),
                    ListingSource::Folder(_) => "Error loading items".to_string(),
                };
                self.load_state = LoadState::Error(message);
                LoadOutcome::Failed
            }
        }
    }

    /// Apply a tree response; a failed tree fetch shows an empty tree
    pub fn finish_tree(&mut self, request: &ListingRequest, result: Result<Vec<Folder>, String>) -> LoadOutcome {
        if !self.is_current(request) {
            return LoadOutcome::Stale;
        }
        match result {
            Ok(tree) => {
                self.tree = tree;
                LoadOutcome::Applied
            }
            Err(message) => {
                tracing::warn!("Error loading tree: {}", message);
                self.tree.clear();
                LoadOutcome::Failed
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    pub fn images(&self) -> &[Image] {
        &self.listing.images
    }

    pub fn folders(&self) -> &[Folder] {
        &self.listing.folders
    }

    /// Patch one image's favorite flag in place; false when it is not listed
    pub fn set_favorite(&mut self, path: &str, is_favorite: bool) -> bool {
        match self.listing.images.iter_mut().find(|img| img.path == path) {
            Some(image) => {
                image.is_favorite = is_favorite;
                true
            }
            None => false,
        }
    }

    /// Message for an empty detail view
    pub fn empty_message(&self) -> &'static str {
        match self.shown_source {
            Some(ListingSource::Favorites) => "No favorites yet",
            _ if !self.listing.folders.is_empty() => "No images in this folder",
            _ => "No images yet. Generate some in ComfyUI!",
        }
    }

    pub fn breadcrumb(&self) -> Breadcrumb {
        if self.shown_source == Some(ListingSource::Favorites) {
            return Breadcrumb {
                crumbs: vec![Crumb { label: "Favorites".to_string(), target: None }],
                visible: true,
            };
        }

        let parts: Vec<&str> = self
            .current_path
            .split(['/', '\\'])
            .filter(|p| !p.is_empty())
            .collect();

        let mut crumbs = vec![Crumb { label: "Home".to_string(), target: Some(String::new()) }];
        let mut accumulated = String::new();
        for (i, part) in parts.iter().enumerate() {
            if !accumulated.is_empty() {
                accumulated.push('/');
            }
            accumulated.push_str(part);

            let is_last = i + 1 == parts.len();
            crumbs.push(Crumb {
                label: part.to_string(),
                target: (!is_last).then(|| accumulated.clone()),
            });
        }

        Breadcrumb {
            visible: !parts.is_empty(),
            crumbs,
        }
    }

    /// Root row followed by the tree, depth-first
    pub fn tree_rows(&self) -> Vec<TreeRow> {
        let mut rows = vec![TreeRow {
            path: String::new(),
            name: "Root".to_string(),
            depth: 0,
            active: self.current_path.is_empty(),
        }];
        push_rows(&mut rows, &self.tree, 0, &self.current_path);
        rows
    }
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new()
    }
}

fn push_rows(rows: &mut Vec<TreeRow>, folders: &[Folder], depth: usize, current: &str) {
    for folder in folders {
        rows.push(TreeRow {
            path: folder.path.clone(),
            name: folder.name.clone(),
            depth,
            active: folder.path == current,
        });
        push_rows(rows, &folder.children, depth + 1, current);
    }
}

fn plural(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" })
}

/// `"<n> folders, <m> images"` or `"<n> favorite images"`
pub fn stats_text(source: &ListingSource, listing: &Listing) -> String {
    match source {
        ListingSource::Favorites => plural(listing.images.len(), "favorite image"),
        ListingSource::Folder(_) => format!(
            "{}, {}",
            plural(listing.folders.len(), "folder"),
            plural(listing.images.len(), "image")
        ),
    }
}

fn normalize_path(path: &str) -> String {
    path.trim_matches(['/', '\\']).to_string()
}
