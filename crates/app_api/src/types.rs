//! Wire types exchanged with the gallery server

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Image entry in a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_str: String,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Image {
    pub fn new(path: &str) -> Self {
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path).to_string();
        Self {
            path: path.to_string(),
            name,
            size: 0,
            modified_str: String::new(),
            is_favorite: false,
        }
    }
}

/// Folder node, used both flat (listing) and nested (tree)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<Folder>,
}

impl Folder {
    pub fn new(path: &str) -> Self {
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path).to_string();
        Self {
            path: path.to_string(),
            name,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Folder>) -> Self {
        self.children = children;
        self
    }
}

/// Contents of one browsed location or of the favorites set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl Listing {
    pub fn new(folders: Vec<Folder>, images: Vec<Image>) -> Self {
        Self { folders, images }
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.images.is_empty()
    }
}

/// `GET /api/favorites` body
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FavoritesResponse {
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Pixel dimensions reported by the metadata endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// One node of a ComfyUI workflow summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryNode {
    pub id: Value,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    #[serde(default)]
    pub nodes: Vec<SummaryNode>,
}

/// `GET /api/metadata/<path>` body
///
/// Unknown fields are kept in `extra`. Bodies read through
/// [`ImageMetadata::from_document`] also keep the untouched JSON in `raw`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_summary: Option<WorkflowSummary>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    pub raw: Option<Value>,
}

impl ImageMetadata {
    /// Parse a metadata body, keeping the document as the server sent it
    pub fn from_document(document: Value) -> serde_json::Result<Self> {
        let mut metadata: Self = serde_json::from_value(document.clone())?;
        metadata.raw = Some(document);
        Ok(metadata)
    }
}

/// `POST /api/generate-thumbnails` acknowledgment
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailJob {
    pub status: String,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ThumbnailJobRequest<'a> {
    pub images: &'a [String],
}

/// `POST /api/favorite/<path>` body
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FavoriteAck {
    pub status: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FavoriteBatchRequest<'a> {
    pub file_paths: &'a [String],
    pub is_favorite: bool,
}

/// `POST /api/favorite-batch` body
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FavoriteBatchAck {
    pub status: String,
    #[serde(default)]
    pub updated: usize,
    #[serde(default)]
    pub message: Option<String>,
}

/// What to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadRequest {
    Image(String),
    Folder(String),
    Multiple(Vec<String>),
}

impl DownloadRequest {
    /// File name used when the server does not send one
    pub fn fallback_file_name(&self) -> String {
        fn last_segment(path: &str) -> &str {
            path.rsplit(['/', '\\']).find(|s| !s.is_empty()).unwrap_or("")
        }

        match self {
            DownloadRequest::Image(path) => {
                let name = last_segment(path);
                if name.is_empty() { "image".to_string() } else { name.to_string() }
            }
            DownloadRequest::Folder(path) => {
                let name = last_segment(path);
                if name.is_empty() { "gallery.zip".to_string() } else { format!("{}.zip", name) }
            }
            DownloadRequest::Multiple(_) => "images.zip".to_string(),
        }
    }
}

/// Downloaded file body
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Static resources served next to the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Thumbnail,
    Image,
}

impl Resource {
    fn prefix(self) -> &'static str {
        match self {
            Resource::Thumbnail => "thumbnail",
            Resource::Image => "image",
        }
    }

    /// Server-relative source, e.g. `/thumbnail/art/a.png?retry=2`
    pub fn source(self, path: &str, retry: Option<u32>) -> String {
        match retry {
            Some(n) => format!("/{}/{}?retry={}", self.prefix(), path, n),
            None => format!("/{}/{}", self.prefix(), path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_tolerates_missing_fields() {
        let listing: Listing = serde_json::from_str(
            r#"{"images":[{"path":"a/b.png","name":"b.png","size":12,"modified":1.0,"modified_str":"2024-01-01 00:00:00"}]}"#,
        )
        .unwrap();

        assert!(listing.folders.is_empty());
        assert_eq!(listing.images.len(), 1);
        assert!(!listing.images[0].is_favorite);
        assert_eq!(listing.images[0].size, 12);
    }

    #[test]
    fn test_metadata_keeps_unknown_fields() {
        let raw = r#"{"format":"PNG","size":{"width":512,"height":768},"mode":"RGB","file_size":2048,"parameters":{"seed":42},"sampler":"euler"}"#;
        let meta: ImageMetadata = serde_json::from_str(raw).unwrap();

        assert_eq!(meta.size, Some(ImageSize { width: 512, height: 768 }));
        assert_eq!(meta.extra.get("sampler"), Some(&Value::from("euler")));

        let back = serde_json::to_value(&meta).unwrap();
        assert_eq!(back["sampler"], "euler");
        assert_eq!(back["parameters"]["seed"], 42);
    }

    #[test]
    fn test_metadata_document_kept_verbatim() {
        let document = serde_json::json!({"format": "PNG", "prompt": null, "workflow": {"nodes": []}});
        let meta = ImageMetadata::from_document(document.clone()).unwrap();

        assert_eq!(meta.format.as_deref(), Some("PNG"));
        assert_eq!(meta.raw, Some(document));
        assert!(ImageMetadata::from_document(serde_json::json!({"size": "big"})).is_err());
    }

    #[test]
    fn test_fallback_file_names() {
        assert_eq!(DownloadRequest::Image("art/x.png".into()).fallback_file_name(), "x.png");
        assert_eq!(DownloadRequest::Folder("art/2024".into()).fallback_file_name(), "2024.zip");
        assert_eq!(DownloadRequest::Folder(String::new()).fallback_file_name(), "gallery.zip");
        assert_eq!(DownloadRequest::Multiple(vec![]).fallback_file_name(), "images.zip");
    }

    #[test]
    fn test_resource_source() {
        assert_eq!(Resource::Thumbnail.source("a/b.png", None), "/thumbnail/a/b.png");
        assert_eq!(Resource::Thumbnail.source("a/b.png", Some(3)), "/thumbnail/a/b.png?retry=3");
        assert_eq!(Resource::Image.source("b.png", None), "/image/b.png");
    }
}
