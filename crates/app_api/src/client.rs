//! reqwest-backed implementation of the gallery API

use crate::types::{
    FavoriteAck, FavoriteBatchAck, FavoriteBatchRequest, FavoritesResponse, ThumbnailJobRequest,
};
use crate::{
    ApiError, Download, DownloadRequest, Folder, GalleryApi, Image, ImageMetadata, Listing,
    Result, ThumbnailJob,
};
use async_trait::async_trait;
use reqwest::{header, Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// HTTP client for a running gallery server
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
}

impl HttpApi {
    /// Create a client rooted at `base_url` (e.g. `http://127.0.0.1:3002`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("comfy_gallery/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an absolute URL from fixed segments followed by a gallery path.
    /// Each path segment is percent-encoded on its own so `/` stays a separator.
    fn endpoint(&self, fixed: &[&str], path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(fixed);
            segments.extend(path.split(['/', '\\']).filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<&B>,
    ) -> Result<T> {
        tracing::debug!("POST {}", url);
        let mut request = self.client.post(url);
        request = match body {
            Some(body) => request.json(body),
            None => request.header(header::CONTENT_TYPE, "application/json"),
        };
        let response = request.send().await?;
        read_json(response).await
    }

    async fn read_download(&self, response: Response, request: &DownloadRequest) -> Result<Download> {
        let response = check_status(response)?;
        let file_name = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition)
            .unwrap_or_else(|| request.fallback_file_name());
        let bytes = response.bytes().await?.to_vec();

        tracing::debug!("Downloaded {} ({} bytes)", file_name, bytes.len());
        Ok(Download { file_name, bytes })
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

/// Read a JSON body; a non-JSON body is a decode error, not a transport error
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check_status(response)?;
    let url = response.url().to_string();
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{}: {}", url, e)))
}

/// Extract `filename` from a `Content-Disposition` header value
fn file_name_from_disposition(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

fn ensure_success(status: &str, message: Option<String>) -> Result<()> {
    if status == "success" {
        Ok(())
    } else {
        Err(ApiError::Rejected(message.unwrap_or_else(|| status.to_string())))
    }
}

#[async_trait]
impl GalleryApi for HttpApi {
    async fn tree(&self) -> Result<Vec<Folder>> {
        self.get_json(self.endpoint(&["api", "tree"], "")?).await
    }

    async fn browse(&self, path: &str) -> Result<Listing> {
        self.get_json(self.endpoint(&["api", "browse"], path)?).await
    }

    async fn favorites(&self) -> Result<Vec<Image>> {
        let body: FavoritesResponse = self.get_json(self.endpoint(&["api", "favorites"], "")?).await?;
        Ok(body.images)
    }

    async fn metadata(&self, path: &str) -> Result<ImageMetadata> {
        let url = self.endpoint(&["api", "metadata"], path)?;
        let document: serde_json::Value = self.get_json(url.clone()).await?;
        ImageMetadata::from_document(document).map_err(|e| ApiError::Decode(format!("{}: {}", url, e)))
    }

    async fn generate_thumbnails(&self, paths: &[String]) -> Result<ThumbnailJob> {
        let url = self.endpoint(&["api", "generate-thumbnails"], "")?;
        self.post_json(url, Some(&ThumbnailJobRequest { images: paths })).await
    }

    async fn toggle_favorite(&self, path: &str) -> Result<bool> {
        let url = self.endpoint(&["api", "favorite"], path)?;
        let ack: FavoriteAck = self.post_json::<(), _>(url, None).await?;
        ensure_success(&ack.status, ack.message)?;
        Ok(ack.is_favorite)
    }

    async fn set_favorites(&self, paths: &[String], is_favorite: bool) -> Result<usize> {
        let url = self.endpoint(&["api", "favorite-batch"], "")?;
        let body = FavoriteBatchRequest { file_paths: paths, is_favorite };
        let ack: FavoriteBatchAck = self.post_json(url, Some(&body)).await?;
        ensure_success(&ack.status, ack.message)?;
        Ok(ack.updated)
    }

    async fn download(&self, request: &DownloadRequest) -> Result<Download> {
        let response = match request {
            DownloadRequest::Image(path) => {
                let url = self.endpoint(&["api", "download"], path)?;
                self.client.get(url).send().await?
            }
            DownloadRequest::Folder(path) => {
                let url = self.endpoint(&["api", "download-folder"], path)?;
                self.client.get(url).send().await?
            }
            DownloadRequest::Multiple(paths) => {
                let url = self.endpoint(&["api", "download-multiple"], "")?;
                let encoded = serde_json::to_string(paths)
                    .map_err(|e| ApiError::Decode(e.to_string()))?;
                self.client.post(url).form(&[("paths", encoded)]).send().await?
            }
        };

        self.read_download(response, request).await
    }
}
