//! Flickr REST client implementing [`SearchProvider`].
//!
//! Search uses `flickr.photos.search`; content is fetched by photo id through
//! `flickr.photos.getSizes` and a download of the chosen size's `source` URL.
//! Flickr answers API-level failures with HTTP 200 and `"stat": "fail"`, so
//! every response is checked for that as well as for the HTTP status.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::contract::{PhotoDescriptor, PhotoSearchOptions, SearchProvider};
use crate::error::GalleryError;
use crate::http;

pub const DEFAULT_BASE_URI: &str = "https://api.flickr.com/services/rest";

/// Size labels in order of preference for the uploaded copy.
const PREFERRED_SIZES: &[&str] = &["Large", "Medium 800", "Medium 640", "Medium"];

pub struct FlickrClient {
    client: reqwest::Client,
    base_uri: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    stat: String,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    photos: SearchPhotos,
}

#[derive(Debug, Deserialize)]
struct SearchPhotos {
    photo: Vec<SearchPhoto>,
}

#[derive(Debug, Deserialize)]
struct SearchPhoto {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    ownername: Option<String>,
    #[serde(default)]
    description: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(rename = "_content", default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct SizesResponse {
    sizes: Sizes,
}

#[derive(Debug, Deserialize)]
struct Sizes {
    size: Vec<Size>,
}

#[derive(Debug, Clone, Deserialize)]
struct Size {
    label: String,
    source: String,
}

impl FlickrClient {
    pub fn new(base_uri: &str, api_key: &str) -> Result<Self, GalleryError> {
        Ok(FlickrClient {
            client: http::build_client().map_err(|e| GalleryError::SearchProvider(e.to_string()))?,
            base_uri: base_uri.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, GalleryError> {
        let response = self
            .client
            .get(&self.base_uri)
            .query(&[
                ("method", method),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("nojsoncallback", "1"),
            ])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, method, "Flickr unreachable");
                GalleryError::SearchProvider(format!("{method}: {e}"))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GalleryError::SearchProvider(format!("{method}: {e}")))?;
        if !status.is_success() {
            error!(status = %status, method, "Flickr returned an error status");
            return Err(GalleryError::SearchProvider(format!(
                "{method} returned HTTP {}",
                status.as_u16()
            )));
        }
        parse_envelope(method, &body)
    }
}

fn parse_envelope<T: DeserializeOwned>(method: &str, body: &str) -> Result<T, GalleryError> {
    let envelope: StatusEnvelope = serde_json::from_str(body)
        .map_err(|e| GalleryError::SearchProvider(format!("{method}: malformed response: {e}")))?;
    if envelope.stat != "ok" {
        return Err(GalleryError::SearchProvider(format!(
            "{method} failed (code {}): {}",
            envelope.code.unwrap_or_default(),
            envelope.message.unwrap_or_else(|| "unknown error".into())
        )));
    }
    serde_json::from_str(body)
        .map_err(|e| GalleryError::SearchProvider(format!("{method}: malformed response: {e}")))
}

fn pick_size(sizes: &[Size]) -> Option<&Size> {
    PREFERRED_SIZES
        .iter()
        .find_map(|label| sizes.iter().find(|s| s.label == *label))
        .or_else(|| sizes.last())
}

#[async_trait]
impl SearchProvider for FlickrClient {
    async fn search_photos(
        &self,
        options: &PhotoSearchOptions,
    ) -> Result<Vec<PhotoDescriptor>, GalleryError> {
        let tags = options.tags.join(",");
        let per_page = options.per_page.to_string();
        info!(tags = %tags, per_page = options.per_page, "Searching Flickr");

        let response: SearchResponse = self
            .call(
                "flickr.photos.search",
                &[
                    ("tags", tags.as_str()),
                    ("tag_mode", "any"),
                    ("media", "photos"),
                    ("safe_search", "1"),
                    ("content_type", "1"),
                    ("per_page", per_page.as_str()),
                    ("extras", "description,owner_name"),
                ],
            )
            .await?;

        Ok(response
            .photos
            .photo
            .into_iter()
            .map(|p| PhotoDescriptor {
                id: p.id,
                title: p.title,
                description: p.description.map(|d| d.content).filter(|d| !d.is_empty()),
                owner: p.ownername,
            })
            .collect())
    }

    async fn fetch_photo(&self, photo_id: &str) -> Result<Vec<u8>, GalleryError> {
        let response: SizesResponse = self
            .call("flickr.photos.getSizes", &[("photo_id", photo_id)])
            .await?;
        let size = pick_size(&response.sizes.size).ok_or_else(|| {
            GalleryError::SearchProvider(format!("photo {photo_id} has no downloadable sizes"))
        })?;
        debug!(photo_id, label = %size.label, source = %size.source, "Downloading photo");

        let download = self
            .client
            .get(&size.source)
            .send()
            .await
            .map_err(|e| GalleryError::SearchProvider(format!("download of {photo_id}: {e}")))?;
        let status = download.status();
        if !status.is_success() {
            return Err(GalleryError::SearchProvider(format!(
                "download of {photo_id} returned HTTP {}",
                status.as_u16()
            )));
        }
        let bytes = download
            .bytes()
            .await
            .map_err(|e| GalleryError::SearchProvider(format!("download of {photo_id}: {e}")))?;
        Ok(bytes.to_vec())
    }
}
