//! HTTP client for the gallery API's image collection (`/api/images`).

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::{debug, error, info};

use crate::contract::{AccessToken, GalleryApi, GalleryImage, ImageForCreation};
use crate::error::GalleryError;
use crate::http;

pub struct GalleryClient {
    client: reqwest::Client,
    images_url: String,
}

impl GalleryClient {
    pub fn new(base_uri: &str) -> Result<Self, GalleryError> {
        let client = http::build_client().map_err(|e| GalleryError::Transport {
            url: base_uri.to_string(),
            reason: e.to_string(),
        })?;
        Ok(GalleryClient {
            client,
            images_url: images_url(base_uri),
        })
    }

    pub fn images_url(&self) -> &str {
        &self.images_url
    }

    fn bearer(&self, token: &AccessToken) -> Result<HeaderValue, GalleryError> {
        HeaderValue::from_str(&format!("Bearer {}", token.secret()))
            .map_err(|e| GalleryError::Authentication(format!("token is not a valid header value: {e}")))
    }

    fn transport(&self, e: reqwest::Error) -> GalleryError {
        GalleryError::Transport {
            url: self.images_url.clone(),
            reason: e.to_string(),
        }
    }
}

/// `{base}/api/images`, tolerating a trailing slash on the base.
pub fn images_url(base_uri: &str) -> String {
    format!("{}/api/images", base_uri.trim_end_matches('/'))
}

#[async_trait]
impl GalleryApi for GalleryClient {
    async fn create_image(
        &self,
        token: &AccessToken,
        image: &ImageForCreation,
    ) -> Result<u16, GalleryError> {
        debug!(title = image.title(), size = image.bytes().len(), "POST image");
        let response = self
            .client
            .post(&self.images_url)
            .header(AUTHORIZATION, self.bearer(token)?)
            .json(&image.to_wire())
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %self.images_url, "Gallery API unreachable");
                self.transport(e)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(status.as_u16());
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, status = %status, "Could not read rejected upload body");
                String::new()
            }
        };
        Err(GalleryError::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn list_images(&self, token: &AccessToken) -> Result<Vec<GalleryImage>, GalleryError> {
        let response = self
            .client
            .get(&self.images_url)
            .header(AUTHORIZATION, self.bearer(token)?)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %self.images_url, "Gallery API unreachable");
                self.transport(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport(e))?;
        if !status.is_success() {
            error!(status = %status, "Listing gallery images failed");
            return Err(GalleryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let images: Vec<GalleryImage> =
            serde_json::from_str(&body).map_err(|e| GalleryError::Decode {
                url: self.images_url.clone(),
                reason: e.to_string(),
            })?;
        info!(count = images.len(), "Listed gallery images");
        Ok(images)
    }
}
