//! # contract: data model and capability traits for the ingestion pipeline
//!
//! Everything the pipeline passes between its stages lives here, together with
//! the three traits that put a network service behind a seam:
//!
//! - [`TokenProvider`]: exchanges [`Credentials`] for an [`AccessToken`].
//! - [`SearchProvider`]: photo search plus per-photo content fetch.
//! - [`GalleryApi`]: create one image, list all images.
//!
//! Each trait has exactly one production implementation in this crate
//! (`token::OidcTokenProvider`, `flickr::FlickrClient`,
//! `gallery::GalleryClient`). The traits are annotated for `mockall`, and the
//! mocks are exported under the default `test-export-mocks` feature so that
//! integration tests in `tests/` can drive the pipeline without a network.

use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::GalleryError;

/// Credentials for the resource-owner-password grant. Supplied once per run.
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
    /// Resource identifier of the gallery API, requested as a scope.
    pub api_identifier: String,
    /// Base URI of the identity provider (the OIDC authority).
    pub authority: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("api_identifier", &self.api_identifier)
            .field("authority", &self.authority)
            .finish()
    }
}

/// Bearer token acquired once per run and only ever read afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>) -> Result<Self, GalleryError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(GalleryError::Authentication(
                "identity provider returned an empty access token".into(),
            ));
        }
        Ok(AccessToken {
            access_token,
            token_type: "Bearer".into(),
            expires_in: None,
            scope: None,
        })
    }

    pub fn secret(&self) -> &str {
        &self.access_token
    }

    /// First few characters of the token, for console output and logs.
    pub fn preview(&self) -> String {
        let head: String = self.access_token.chars().take(8).collect();
        format!("{head}…")
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &self.preview())
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Payload for creating one gallery image.
///
/// The constructor refuses empty content, so every value that reaches the
/// upload coordinator carries bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageForCreation {
    title: String,
    category: String,
    bytes: Vec<u8>,
}

impl ImageForCreation {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, GalleryError> {
        let title = title.into();
        if bytes.is_empty() {
            return Err(GalleryError::InvalidImage(format!(
                "image '{title}' has no content"
            )));
        }
        Ok(ImageForCreation {
            title,
            category: category.into(),
            bytes,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// JSON body for `POST /api/images`. Bytes travel base64-encoded.
    pub fn to_wire(&self) -> ImageForCreationWire<'_> {
        ImageForCreationWire {
            title: &self.title,
            category: &self.category,
            bytes: base64::engine::general_purpose::STANDARD.encode(&self.bytes),
        }
    }
}

impl fmt::Debug for ImageForCreation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageForCreation")
            .field("title", &self.title)
            .field("category", &self.category)
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .finish()
    }
}

impl fmt::Display for ImageForCreation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({} bytes)",
            self.title,
            self.category,
            self.bytes.len()
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ImageForCreationWire<'a> {
    pub title: &'a str,
    pub category: &'a str,
    pub bytes: String,
}

/// One element of the `GET /api/images` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// A single search match, before its content has been fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoDescriptor {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub owner: Option<String>,
}

/// Query sent to a [`SearchProvider`] for one search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSearchOptions {
    pub tags: Vec<String>,
    pub per_page: u32,
}

/// Result of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub title: String,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Created(u16),
    Failed { status: Option<u16>, reason: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, UploadStatus::Created(_))
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            UploadStatus::Created(status) => write!(f, "{}: created (HTTP {status})", self.title),
            UploadStatus::Failed {
                status: Some(status),
                reason,
            } => write!(f, "{}: failed (HTTP {status}) {reason}", self.title),
            UploadStatus::Failed {
                status: None,
                reason,
            } => write!(f, "{}: failed {reason}", self.title),
        }
    }
}

/// Per-item outcomes of one [`crate::upload::upload_all`] call, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }
}

/// Exchanges credentials for a bearer token.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// One round-trip to the identity provider. Never retried.
    async fn request_token(&self, credentials: &Credentials) -> Result<AccessToken, GalleryError>;
}

/// External photo search: one batched search call, then one content fetch
/// per match.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search_photos(
        &self,
        options: &PhotoSearchOptions,
    ) -> Result<Vec<PhotoDescriptor>, GalleryError>;

    async fn fetch_photo(&self, photo_id: &str) -> Result<Vec<u8>, GalleryError>;
}

/// The remote gallery's image collection.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait GalleryApi: Send + Sync {
    /// `POST /api/images`. Returns the 2xx status on success and
    /// [`GalleryError::Api`] for any other status.
    async fn create_image(
        &self,
        token: &AccessToken,
        image: &ImageForCreation,
    ) -> Result<u16, GalleryError>;

    /// `GET /api/images`.
    async fn list_images(&self, token: &AccessToken) -> Result<Vec<GalleryImage>, GalleryError>;
}
