//! High-level pipeline: token → local images → search images → verification.
//!
//! [`ingest`] runs one linear pass over everything configured in an
//! [`IngestContext`]:
//!   - acquires a single access token (failure aborts before any upload)
//!   - uploads the local directory's images, then the search results, each
//!     through [`upload_all`], never interleaved
//!   - reads the collection back through [`fetch_all`]
//!
//! # Error Handling
//! Enumeration problems stay inside their source: the source contributes no
//! uploads and its error is recorded in the [`SourceReport`]. Authentication,
//! gallery transport failures and a failed verification read end the run
//! with the underlying [`GalleryError`].
//!
//! All capabilities are passed in explicitly; nothing is held in globals.

use std::fmt;
use std::path::PathBuf;

use tracing::{error, info};

use crate::contract::{
    AccessToken, Credentials, GalleryApi, GalleryImage, SearchProvider, TokenProvider,
    UploadReport,
};
use crate::error::GalleryError;
use crate::local::list_local_images;
use crate::search::{search_images, SearchSettings};
use crate::upload::upload_all;
use crate::verify::fetch_all;

/// Where the local image source reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSettings {
    pub directory: PathBuf,
    pub category: String,
}

/// Everything one run needs besides the capability implementations.
/// A `None` source is skipped entirely.
#[derive(Debug, Clone)]
pub struct IngestContext {
    pub credentials: Credentials,
    pub local: Option<LocalSettings>,
    pub search: Option<SearchSettings>,
}

#[derive(Debug, Default)]
pub struct SourceReport {
    pub enabled: bool,
    pub uploads: UploadReport,
    /// Enumeration failure that kept this source from producing images.
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct IngestReport {
    pub token: AccessToken,
    pub local: SourceReport,
    pub search: SourceReport,
    pub verified: Vec<GalleryImage>,
}

impl IngestReport {
    pub fn attempted(&self) -> usize {
        self.local.uploads.attempted() + self.search.uploads.attempted()
    }

    pub fn succeeded(&self) -> usize {
        self.local.uploads.succeeded() + self.search.uploads.succeeded()
    }
}

pub async fn ingest<T, S, G>(
    ctx: &IngestContext,
    tokens: &T,
    search: &S,
    gallery: &G,
) -> Result<IngestReport, GalleryError>
where
    T: TokenProvider + ?Sized,
    S: SearchProvider + ?Sized,
    G: GalleryApi + ?Sized,
{
    info!(credentials = ?ctx.credentials, "[INGEST] Starting run");

    let token = match tokens.request_token(&ctx.credentials).await {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "[INGEST][ERROR] Token acquisition failed, nothing uploaded");
            return Err(e);
        }
    };
    info!(token = ?token, "[INGEST] Token acquired");

    let mut local_report = SourceReport::default();
    if let Some(local) = &ctx.local {
        local_report.enabled = true;
        match list_local_images(&local.directory, &local.category) {
            Ok(images) => {
                local_report.uploads = upload_all(gallery, &token, images).await?;
            }
            Err(e) => {
                error!(error = %e, "[INGEST][ERROR] Local source unavailable, continuing");
                local_report.error = Some(e.to_string());
            }
        }
    }

    let mut search_report = SourceReport::default();
    if let Some(settings) = &ctx.search {
        search_report.enabled = true;
        match search_images(search, settings).await {
            Ok(images) => {
                search_report.uploads = upload_all(gallery, &token, images).await?;
            }
            Err(e) => {
                error!(error = %e, "[INGEST][ERROR] Search source unavailable, continuing");
                search_report.error = Some(e.to_string());
            }
        }
    }

    let verified = fetch_all(gallery, &token).await?;
    info!(
        uploaded = local_report.uploads.succeeded() + search_report.uploads.succeeded(),
        verified = verified.len(),
        "[INGEST] Run complete"
    );

    Ok(IngestReport {
        token,
        local: local_report,
        search: search_report,
        verified,
    })
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Token: {} {} (expires in {})",
            self.token.token_type,
            self.token.preview(),
            self.token
                .expires_in
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "unknown".into())
        )?;
        for (name, source) in [("Local", &self.local), ("Search", &self.search)] {
            if !source.enabled {
                writeln!(f, "{name}: skipped")?;
                continue;
            }
            if let Some(err) = &source.error {
                writeln!(f, "{name}: unavailable ({err})")?;
                continue;
            }
            writeln!(
                f,
                "{name}: {} of {} uploaded",
                source.uploads.succeeded(),
                source.uploads.attempted()
            )?;
            for outcome in &source.uploads.outcomes {
                writeln!(f, "  {outcome}")?;
            }
        }
        write!(f, "ImagesCount: {}", self.verified.len())
    }
}
