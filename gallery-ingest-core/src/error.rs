use std::path::PathBuf;

/// Every failure the ingestion pipeline can produce.
///
/// Which variants are fatal depends on where they surface: `Authentication`
/// and `Transport` end a run, `Filesystem` and `SearchProvider` are contained
/// by the source that produced them, `Api` is recorded per upload but fatal
/// for the final verification read.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("search provider error: {0}")]
    SearchProvider(String),

    #[error("gallery API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("could not reach {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl GalleryError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GalleryError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// HTTP status carried by the error, if the remote side answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GalleryError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_fatal_for_uploads(&self) -> bool {
        matches!(
            self,
            GalleryError::Transport { .. } | GalleryError::Authentication(_)
        )
    }
}
