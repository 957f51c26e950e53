use anyhow::Result;
use clap::Parser;
use gallery_ingest_core::flickr::FlickrClient;
use gallery_ingest_core::gallery::GalleryClient;
use gallery_ingest_core::pipeline::{ingest, IngestContext, IngestReport};
use gallery_ingest_core::token::OidcTokenProvider;
use gallery_ingest_core::GalleryError;
use std::path::PathBuf;

use crate::load_config::{load_config, DEFAULT_ENVIRONMENT};

/// Exit status when the token endpoint refuses or cannot be reached.
pub const EXIT_AUTHENTICATION: u8 = 2;
/// Exit status for every other fatal error.
pub const EXIT_FAILURE: u8 = 1;

/// CLI for gallery-ingest: upload local and photo-search images to the gallery.
#[derive(Parser, Debug)]
#[clap(
    name = "gallery-ingest",
    version,
    about = "Upload local and photo-search images to an image gallery API, then list what it holds"
)]
pub struct Cli {
    /// Path to the base YAML settings file
    #[clap(long, default_value = "appsettings.yaml")]
    pub config: PathBuf,

    /// Environment name selecting the `<stem>.<environment>.yaml` overlay
    #[clap(long, env = "GALLERY_ENVIRONMENT", default_value = DEFAULT_ENVIRONMENT)]
    pub environment: String,

    /// Do not upload photo-search results
    #[clap(long)]
    pub skip_search: bool,

    /// Do not upload images from the local directory
    #[clap(long)]
    pub skip_local: bool,
}

/// Async CLI entrypoint shared by `main` and the integration tests.
pub async fn run(cli: Cli) -> Result<IngestReport> {
    tracing::info!("trace_initialised");

    let config = load_config(&cli.config, &cli.environment)?;

    let search = if cli.skip_search {
        tracing::info!("Search source disabled by --skip-search");
        None
    } else {
        if config.search_provider.api_key.is_empty() {
            tracing::error!("Search enabled but no search_provider.api_key or FLICKR_API_KEY");
            anyhow::bail!(
                "search_provider.api_key is not set (use the config file, FLICKR_API_KEY or --skip-search)"
            );
        }
        Some(config.search_settings())
    };
    let local = if cli.skip_local {
        tracing::info!("Local source disabled by --skip-local");
        None
    } else {
        Some(config.local_settings())
    };

    let ctx = IngestContext {
        credentials: config.credentials(),
        local,
        search,
    };
    let tokens = OidcTokenProvider::new(config.client_registration())?;
    let flickr = FlickrClient::new(
        &config.search_provider.base_uri,
        &config.search_provider.api_key,
    )?;
    let gallery = GalleryClient::new(&config.gallery.base_uri)?;

    println!("Ingest starting...");
    let result = ingest(&ctx, &tokens, &flickr, &gallery).await;

    let exit_span = tracing::info_span!("exit");
    let _entered = exit_span.enter();
    match result {
        Ok(report) => {
            println!("{report}");
            tracing::info!(
                attempted = report.attempted(),
                succeeded = report.succeeded(),
                images = report.verified.len(),
                "Ingest complete"
            );
            Ok(report)
        }
        Err(e) => {
            tracing::error!(error = %e, "Ingest failed");
            Err(anyhow::Error::new(e).context("Ingest failed"))
        }
    }
}

/// Maps a fatal error onto the process exit status.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let auth_failure = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<GalleryError>(),
            Some(GalleryError::Authentication(_))
        )
    });
    if auth_failure {
        EXIT_AUTHENTICATION
    } else {
        EXIT_FAILURE
    }
}
