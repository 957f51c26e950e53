/// `load_config` module: loads the YAML settings file, merges the environment
/// overlay on top, injects secrets from environment variables and maps the
/// result onto the core crate's types.
///
/// # Files
/// - base: the path given on the command line (default `appsettings.yaml`)
/// - overlay: `<stem>.<environment>.<ext>` next to the base, optional. Its
///   mappings are merged recursively over the base; scalars and sequences
///   replace.
///
/// # Secrets
/// `GALLERY_PASSWORD`, `FLICKR_API_KEY` and `FLICKR_SECRET` override the file
/// values when set, so secrets can stay out of the YAML.
///
/// # Errors
/// All errors use `anyhow::Error` with context and surface at the CLI boundary.
use anyhow::{Context, Result};
use gallery_ingest_core::contract::Credentials;
use gallery_ingest_core::flickr;
use gallery_ingest_core::local::DEFAULT_CATEGORY;
use gallery_ingest_core::pipeline::LocalSettings;
use gallery_ingest_core::search::SearchSettings;
use gallery_ingest_core::token::ClientRegistration;
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const DEFAULT_ENVIRONMENT: &str = "Development";
const MAX_PER_PAGE: u32 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub gallery: GallerySection,
    pub token_endpoint: TokenEndpointSection,
    #[serde(default)]
    pub search_provider: SearchProviderSection,
    #[serde(default)]
    pub local: LocalSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GallerySection {
    pub login: String,
    #[serde(default)]
    pub password: String,
    pub api_identifier: String,
    pub base_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenEndpointSection {
    pub authority: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchProviderSection {
    pub api_key: String,
    pub secret: Option<String>,
    pub base_uri: String,
    pub tags: Vec<String>,
    pub per_page: u32,
}

impl Default for SearchProviderSection {
    fn default() -> Self {
        SearchProviderSection {
            api_key: String::new(),
            secret: None,
            base_uri: flickr::DEFAULT_BASE_URI.to_string(),
            tags: vec!["landscape".into(), "architecture".into()],
            per_page: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalSection {
    pub directory: PathBuf,
    pub category: String,
}

impl Default for LocalSection {
    fn default() -> Self {
        LocalSection {
            directory: PathBuf::from("data/photos"),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl AppConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            login: self.gallery.login.clone(),
            password: self.gallery.password.clone(),
            api_identifier: self.gallery.api_identifier.clone(),
            authority: self.token_endpoint.authority.clone(),
        }
    }

    pub fn client_registration(&self) -> ClientRegistration {
        ClientRegistration {
            client_id: self.token_endpoint.client_id.clone(),
            client_secret: self.token_endpoint.client_secret.clone(),
            scope: self.token_endpoint.scope.clone(),
        }
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            terms: self.search_provider.tags.clone(),
            per_page: self.search_provider.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn local_settings(&self) -> LocalSettings {
        LocalSettings {
            directory: self.local.directory.clone(),
            category: self.local.category.clone(),
        }
    }
}

/// `appsettings.yaml` + `Development` → `appsettings.Development.yaml`.
pub fn overlay_path(base: &Path, environment: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}.{environment}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{environment}"),
    };
    base.with_file_name(name)
}

/// Loads the base file, merges the overlay for `environment` if it exists,
/// applies environment-variable secrets and validates required values.
pub fn load_config<P: AsRef<Path>>(path: P, environment: &str) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, environment, "Loading configuration from file");

    let mut merged = read_yaml(path_ref)?;

    let overlay = overlay_path(path_ref, environment);
    if overlay.exists() {
        let overlay_value = read_yaml(&overlay)?;
        merge_yaml(&mut merged, overlay_value);
        info!(overlay_path = ?overlay, "Merged environment overlay");
    } else {
        debug!(overlay_path = ?overlay, "No environment overlay present");
    }

    let mut config: AppConfig = match serde_yaml::from_value(merged) {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Configuration does not match the expected schema");
            return Err(anyhow::anyhow!("Invalid configuration in {:?}: {e}", path_ref));
        }
    };

    apply_env_overrides(&mut config);

    if config.gallery.password.is_empty() {
        error!("No gallery password in config or GALLERY_PASSWORD");
        anyhow::bail!("gallery.password is not set (use the config file or GALLERY_PASSWORD)");
    }
    if config.search_provider.secret.is_some() {
        debug!("Search provider secret configured; REST search calls are unsigned");
    }

    info!(
        gallery = %config.gallery.base_uri,
        authority = %config.token_endpoint.authority,
        local_dir = %config.local.directory.display(),
        search_terms = config.search_provider.tags.len(),
        "Config loaded and merged successfully"
    );
    Ok(config)
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).with_context(|| {
        error!(config_path = ?path, "Failed to read config file");
        format!("Failed to read config file {:?}", path)
    })?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config YAML {:?}", path))
}

/// Recursive merge of mappings; anything else in `overlay` replaces `base`.
pub fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(password) = std::env::var("GALLERY_PASSWORD") {
        info!("GALLERY_PASSWORD found in env");
        config.gallery.password = password;
    }
    if let Ok(api_key) = std::env::var("FLICKR_API_KEY") {
        info!("FLICKR_API_KEY found in env");
        config.search_provider.api_key = api_key;
    }
    if let Ok(secret) = std::env::var("FLICKR_SECRET") {
        config.search_provider.secret = Some(secret);
    }
}
