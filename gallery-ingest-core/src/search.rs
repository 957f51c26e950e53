//! Turns photo-search matches into upload payloads.

use tracing::{info, warn};

use crate::contract::{ImageForCreation, PhotoDescriptor, PhotoSearchOptions, SearchProvider};
use crate::error::GalleryError;

/// Search terms and page size for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub terms: Vec<String>,
    pub per_page: u32,
}

/// Search every term in order, fetch each match's content, and build the
/// payloads.
///
/// A failed search call skips that term; the source only fails when every
/// term's search failed, or on an authentication error. A failed or empty
/// content fetch skips that one match; the rest are still returned, in search
/// order.
pub async fn search_images<S>(
    provider: &S,
    settings: &SearchSettings,
) -> Result<Vec<ImageForCreation>, GalleryError>
where
    S: SearchProvider + ?Sized,
{
    let mut images = Vec::new();
    let mut searched = 0usize;
    let mut last_error = None;

    for term in &settings.terms {
        let options = PhotoSearchOptions {
            tags: vec![term.clone()],
            per_page: settings.per_page,
        };
        let matches = match provider.search_photos(&options).await {
            Ok(matches) => matches,
            Err(e @ GalleryError::Authentication(_)) => return Err(e),
            Err(e) => {
                warn!(term = %term, error = %e, "Search failed, skipping term");
                last_error = Some(e);
                continue;
            }
        };
        searched += 1;
        info!(term = %term, matches = matches.len(), "Search returned matches");

        for photo in matches {
            let bytes = match provider.fetch_photo(&photo.id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(photo_id = %photo.id, error = %e, "Skipping photo whose content could not be fetched");
                    continue;
                }
            };
            match ImageForCreation::new(title_for(&photo), term.clone(), bytes) {
                Ok(image) => images.push(image),
                Err(e) => warn!(photo_id = %photo.id, error = %e, "Skipping photo with empty content"),
            }
        }
    }

    match last_error {
        Some(e) if searched == 0 => Err(e),
        _ => Ok(images),
    }
}

/// Photo title, else its description, else `Photo {id}` (with the owner when
/// known).
fn title_for(photo: &PhotoDescriptor) -> String {
    let title = photo.title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    if let Some(description) = photo.description.as_deref().map(str::trim) {
        if !description.is_empty() {
            return description.to_string();
        }
    }
    match photo.owner.as_deref().map(str::trim) {
        Some(owner) if !owner.is_empty() => format!("Photo {} by {owner}", photo.id),
        _ => format!("Photo {}", photo.id),
    }
}
