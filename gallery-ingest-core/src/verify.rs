use tracing::info;

use crate::contract::{AccessToken, GalleryApi, GalleryImage};
use crate::error::GalleryError;

/// Read back the whole collection after uploading. Any failure is returned
/// as-is; there is nothing left to attempt afterwards.
pub async fn fetch_all<G>(gallery: &G, token: &AccessToken) -> Result<Vec<GalleryImage>, GalleryError>
where
    G: GalleryApi + ?Sized,
{
    let images = gallery.list_images(token).await?;
    info!(count = images.len(), "[VERIFY] Gallery images retrieved");
    Ok(images)
}
