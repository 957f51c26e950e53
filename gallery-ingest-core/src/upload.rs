//! Upload coordinator: one authenticated POST per image, strictly in order.

use tracing::{error, info, warn};

use crate::contract::{
    AccessToken, GalleryApi, ImageForCreation, UploadOutcome, UploadReport, UploadStatus,
};
use crate::error::GalleryError;

/// Upload every image in `images`, in order, one request at a time.
///
/// A non-2xx answer is recorded in the report and the loop moves on, so the
/// number of attempts always equals the number of images. Only a failure to
/// reach the gallery at all stops the loop and is returned as an error.
pub async fn upload_all<G, I>(
    gallery: &G,
    token: &AccessToken,
    images: I,
) -> Result<UploadReport, GalleryError>
where
    G: GalleryApi + ?Sized,
    I: IntoIterator<Item = ImageForCreation>,
{
    let mut report = UploadReport::default();

    for image in images {
        info!(image = %image, "[UPLOAD] Posting image");
        let status = match gallery.create_image(token, &image).await {
            Ok(status) => {
                info!(title = image.title(), status, "[UPLOAD] Image created");
                UploadStatus::Created(status)
            }
            Err(e) if e.is_fatal_for_uploads() => {
                error!(title = image.title(), error = %e, "[UPLOAD][ERROR] Aborting upload loop");
                return Err(e);
            }
            Err(e) => {
                warn!(title = image.title(), error = %e, "[UPLOAD] Image rejected");
                UploadStatus::Failed {
                    status: e.status(),
                    reason: e.to_string(),
                }
            }
        };
        report.outcomes.push(UploadOutcome {
            title: image.title().to_string(),
            status,
        });
    }

    info!(
        attempted = report.attempted(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        "[UPLOAD] Finished"
    );
    Ok(report)
}
