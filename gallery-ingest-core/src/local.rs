//! Local filesystem image source.
//!
//! [`list_local_images`] takes a snapshot of the directory listing and returns
//! a lazy iterator that reads one file per step. Unreadable and empty files
//! are logged and skipped; only a missing or unlistable directory is an error.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::contract::ImageForCreation;
use crate::error::GalleryError;

pub const DEFAULT_CATEGORY: &str = "Local";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// One-shot sequence of images read from a directory.
#[derive(Debug)]
pub struct LocalImages {
    pending: std::vec::IntoIter<PathBuf>,
    category: String,
    skipped: usize,
}

impl LocalImages {
    /// Files skipped so far because they could not be read or were empty.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Candidate files not yet read.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl Iterator for LocalImages {
    type Item = ImageForCreation;

    fn next(&mut self) -> Option<ImageForCreation> {
        for path in self.pending.by_ref() {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %GalleryError::filesystem(&path, e), "Skipping unreadable image");
                    self.skipped += 1;
                    continue;
                }
            };
            match ImageForCreation::new(title_for(&path), self.category.clone(), bytes) {
                Ok(image) => {
                    debug!(path = %path.display(), size = image.bytes().len(), "Read local image");
                    return Some(image);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping empty image");
                    self.skipped += 1;
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.pending.len()))
    }
}

/// Scan `directory` for image files, sorted by file name.
pub fn list_local_images(
    directory: &Path,
    category: &str,
) -> Result<LocalImages, GalleryError> {
    let entries =
        std::fs::read_dir(directory).map_err(|e| GalleryError::filesystem(directory, e))?;

    let candidates = collect_candidates(entries.map(|entry| entry.map(|e| e.path())));

    info!(
        directory = %directory.display(),
        candidates = candidates.len(),
        "Scanned local image directory"
    );
    Ok(LocalImages {
        pending: candidates.into_iter(),
        category: category.to_string(),
        skipped: 0,
    })
}

/// Image files among `entries`, sorted by file name. Entries that cannot be
/// read are skipped.
fn collect_candidates<I>(entries: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = std::io::Result<PathBuf>>,
{
    let mut candidates = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if path.is_dir() || !has_image_extension(&path) {
            debug!(path = %path.display(), "Ignoring non-image entry");
            continue;
        }
        candidates.push(path);
    }
    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    candidates
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn title_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_image_extensions_case_insensitively() {
        assert!(has_image_extension(Path::new("a/b/photo.JPG")));
        assert!(has_image_extension(Path::new("photo.webp")));
        assert!(!has_image_extension(Path::new("notes.txt")));
        assert!(!has_image_extension(Path::new("README")));
    }

    #[test]
    fn unreadable_entry_does_not_abort_the_listing() {
        let entries = vec![
            Ok(PathBuf::from("b.png")),
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")),
            Ok(PathBuf::from("notes.txt")),
            Ok(PathBuf::from("a.jpg")),
        ];
        assert_eq!(
            collect_candidates(entries),
            vec![PathBuf::from("a.jpg"), PathBuf::from("b.png")]
        );
    }

    #[test]
    fn title_is_file_stem() {
        assert_eq!(title_for(Path::new("/data/9982986024_0d2a4f9b20_z.jpg")), "9982986024_0d2a4f9b20_z");
    }
}
