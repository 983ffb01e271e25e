use std::path::{Path, PathBuf};

use log::debug;

pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

pub fn is_supported_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_IMAGE_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Image files directly inside `folder_path`, sorted. Subdirectories are not visited.
pub fn collect_image_files_from_folder(folder_path: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = std::fs::read_dir(folder_path)
        .map_err(|err| format!("Failed to read directory {}: {}", folder_path.display(), err))?;
    let mut images = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(
                    "Failed to read a directory entry in {}: {}",
                    folder_path.display(),
                    err
                );
                continue;
            }
        };

        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(err) => {
                debug!("Failed to inspect {}: {}", path.display(), err);
                continue;
            }
        };

        if file_type.is_file() && is_supported_image_file(&path) {
            images.push(path);
        } else {
            debug!("Ignoring non-image entry {}", path.display());
        }
    }

    images.sort_unstable();
    Ok(images)
}
