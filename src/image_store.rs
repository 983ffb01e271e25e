//! Raw image directory: existence guard plus the two ingest writers.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CropAnchor;
use crate::image_pipeline;
use crate::protocol::RawImageBytes;

/// Extensions checked by the existence guard.
pub const GUARDED_EXTENSIONS: [&str; 2] = [".jpg", ".png"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Decode(String),
    Write(String),
}

pub struct ImageStore {
    images_dir: PathBuf,
}

impl ImageStore {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.images_dir)
            .map_err(|error| format!("create {}: {error}", self.images_dir.display()))
    }

    /// First of `<name>.jpg` / `<name>.png` that exists. Content is not checked.
    pub fn existing_output(&self, logical_name: &str) -> Option<PathBuf> {
        GUARDED_EXTENSIONS
            .iter()
            .map(|extension| self.output_path(logical_name, extension))
            .find(|candidate| candidate.is_file())
    }

    fn output_path(&self, logical_name: &str, extension: &str) -> PathBuf {
        self.images_dir.join(format!("{logical_name}{extension}"))
    }

    /// Writes the bytes unmodified to `<name><raw.extension>`.
    pub fn write_raw(
        &self,
        logical_name: &str,
        raw: &RawImageBytes,
    ) -> Result<PathBuf, StoreError> {
        let target_path = self.output_path(logical_name, &raw.extension);
        let temp_path = self.output_path(logical_name, &format!("{}.tmp", raw.extension));
        fs::write(&temp_path, &raw.bytes).map_err(|error| {
            StoreError::Write(format!("write {}: {error}", temp_path.display()))
        })?;
        fs::rename(&temp_path, &target_path).map_err(|error| {
            let _ = fs::remove_file(&temp_path);
            StoreError::Write(format!("rename into {}: {error}", target_path.display()))
        })?;
        Ok(target_path)
    }

    /// Decodes, square-crops with `anchor`, and writes `<name>.png`.
    pub fn write_cropped_png(
        &self,
        logical_name: &str,
        raw: &RawImageBytes,
        anchor: CropAnchor,
    ) -> Result<PathBuf, StoreError> {
        let decoded = image_pipeline::decode_image_from_memory_with_fallback(&raw.bytes)
            .map_err(StoreError::Decode)?;
        let rgba = image::DynamicImage::ImageRgba8(decoded.into_rgba8());
        let cropped = image_pipeline::crop_square(&rgba, anchor);
        let target_path = self.output_path(logical_name, ".png");
        image_pipeline::save_png_atomic(&cropped, &target_path).map_err(StoreError::Write)?;
        Ok(target_path)
    }
}
