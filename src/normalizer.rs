//! Post-processing pass: every raw image becomes a bounded square PNG.

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::config::{Config, CropAnchor};
use crate::image_pipeline;
use crate::media_file_discovery;
use crate::protocol::{NormalizeFileReport, NormalizeOutcome, NormalizeReport};

pub struct Normalizer {
    source_dir: PathBuf,
    processed_dir: PathBuf,
    anchor: CropAnchor,
    max_edge_px: u32,
}

impl Normalizer {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        processed_dir: impl Into<PathBuf>,
        anchor: CropAnchor,
        max_edge_px: u32,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            processed_dir: processed_dir.into(),
            anchor,
            max_edge_px: max_edge_px.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.output.images_dir,
            &config.output.processed_dir,
            config.processing.normalize_crop_anchor,
            config.processing.max_edge_px,
        )
    }

    /// Output path for `source`: same stem, `.png`, in the processed dir.
    pub fn processed_path_for(&self, source: &Path) -> Option<PathBuf> {
        let stem = source.file_stem()?;
        let mut file_name = stem.to_os_string();
        file_name.push(".png");
        Some(self.processed_dir.join(file_name))
    }

    /// Processes every recognized image; per-file failures are logged and skipped.
    pub fn run(&self) -> NormalizeReport {
        let mut report = NormalizeReport::default();
        if let Err(err) = fs::create_dir_all(&self.processed_dir) {
            error!(
                "Normalize: cannot create {}: {}",
                self.processed_dir.display(),
                err
            );
            return report;
        }
        let sources = match media_file_discovery::collect_image_files_from_folder(&self.source_dir)
        {
            Ok(sources) => sources,
            Err(err) => {
                error!("Normalize: {}", err);
                return report;
            }
        };

        for source in sources {
            let outcome = self.normalize_file(&source);
            match &outcome {
                NormalizeOutcome::Written { path, side } => info!(
                    "Normalize: {} -> {} ({}x{})",
                    source.display(),
                    path.display(),
                    side,
                    side
                ),
                NormalizeOutcome::DecodeError(message) => {
                    warn!("Normalize: cannot decode {}: {}", source.display(), message)
                }
                NormalizeOutcome::WriteError(message) => {
                    warn!("Normalize: cannot write {}: {}", source.display(), message)
                }
            }
            report.files.push(NormalizeFileReport { source, outcome });
        }

        info!("Normalize finished: {}", report.summary_line());
        report
    }

    fn normalize_file(&self, source: &Path) -> NormalizeOutcome {
        let Some(target_path) = self.processed_path_for(source) else {
            return NormalizeOutcome::WriteError(format!(
                "no file stem in {}",
                source.display()
            ));
        };
        let decoded = match image_pipeline::decode_image_from_path_with_fallback(source) {
            Ok(decoded) => decoded,
            Err(message) => return NormalizeOutcome::DecodeError(message),
        };
        let thumbnail = image_pipeline::square_thumbnail(decoded, self.anchor, self.max_edge_px);
        let side = thumbnail.width();
        match image_pipeline::save_png_atomic(&thumbnail, &target_path) {
            Ok(()) => NormalizeOutcome::Written {
                path: target_path,
                side,
            },
            Err(message) => NormalizeOutcome::WriteError(message),
        }
    }
}
