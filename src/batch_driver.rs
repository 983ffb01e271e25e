//! Sequential ingest over the configured work list.
//!
//! Items run strictly in list order, one at a time, each preceded by a pacing
//! wait. Every per-item failure is contained in its `ItemOutcome`.

use log::{error, info, warn};

use crate::config::{Config, IngestMode, WorkItem};
use crate::entity_resolver::EntityResolver;
use crate::http_transport::HttpTransport;
use crate::image_fetcher;
use crate::image_store::{ImageStore, StoreError};
use crate::protocol::{BatchReport, ItemOutcome, ItemReport, Resolution};
use crate::request_pacer::RequestPacer;

pub struct BatchDriver<'a> {
    config: &'a Config,
    transport: &'a dyn HttpTransport,
    resolver: EntityResolver<'a>,
    store: ImageStore,
}

impl<'a> BatchDriver<'a> {
    pub fn new(config: &'a Config, transport: &'a dyn HttpTransport) -> Self {
        Self {
            config,
            transport,
            resolver: EntityResolver::new(transport, &config.lookup),
            store: ImageStore::new(&config.output.images_dir),
        }
    }

    /// Runs every item to completion. Never aborts on an item failure.
    pub fn run(&self, pacer: &mut dyn RequestPacer) -> BatchReport {
        let mut report = BatchReport::default();
        if let Err(err) = self.store.ensure_dir() {
            error!("Batch: cannot prepare output directory: {}", err);
            return report;
        }

        info!(
            "Batch starting: {} items into {}",
            self.config.items.len(),
            self.store.images_dir().display()
        );
        for item in &self.config.items {
            pacer.pace();
            let outcome = self.process_item(item);
            report.items.push(ItemReport {
                item: item.clone(),
                outcome,
            });
        }
        info!("Batch finished: {}", report.summary_line());
        report
    }

    pub fn process_item(&self, item: &WorkItem) -> ItemOutcome {
        if let Some(path) = self.store.existing_output(&item.logical_name) {
            info!(
                "[{}] already present at {}, skipping",
                item.logical_name,
                path.display()
            );
            return ItemOutcome::AlreadyPresent { path };
        }

        let image = match self.resolver.resolve(&item.display_name) {
            Resolution::Found(image) => image,
            Resolution::NotFound(reason) => {
                info!(
                    "[{}] no image for '{}': {}",
                    item.logical_name, item.display_name, reason
                );
                return ItemOutcome::NotFound(reason);
            }
        };

        let raw = match image_fetcher::fetch(self.transport, &image) {
            Ok(raw) => raw,
            Err(failure) => {
                warn!(
                    "[{}] download of {} failed: {}",
                    item.logical_name, image.url, failure
                );
                return ItemOutcome::HttpError(failure);
            }
        };

        let written = match self.config.processing.ingest_mode {
            IngestMode::StoreRaw => self.store.write_raw(&item.logical_name, &raw),
            IngestMode::CropOnIngest => self.store.write_cropped_png(
                &item.logical_name,
                &raw,
                self.config.processing.ingest_crop_anchor,
            ),
        };
        match written {
            Ok(path) => {
                info!("[{}] image saved as {}", item.logical_name, path.display());
                ItemOutcome::Saved { path }
            }
            Err(StoreError::Decode(message)) => {
                warn!(
                    "[{}] downloaded bytes from {} are not a decodable image: {}",
                    item.logical_name, image.url, message
                );
                ItemOutcome::DecodeError(message)
            }
            Err(StoreError::Write(message)) => {
                warn!("[{}] could not store image: {}", item.logical_name, message);
                ItemOutcome::WriteError(message)
            }
        }
    }
}
