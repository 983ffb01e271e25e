//! Values passed between pipeline stages and the per-item outcomes they report.

use std::fmt;
use std::path::PathBuf;

use crate::config::WorkItem;
use crate::http_transport::HttpFailure;

/// Fetchable image location produced by the entity resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
}

/// Downloaded body plus the extension taken from the source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImageBytes {
    pub bytes: Vec<u8>,
    /// Includes the leading dot (`.jpg`); empty when the URL has none.
    pub extension: String,
}

/// Why a lookup ended without an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    NoSearchResult,
    NoImageClaim { entity_id: String },
    /// Network, JSON or shape failure during lookup.
    LookupFailed(String),
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSearchResult => write!(f, "no search result"),
            Self::NoImageClaim { entity_id } => write!(f, "no image claim on {entity_id}"),
            Self::LookupFailed(message) => write!(f, "lookup failed: {message}"),
        }
    }
}

/// Result of resolving a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ResolvedImage),
    NotFound(NotFoundReason),
}

/// Terminal state of one work item in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Saved { path: PathBuf },
    AlreadyPresent { path: PathBuf },
    NotFound(NotFoundReason),
    HttpError(HttpFailure),
    DecodeError(String),
    WriteError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub item: WorkItem,
    pub outcome: ItemOutcome,
}

/// Ordered outcomes for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn count_where(&self, predicate: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "total={} saved={} skipped={} not_found={} http_error={} decode_error={} write_error={}",
            self.items.len(),
            self.count_where(|outcome| matches!(outcome, ItemOutcome::Saved { .. })),
            self.count_where(|outcome| matches!(outcome, ItemOutcome::AlreadyPresent { .. })),
            self.count_where(|outcome| matches!(outcome, ItemOutcome::NotFound(_))),
            self.count_where(|outcome| matches!(outcome, ItemOutcome::HttpError(_))),
            self.count_where(|outcome| matches!(outcome, ItemOutcome::DecodeError(_))),
            self.count_where(|outcome| matches!(outcome, ItemOutcome::WriteError(_))),
        )
    }
}

/// Terminal state of one file in the normalization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Written { path: PathBuf, side: u32 },
    DecodeError(String),
    WriteError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeFileReport {
    pub source: PathBuf,
    pub outcome: NormalizeOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub files: Vec<NormalizeFileReport>,
}

impl NormalizeReport {
    pub fn written_count(&self) -> usize {
        self.files
            .iter()
            .filter(|report| matches!(report.outcome, NormalizeOutcome::Written { .. }))
            .count()
    }

    pub fn summary_line(&self) -> String {
        let written = self.written_count();
        format!(
            "scanned={} written={} failed={}",
            self.files.len(),
            written,
            self.files.len().saturating_sub(written)
        )
    }
}
