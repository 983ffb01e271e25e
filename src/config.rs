//! Batch job configuration model and defaults.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use log::warn;

/// Root configuration, optionally loaded from `portrait_fetch.toml`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Output directory layout.
    pub output: OutputConfig,
    #[serde(default)]
    /// Metadata and media endpoints.
    pub lookup: LookupConfig,
    #[serde(default)]
    /// HTTP client identity and pacing.
    pub http: HttpConfig,
    #[serde(default)]
    /// Ingest and normalization policies.
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Ordered work list processed by the batch driver.
    #[serde(default = "default_work_items")]
    pub items: Vec<WorkItem>,
}

/// One entity to look up: on-disk stem plus search query.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct WorkItem {
    /// Filesystem-safe stem for raw and processed files.
    pub logical_name: String,
    /// Human-readable query sent to the search endpoint.
    pub display_name: String,
}

impl WorkItem {
    pub fn new(logical_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct LookupConfig {
    #[serde(default = "default_language")]
    pub language: String,
    /// Action API used for `wbsearchentities`.
    #[serde(default = "default_search_api_url")]
    pub search_api_url: String,
    /// Per-entity JSON document base; `<base>/<id>.json`.
    #[serde(default = "default_entity_data_url")]
    pub entity_data_url: String,
    /// Redirecting media endpoint; `<base>/<file_name>`.
    #[serde(default = "default_media_file_path_url")]
    pub media_file_path_url: String,
    /// Claim key holding the image file name.
    #[serde(default = "default_image_property")]
    pub image_property: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Minimum spacing between consecutive work items.
    #[serde(default = "default_request_interval_ms")]
    pub request_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ProcessingConfig {
    #[serde(default)]
    pub ingest_mode: IngestMode,
    #[serde(default = "default_ingest_crop_anchor")]
    pub ingest_crop_anchor: CropAnchor,
    #[serde(default = "default_normalize_crop_anchor")]
    pub normalize_crop_anchor: CropAnchor,
    /// Upper bound for both edges of a processed image.
    #[serde(default = "default_max_edge_px")]
    pub max_edge_px: u32,
    #[serde(default = "default_true")]
    pub normalize_after_batch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

/// How fetched bytes are persisted by the batch driver.
#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// Write the downloaded bytes verbatim with the URL's extension.
    #[default]
    StoreRaw,
    /// Decode, square-crop and re-encode as `<logical_name>.png`.
    CropOnIngest,
}

/// Placement of the square window when cropping the longer dimension.
#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CropAnchor {
    /// Centered on both axes.
    Center,
    /// Centered horizontally, anchored at the top edge.
    Top,
}

#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            lookup: LookupConfig::default(),
            http: HttpConfig::default(),
            processing: ProcessingConfig::default(),
            logging: LoggingConfig::default(),
            items: default_work_items(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            processed_dir: default_processed_dir(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            search_api_url: default_search_api_url(),
            entity_data_url: default_entity_data_url(),
            media_file_path_url: default_media_file_path_url(),
            image_property: default_image_property(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_interval_ms: default_request_interval_ms(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            ingest_mode: IngestMode::StoreRaw,
            ingest_crop_anchor: default_ingest_crop_anchor(),
            normalize_crop_anchor: default_normalize_crop_anchor(),
            max_edge_px: default_max_edge_px(),
            normalize_after_batch: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("processed")
}

fn default_language() -> String {
    "en".to_string()
}

fn default_search_api_url() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}

fn default_entity_data_url() -> String {
    "https://www.wikidata.org/wiki/Special:EntityData".to_string()
}

fn default_media_file_path_url() -> String {
    "https://commons.wikimedia.org/wiki/Special:FilePath".to_string()
}

fn default_image_property() -> String {
    "P18".to_string()
}

fn default_user_agent() -> String {
    "portrait_fetch/0.1.0 (personal portrait batch job; contact: portrait-fetch@users.noreply.github.com)"
        .to_string()
}

fn default_request_interval_ms() -> u64 {
    1_000
}

fn default_ingest_crop_anchor() -> CropAnchor {
    CropAnchor::Center
}

fn default_normalize_crop_anchor() -> CropAnchor {
    CropAnchor::Top
}

fn default_max_edge_px() -> u32 {
    1024
}

/// Returns the built-in work list used when no config file overrides it.
pub fn default_work_items() -> Vec<WorkItem> {
    vec![
        WorkItem::new("tolstoy", "Leo Tolstoy"),
        WorkItem::new("solovyov", "Vladimir Solovyov"),
        WorkItem::new("berdyaev", "Nikolai Berdyaev"),
        WorkItem::new("bakunin", "Mikhail Bakunin"),
        WorkItem::new("kropotkin", "Peter Kropotkin"),
        WorkItem::new("florensky", "Pavel Florensky"),
        WorkItem::new("rozanov", "Vasily Rozanov"),
    ]
}

fn restore_if_blank(value: &mut String, fallback: fn() -> String) {
    if value.trim().is_empty() {
        *value = fallback();
    }
}

/// Clamps numeric knobs and drops unusable work items.
pub fn sanitize_config(config: Config) -> Config {
    let mut sanitized = config;

    sanitized.processing.max_edge_px = sanitized.processing.max_edge_px.max(1);
    sanitized.http.request_interval_ms = sanitized.http.request_interval_ms.max(1);

    restore_if_blank(&mut sanitized.lookup.language, default_language);
    restore_if_blank(&mut sanitized.lookup.search_api_url, default_search_api_url);
    restore_if_blank(&mut sanitized.lookup.entity_data_url, default_entity_data_url);
    restore_if_blank(
        &mut sanitized.lookup.media_file_path_url,
        default_media_file_path_url,
    );
    restore_if_blank(&mut sanitized.lookup.image_property, default_image_property);
    restore_if_blank(&mut sanitized.http.user_agent, default_user_agent);

    if sanitized.output.images_dir.as_os_str().is_empty() {
        sanitized.output.images_dir = default_images_dir();
    }
    if sanitized.output.processed_dir.as_os_str().is_empty() {
        sanitized.output.processed_dir = default_processed_dir();
    }

    sanitized.items.retain(|item| {
        if item.logical_name.trim().is_empty() || item.display_name.trim().is_empty() {
            warn!(
                "Dropping work item with blank name: logical='{}' display='{}'",
                item.logical_name, item.display_name
            );
            return false;
        }
        if !is_plain_file_stem(&item.logical_name) {
            warn!(
                "Dropping work item '{}': logical name must be a single file name component",
                item.logical_name
            );
            return false;
        }
        true
    });

    sanitized
}

/// Logical names become `<images_dir>/<name><ext>`; anything other than one
/// normal path component could land outside the output directory.
fn is_plain_file_stem(name: &str) -> bool {
    if name.contains('/') || name.contains('\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(component)), None) if component == OsStr::new(name)
    )
}
