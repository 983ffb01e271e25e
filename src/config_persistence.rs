//! Optional on-disk configuration loading.

use std::path::Path;

use log::{info, warn};

use crate::config::{sanitize_config, Config};

pub const CONFIG_FILE_NAME: &str = "portrait_fetch.toml";

/// Parses config text, falling back to defaults on malformed input.
pub fn parse_config_text(text: &str, origin: &Path) -> Config {
    match toml::from_str::<Config>(text) {
        Ok(config) => sanitize_config(config),
        Err(err) => {
            warn!(
                "Failed to parse config file {}. Using built-in defaults. error={}",
                origin.display(),
                err
            );
            sanitize_config(Config::default())
        }
    }
}

/// Loads `path` when it exists; a missing file means built-in defaults.
pub fn load_config_file(path: &Path) -> Config {
    if !path.exists() {
        info!(
            "Config file not found. Using built-in defaults. path={}",
            path.display()
        );
        return sanitize_config(Config::default());
    }

    let config_content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(
                "Failed to read config file {}. Using built-in defaults. error={}",
                path.display(),
                err
            );
            return sanitize_config(Config::default());
        }
    };

    info!("Loaded config. path={}", path.display());
    parse_config_text(&config_content, path)
}

#[cfg(test)]
mod tests {
    use super::{load_config_file, parse_config_text};
    use crate::config::{Config, CropAnchor, WorkItem};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_config_path(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be valid")
            .as_nanos();
        std::env::temp_dir().join(format!("portrait_fetch_{name}_{nonce}.toml"))
    }

    #[test]
    fn test_missing_config_file_yields_defaults() {
        let path = unique_temp_config_path("missing");
        assert_eq!(load_config_file(&path), Config::default());
    }

    #[test]
    fn test_malformed_config_text_yields_defaults() {
        let parsed = parse_config_text("[processing\nmax_edge_px = ", Path::new("broken.toml"));
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_config_file_overrides_are_applied_and_sanitized() {
        let path = unique_temp_config_path("override");
        fs::write(
            &path,
            r#"
[processing]
normalize_crop_anchor = "center"
max_edge_px = 0

[[items]]
logical_name = "plato"
display_name = "Plato"
"#,
        )
        .expect("should write config fixture");

        let loaded = load_config_file(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.processing.normalize_crop_anchor, CropAnchor::Center);
        assert_eq!(loaded.processing.max_edge_px, 1);
        assert_eq!(loaded.items, vec![WorkItem::new("plato", "Plato")]);
    }

    #[test]
    fn test_system_template_parses_through_loader() {
        let parsed = parse_config_text(
            include_str!("../config/config.system.toml"),
            Path::new("system"),
        );
        assert_eq!(parsed, Config::default());
    }
}
