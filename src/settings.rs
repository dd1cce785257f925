use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::assets::DEFAULT_WORKERS;
use crate::document::DEFAULT_DOCUMENT;

pub const CURRENT_VERSION: u32 = 1;
pub const APP_NAME: &str = "gallerysync";
const SETTINGS_FILENAME: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Chapter image index (keyed map or generator metadata list)
    #[serde(default = "default_metadata")]
    pub metadata: PathBuf,

    /// Chapter start pages; the built-in table is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<PathBuf>,

    /// Directory image sources are relative to
    #[serde(default = "default_artwork_dir")]
    pub artwork_dir: PathBuf,

    /// Base reference of the companion document
    #[serde(default = "default_document")]
    pub document: String,

    #[serde(default = "default_workers")]
    pub loader_workers: usize,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_artwork_dir() -> PathBuf {
    PathBuf::from("zhuangzi_artwork")
}

fn default_metadata() -> PathBuf {
    default_artwork_dir().join("chapter_images_metadata.json")
}

fn default_document() -> String {
    DEFAULT_DOCUMENT.to_string()
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            metadata: default_metadata(),
            pages: None,
            artwork_dir: default_artwork_dir(),
            document: default_document(),
            loader_workers: default_workers(),
        }
    }
}

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the config directory, writing defaults on first run
pub fn load_settings() -> Settings {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return Settings::default();
    };
    if path.exists() {
        load_settings_from_path(&path)
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        let settings = Settings::default();
        save_settings_to_file(&settings, &path);
        settings
    }
}

pub fn load_settings_from_path(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }
                settings
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
                Settings::default()
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            Settings::default()
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = match serde_yaml::to_string(settings) {
        Ok(yaml) => format!("{SETTINGS_HEADER}{yaml}"),
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# gallerysync settings
#
# metadata:      chapter image index, either {"1": [records...]} or the flat
#                list written by the artwork generator
# pages:         optional JSON/YAML map of chapter -> start page
# artwork_dir:   directory image paths are relative to
# document:      companion document shown next to the artwork
# loader_workers: background threads decoding artwork

"#;
