use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::storage::data_dir;
use crate::StorageError;

/// Storage key the mind map record lives under.
pub const MINDMAP_STORAGE_KEY: &str = "snaapmap-mindmap";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    pub history_capacity: usize,
    pub snapshot_debounce_ms: u64,
    pub storage_key: String,
    pub export_file_name: String,
    pub export_background: String,
    pub export_scale: f32,
    pub fit_view_padding: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history_capacity: crate::history::DEFAULT_CAPACITY,
            snapshot_debounce_ms: 300,
            storage_key: MINDMAP_STORAGE_KEY.to_string(),
            export_file_name: "mindmap.png".to_string(),
            export_background: "#1e293b".to_string(),
            export_scale: 1.0,
            fit_view_padding: 0.2,
        }
    }
}

impl EditorSettings {
    pub fn snapshot_debounce(&self) -> Duration {
        Duration::from_millis(self.snapshot_debounce_ms)
    }
}

fn settings_path(dir: &Path) -> PathBuf {
    dir.join("settings.json")
}

/// Read settings from the default data directory.
pub fn read_settings() -> EditorSettings {
    read_settings_from(&data_dir())
}

/// Missing or unreadable settings fall back to defaults.
pub fn read_settings_from(dir: &Path) -> EditorSettings {
    let path = settings_path(dir);
    if !path.exists() {
        return EditorSettings::default();
    }
    match fs::read_to_string(&path)
        .map_err(StorageError::from)
        .and_then(|s| serde_json::from_str::<EditorSettings>(&s).map_err(StorageError::from))
    {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable editor settings");
            EditorSettings::default()
        }
    }
}

pub fn write_settings(settings: &EditorSettings) -> Result<(), StorageError> {
    write_settings_to(&data_dir(), settings)
}

pub fn write_settings_to(dir: &Path, settings: &EditorSettings) -> Result<(), StorageError> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(settings_path(dir), json)?;
    Ok(())
}
