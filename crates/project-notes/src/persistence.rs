//! Persistence for plugin settings.
//!
//! Settings are stored as JSON with the Obsidian plugin's key names, so a
//! plugin `data.json` can be used directly as the settings file.

use anyhow::{Context, Result};
use project_sync::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings file on disk.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields the defaults.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!("No settings file at {:?}, using defaults", self.path);
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let settings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings file {}", self.path.display()))?;
        Ok(settings)
    }

    /// Write settings through a temp file and rename, so a crash never
    /// leaves a half-written file behind.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}
