//! User settings consumed (read-only) by a synchronization pass.
//!
//! Field names on disk match the Obsidian plugin's `data.json`, so an
//! existing plugin configuration can be loaded as-is.

use obsidian_fs::{join_path, normalize_path, validate_relative_path};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters that can never appear in a flat-mode separator (they split paths)
const FORBIDDEN_SEPARATOR_CHARS: &[char] = &['/', '\\', ':'];

/// Characters that break Obsidian wiki-links when used in a note name
const LINK_BREAKING_CHARS: &[char] = &['#', '^', '[', ']', '|'];

/// What to do with notes whose project no longer exists remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletedProjectHandling {
    /// Leave the note where it is
    Ignore,
    /// Move the note into the archive folder
    #[default]
    Archive,
    /// Delete the note permanently
    Delete,
}

impl std::str::FromStr for DeletedProjectHandling {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "archive" => Ok(Self::Archive),
            "delete" => Ok(Self::Delete),
            other => Err(SettingsError::InvalidValue {
                key: "deletedProjectHandling".to_string(),
                reason: format!("expected ignore, archive or delete, got '{}'", other),
            }),
        }
    }
}

/// How project names turn into note paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Naming {
    /// One folder per hierarchy level: `Work/Website/Launch`
    Nested,
    /// All ancestor names in one file name: `Work ~ Website ~ Launch`
    Flat { separator: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Todoist API token
    #[serde(rename = "apikey")]
    pub api_key: String,
    /// Folder (relative to the vault) holding the project notes; `/` is the vault root
    #[serde(rename = "notefolder")]
    pub note_folder: String,
    /// Nested folders (true) or flat file names (false)
    pub nested: bool,
    /// Separator between project names in flat mode
    pub separator: String,
    #[serde(rename = "deletedProjectHandling")]
    pub deleted_project_handling: DeletedProjectHandling,
    /// Archive folder, relative to the note folder
    #[serde(rename = "archivefolder")]
    pub archive_folder: String,
    /// Insert a link to the project note into every task description
    #[serde(rename = "linktasks")]
    pub link_tasks: bool,
    /// Template note merged into newly created project notes (empty: none)
    #[serde(rename = "templatefile")]
    pub template_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            note_folder: String::new(),
            nested: true,
            separator: " ~ ".to_string(),
            deleted_project_handling: DeletedProjectHandling::Archive,
            archive_folder: "__ArchivedNotes".to_string(),
            link_tasks: false,
            template_file: String::new(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("Please enter your Todoist API key in the settings")]
    MissingApiKey,

    #[error("No folder is set for the project notes")]
    MissingNoteFolder,

    #[error("The separator string cannot contain any of these characters: / \\ :")]
    InvalidSeparator,

    #[error("An archive folder is required when deleted projects are archived")]
    MissingArchiveFolder,

    #[error("Invalid path for {key}: {reason}")]
    InvalidPath { key: String, reason: String },

    #[error("Unknown setting '{0}'")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl Settings {
    /// Check everything a pass relies on.
    ///
    /// An empty note folder is reported as `MissingNoteFolder` so the caller
    /// can ask whether to use the vault root instead.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.api_key.trim().is_empty() {
            return Err(SettingsError::MissingApiKey);
        }
        if self.note_folder.trim().is_empty() {
            return Err(SettingsError::MissingNoteFolder);
        }
        check_path("notefolder", &self.note_folder)?;
        check_path("archivefolder", &self.archive_folder)?;
        if !self.template_file.trim().is_empty() {
            check_path("templatefile", &self.template_file)?;
        }
        if !self.nested && self.separator.contains(FORBIDDEN_SEPARATOR_CHARS) {
            return Err(SettingsError::InvalidSeparator);
        }
        if self.deleted_project_handling == DeletedProjectHandling::Archive
            && normalize_path(&self.archive_folder).is_empty()
        {
            return Err(SettingsError::MissingArchiveFolder);
        }
        Ok(())
    }

    /// Warning for separators that are legal but break wiki-links.
    pub fn separator_warning(&self) -> Option<&'static str> {
        if self.separator.contains(FORBIDDEN_SEPARATOR_CHARS) {
            Some("The separator string cannot contain any of these characters: / \\ :")
        } else if self.separator.contains(LINK_BREAKING_CHARS) {
            Some("Obsidian's file linking will break if the separator includes any of these: # ^ [ ] |")
        } else {
            None
        }
    }

    pub fn naming(&self) -> Naming {
        if self.nested {
            Naming::Nested
        } else {
            Naming::Flat {
                separator: self.separator.clone(),
            }
        }
    }

    /// Normalized note root ("" for the vault root)
    pub fn note_root(&self) -> String {
        normalize_path(&self.note_folder)
    }

    /// Normalized archive folder path, inside the note root
    pub fn archive_path(&self) -> String {
        join_path(&[&self.note_folder, &self.archive_folder])
    }

    /// Normalized template note path, if a template is configured
    pub fn template_path(&self) -> Option<String> {
        let path = normalize_path(&self.template_file);
        if path.is_empty() { None } else { Some(path) }
    }

    /// Set a field from its on-disk key name (settings edit surface).
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match key {
            "apikey" => self.api_key = value.trim().to_string(),
            "notefolder" => self.note_folder = value.to_string(),
            "nested" => self.nested = parse_bool(key, value)?,
            "separator" => self.separator = value.to_string(),
            "deletedProjectHandling" => self.deleted_project_handling = value.parse()?,
            "archivefolder" => self.archive_folder = value.to_string(),
            "linktasks" => self.link_tasks = parse_bool(key, value)?,
            "templatefile" => self.template_file = value.to_string(),
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn check_path(key: &str, path: &str) -> Result<(), SettingsError> {
    validate_relative_path(path)
        .map(|_| ())
        .map_err(|e| SettingsError::InvalidPath {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(SettingsError::InvalidValue {
            key: key.to_string(),
            reason: format!("expected true or false, got '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Settings {
        Settings {
            api_key: "token".to_string(),
            note_folder: "Projects".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn defaults_match_plugin() {
        let s = Settings::default();
        assert!(s.nested);
        assert_eq!(s.separator, " ~ ");
        assert_eq!(s.deleted_project_handling, DeletedProjectHandling::Archive);
        assert_eq!(s.archive_folder, "__ArchivedNotes");
        assert!(!s.link_tasks);
    }

    #[test]
    fn loads_plugin_data_json_with_missing_fields() {
        let s: Settings = serde_json::from_str(
            r#"{"apikey": "abc", "notefolder": "Todoist", "nested": false, "deletedProjectHandling": "delete"}"#,
        )
        .unwrap();

        assert_eq!(s.api_key, "abc");
        assert_eq!(s.note_folder, "Todoist");
        assert_eq!(s.deleted_project_handling, DeletedProjectHandling::Delete);
        assert_eq!(s.separator, " ~ ");
        assert_eq!(s.naming(), Naming::Flat { separator: " ~ ".to_string() });
    }

    #[test]
    fn serializes_with_plugin_keys() {
        let json = serde_json::to_value(valid()).unwrap();
        assert_eq!(json["apikey"], "token");
        assert_eq!(json["deletedProjectHandling"], "archive");
        assert_eq!(json["archivefolder"], "__ArchivedNotes");
    }

    #[test]
    fn validate_requires_api_key_and_folder() {
        let mut s = valid();
        s.api_key.clear();
        assert_eq!(s.validate(), Err(SettingsError::MissingApiKey));

        let mut s = valid();
        s.note_folder.clear();
        assert_eq!(s.validate(), Err(SettingsError::MissingNoteFolder));

        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_path_separator_in_flat_mode_only() {
        let mut s = valid();
        s.separator = " / ".to_string();
        assert_eq!(s.validate(), Ok(()));

        s.nested = false;
        assert_eq!(s.validate(), Err(SettingsError::InvalidSeparator));
    }

    #[test]
    fn validate_rejects_traversal() {
        let mut s = valid();
        s.archive_folder = "../outside".to_string();
        assert!(matches!(s.validate(), Err(SettingsError::InvalidPath { .. })));
    }

    #[test]
    fn validate_requires_archive_folder_when_archiving() {
        let mut s = valid();
        s.archive_folder = "/".to_string();
        assert_eq!(s.validate(), Err(SettingsError::MissingArchiveFolder));

        s.deleted_project_handling = DeletedProjectHandling::Ignore;
        assert_eq!(s.validate(), Ok(()));
    }

    #[test]
    fn separator_warning_for_link_breaking_chars() {
        let mut s = valid();
        assert_eq!(s.separator_warning(), None);
        s.separator = " | ".to_string();
        assert!(s.separator_warning().unwrap().contains("linking"));
    }

    #[test]
    fn root_folder_paths() {
        let mut s = valid();
        s.note_folder = "/".to_string();
        assert_eq!(s.note_root(), "");
        assert_eq!(s.archive_path(), "__ArchivedNotes");

        s.note_folder = "Projects/".to_string();
        assert_eq!(s.archive_path(), "Projects/__ArchivedNotes");
    }

    #[test]
    fn set_by_key() {
        let mut s = valid();
        s.set("nested", "false").unwrap();
        s.set("deletedProjectHandling", "Ignore").unwrap();
        s.set("templatefile", "Templates/Project").unwrap();

        assert!(!s.nested);
        assert_eq!(s.deleted_project_handling, DeletedProjectHandling::Ignore);
        assert_eq!(s.template_path().as_deref(), Some("Templates/Project"));
        assert!(matches!(s.set("colour", "red"), Err(SettingsError::UnknownKey(_))));
        assert!(matches!(s.set("linktasks", "maybe"), Err(SettingsError::InvalidValue { .. })));
    }
}
