//! Configuration file loading, validation and saving.
//!
//! The configuration is a JSON document with a fixed set of upper-case keys.
//! It is deserialized strictly (unknown or missing keys are rejected) and then
//! validated once, so the engine never has to re-check it.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Value of `DELETE_LOGS_AFTER_DAYS` / `DELETE_FILES_AFTER_DAYS` that disables the sweep.
pub const RETENTION_DISABLED: i64 = -1;

/// Validated configuration for one sorting run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SortConfig {
    /// Directory whose top-level files are classified
    pub download_folder_path: PathBuf,

    /// Keep byte-identical files under a disambiguated name instead of removing them
    pub allow_duplicates: bool,

    /// Age in days after which `.log` files are removed (negative disables)
    pub delete_logs_after_days: i64,

    /// Age in days after which sorted files are removed (zero or negative disables)
    pub delete_files_after_days: i64,

    /// Destination folders, in match priority order
    pub folders: FolderMap,
}

impl SortConfig {
    /// The layout written when no configuration file exists yet.
    pub fn template() -> Self {
        let mut folders = FolderMap::default();
        folders.push(
            "FOLDER_NAME",
            vec!["FILE_SUFFIX_1".to_string(), "FILE_SUFFIX_2".to_string()],
        );
        folders.push(
            "FOLDER_NAME2",
            vec!["FILE_SUFFIX_1".to_string(), "FILE_SUFFIX_2".to_string()],
        );

        SortConfig {
            download_folder_path: PathBuf::from("path/to/downloadfolder"),
            allow_duplicates: false,
            delete_logs_after_days: RETENTION_DISABLED,
            delete_files_after_days: RETENTION_DISABLED,
            folders,
        }
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    /// Returns `ConfigError::NotFound` if the file does not exist, `Parse` for
    /// malformed JSON or a key mismatch, and `Invalid` if validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let config: SortConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, writing the template if none exists.
    ///
    /// A freshly written template is never handed back as a usable
    /// configuration: the caller gets `ConfigError::TemplateCreated` and must
    /// stop so the user can edit the file.
    pub fn load_or_create_template(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound { .. }) => {
                Self::template().save(path)?;
                Err(ConfigError::TemplateCreated {
                    path: path.to_path_buf(),
                })
            }
            other => other,
        }
    }

    /// Write the configuration as pretty-printed JSON, preserving folder order.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Pretty-printed JSON form of this configuration.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Invalid {
            reason: format!("cannot serialize configuration: {}", e),
        })
    }

    /// Check the invariants that the JSON schema alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.download_folder_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "DOWNLOAD_FOLDER_PATH is empty".to_string(),
            });
        }
        if self.delete_logs_after_days < RETENTION_DISABLED {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "DELETE_LOGS_AFTER_DAYS must be -1 or greater, got {}",
                    self.delete_logs_after_days
                ),
            });
        }
        if self.delete_files_after_days < RETENTION_DISABLED {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "DELETE_FILES_AFTER_DAYS must be -1 or greater, got {}",
                    self.delete_files_after_days
                ),
            });
        }

        for rule in self.folders.iter() {
            validate_folder_name(&rule.name)?;
            if rule.suffixes.iter().any(|s| s.is_empty()) {
                return Err(ConfigError::Invalid {
                    reason: format!("folder '{}' has an empty suffix", rule.name),
                });
            }
        }
        Ok(())
    }
}

/// Reject names that would not create a direct child of the working directory.
pub fn validate_folder_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid {
            reason: "folder name is empty".to_string(),
        });
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(ConfigError::Invalid {
            reason: format!("folder name '{}' is not a plain directory name", name),
        });
    }
    Ok(())
}

/// A destination folder and the filename suffixes it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRule {
    pub name: String,
    pub suffixes: Vec<String>,
}

impl FolderRule {
    /// True if `file_name` ends with any accepted suffix (case-sensitive).
    pub fn matches(&self, file_name: &str) -> bool {
        self.suffixes.iter().any(|suffix| file_name.ends_with(suffix.as_str()))
    }
}

/// Ordered folder-name → suffixes mapping.
///
/// Serialized as a JSON object. Key order is significant (first match wins)
/// and survives a load/save round trip. Duplicate keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderMap {
    rules: Vec<FolderRule>,
}

impl FolderMap {
    pub fn iter(&self) -> impl Iterator<Item = &FolderRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FolderRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Append a folder at the lowest priority. Returns false if the name is taken.
    pub fn push(&mut self, name: impl Into<String>, suffixes: Vec<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.rules.push(FolderRule { name, suffixes });
        true
    }

    /// Rename a folder in place, keeping its priority.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> Result<(), ConfigError> {
        let new = new.into();
        if old != new && self.contains(&new) {
            return Err(ConfigError::Invalid {
                reason: format!("folder '{}' already exists", new),
            });
        }
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.name == old)
            .ok_or_else(|| ConfigError::Invalid {
                reason: format!("no folder named '{}'", old),
            })?;
        rule.name = new;
        Ok(())
    }

    /// Replace a folder's suffix list. Returns false if the folder is unknown.
    pub fn set_suffixes(&mut self, name: &str, suffixes: Vec<String>) -> bool {
        match self.rules.iter_mut().find(|r| r.name == name) {
            Some(rule) => {
                rule.suffixes = suffixes;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FolderRule> {
        let index = self.rules.iter().position(|r| r.name == name)?;
        Some(self.rules.remove(index))
    }
}

impl Serialize for FolderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for rule in &self.rules {
            map.serialize_entry(&rule.name, &rule.suffixes)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FolderMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FolderMapVisitor;

        impl<'de> Visitor<'de> for FolderMapVisitor {
            type Value = FolderMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of folder names to suffix lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FolderMap, A::Error> {
                let mut folders = FolderMap::default();
                while let Some((name, suffixes)) = access.next_entry::<String, Vec<String>>()? {
                    if folders.contains(&name) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate folder name '{}'",
                            name
                        )));
                    }
                    folders.rules.push(FolderRule { name, suffixes });
                }
                Ok(folders)
            }
        }

        deserializer.deserialize_map(FolderMapVisitor)
    }
}

/// Split a comma-separated suffix list as typed by a user, dropping blanks.
pub fn parse_suffix_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "DOWNLOAD_FOLDER_PATH": "/tmp/downloads",
        "ALLOW_DUPLICATES": false,
        "DELETE_LOGS_AFTER_DAYS": -1,
        "DELETE_FILES_AFTER_DAYS": 30,
        "FOLDERS": {
            "Zips": [".zip", ".tar.gz"],
            "Docs": [".pdf"],
            "Audio": []
        }
    }"#;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.json");
        fs::write(&path, contents).expect("Failed to write config");
        path
    }

    #[test]
    fn test_load_preserves_folder_order() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = write_config(temp_dir.path(), SAMPLE);

        let config = SortConfig::load(&path).expect("Failed to load config");
        let names: Vec<_> = config.folders.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Zips", "Docs", "Audio"]);
        assert_eq!(config.delete_files_after_days, 30);
        assert!(config.folders.get("Audio").unwrap().suffixes.is_empty());
    }

    #[test]
    fn test_save_round_trip_keeps_order() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = write_config(temp_dir.path(), SAMPLE);
        let config = SortConfig::load(&path).expect("Failed to load config");

        let out = temp_dir.path().join("saved.json");
        config.save(&out).expect("Failed to save config");
        let reloaded = SortConfig::load(&out).expect("Failed to reload config");
        assert_eq!(config, reloaded);
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = write_config(
            temp_dir.path(),
            r#"{ "DOWNLOAD_FOLDER_PATH": "/tmp", "ALLOW_DUPLICATES": true, "FOLDERS": {} }"#,
        );
        assert!(matches!(
            SortConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let with_extra = SAMPLE.replacen("{", r#"{ "EXTRA": 1,"#, 1);
        let path = write_config(temp_dir.path(), &with_extra);
        assert!(matches!(
            SortConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_mistyped_value_is_rejected() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mistyped = SAMPLE.replace(r#""ALLOW_DUPLICATES": false"#, r#""ALLOW_DUPLICATES": "no""#);
        let path = write_config(temp_dir.path(), &mistyped);
        assert!(matches!(
            SortConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_duplicate_folder_is_rejected() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = write_config(
            temp_dir.path(),
            r#"{
                "DOWNLOAD_FOLDER_PATH": "/tmp",
                "ALLOW_DUPLICATES": false,
                "DELETE_LOGS_AFTER_DAYS": -1,
                "DELETE_FILES_AFTER_DAYS": -1,
                "FOLDERS": { "A": [".txt"], "A": [".md"] }
            }"#,
        );
        assert!(matches!(
            SortConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_invalid_folder_name_is_rejected() {
        let mut config = SortConfig::template();
        config.folders.push("../escape", vec![".txt".to_string()]);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_empty_suffix_is_rejected() {
        let mut config = SortConfig::template();
        config.folders.push("Everything", vec![String::new()]);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_missing_file_writes_template() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("config.json");

        let result = SortConfig::load_or_create_template(&path);
        assert!(matches!(result, Err(ConfigError::TemplateCreated { .. })));
        assert!(path.exists());

        let written = SortConfig::load(&path).expect("Template should be a valid config");
        assert_eq!(written, SortConfig::template());
    }

    #[test]
    fn test_folder_map_editing() {
        let mut folders = FolderMap::default();
        assert!(folders.push("Docs", vec![".pdf".to_string()]));
        assert!(folders.push("Images", vec![".png".to_string()]));
        assert!(!folders.push("Docs", vec![]));

        folders.rename("Docs", "Documents").expect("Rename should succeed");
        assert!(folders.rename("Images", "Documents").is_err());
        assert_eq!(folders.iter().next().unwrap().name, "Documents");

        assert!(folders.set_suffixes("Images", vec![".jpg".to_string()]));
        assert_eq!(folders.get("Images").unwrap().suffixes, vec![".jpg"]);

        assert!(folders.remove("Documents").is_some());
        assert_eq!(folders.len(), 1);
    }

    #[test]
    fn test_parse_suffix_list() {
        assert_eq!(parse_suffix_list(" .pdf, .docx ,,"), vec![".pdf", ".docx"]);
        assert!(parse_suffix_list("").is_empty());
    }
}
