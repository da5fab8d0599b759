use std::path::{Path, PathBuf};

use filesort_engine::config::{parse_suffix_list, validate_folder_name, RETENTION_DISABLED};
use filesort_engine::{ConfigError, FolderMap, ProgressSnapshot, SortConfig};

use crate::worker::RunSummary;

/// Application state: the configuration being edited plus run and UI data.
#[derive(Debug)]
pub struct AppState {
    pub config_path: PathBuf,

    // Configuration draft
    pub download_path: String,
    pub allow_duplicates: bool,
    pub log_days: String,
    pub file_days: String,
    pub folders: FolderMap,

    // Folder editor
    pub selected_folder: Option<String>,
    pub folder_name_input: String,
    pub suffixes_input: String,

    // Run state
    pub remove_duplicates: bool,
    pub is_running: bool,
    pub progress: ProgressSnapshot,
    pub last_summary: Option<RunSummary>,

    // UI state
    pub show_config: bool,
    pub log_view: Option<(String, String)>,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
}

impl AppState {
    /// Load `config_path`, writing the template first if it does not exist.
    ///
    /// A config that fails to load leaves the template in the editor and the
    /// error on screen.
    pub fn load(config_path: &Path) -> Self {
        let mut state = Self::from_config(config_path, &SortConfig::template());
        match SortConfig::load_or_create_template(config_path) {
            Ok(config) => {
                state = Self::from_config(config_path, &config);
            }
            Err(e @ ConfigError::TemplateCreated { .. }) => {
                state.status_message = Some(e.to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not load configuration");
                state.error_message = Some(e.to_string());
            }
        }
        state
    }

    pub fn from_config(config_path: &Path, config: &SortConfig) -> Self {
        AppState {
            config_path: config_path.to_path_buf(),

            download_path: config.download_folder_path.display().to_string(),
            allow_duplicates: config.allow_duplicates,
            log_days: config.delete_logs_after_days.to_string(),
            file_days: config.delete_files_after_days.to_string(),
            folders: config.folders.clone(),

            selected_folder: None,
            folder_name_input: String::new(),
            suffixes_input: String::new(),

            remove_duplicates: false,
            is_running: false,
            progress: ProgressSnapshot::default(),
            last_summary: None,

            show_config: false,
            log_view: None,
            status_message: None,
            error_message: None,
        }
    }

    /// Turn the draft into a validated configuration.
    pub fn build_config(&self) -> Result<SortConfig, String> {
        let config = SortConfig {
            download_folder_path: PathBuf::from(self.download_path.trim()),
            allow_duplicates: self.allow_duplicates,
            delete_logs_after_days: parse_days("Delete logs after days", &self.log_days)?,
            delete_files_after_days: parse_days("Delete files after days", &self.file_days)?,
            folders: self.folders.clone(),
        };
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }

    pub fn save_config(&self) -> Result<SortConfig, String> {
        let config = self.build_config()?;
        config.save(&self.config_path).map_err(|e| e.to_string())?;
        tracing::info!(path = %self.config_path.display(), "Configuration saved");
        Ok(config)
    }

    /// JSON preview of the draft, or the reason it is not valid.
    pub fn config_preview(&self) -> String {
        match self.build_config().and_then(|c| c.to_json().map_err(|e| e.to_string())) {
            Ok(json) => json,
            Err(e) => format!("Invalid configuration: {}", e),
        }
    }

    pub fn select_folder(&mut self, name: &str) {
        if let Some(rule) = self.folders.get(name) {
            self.folder_name_input = rule.name.clone();
            self.suffixes_input = rule.suffixes.join(", ");
            self.selected_folder = Some(rule.name.clone());
        }
    }

    pub fn add_folder(&mut self) -> Result<(), String> {
        let name = self.folder_name_input.trim().to_string();
        validate_folder_name(&name).map_err(|e| e.to_string())?;
        if !self.folders.push(name.clone(), parse_suffix_list(&self.suffixes_input)) {
            return Err(format!("{} already exists.", name));
        }
        self.selected_folder = Some(name);
        Ok(())
    }

    pub fn rename_folder(&mut self) -> Result<(), String> {
        let old = self.require_selection()?;
        let new = self.folder_name_input.trim().to_string();
        validate_folder_name(&new).map_err(|e| e.to_string())?;
        self.folders.rename(&old, new.clone()).map_err(|e| e.to_string())?;
        self.selected_folder = Some(new);
        Ok(())
    }

    pub fn edit_filters(&mut self) -> Result<(), String> {
        let name = self.require_selection()?;
        let suffixes = parse_suffix_list(&self.suffixes_input);
        if !self.folders.set_suffixes(&name, suffixes) {
            return Err(format!("no folder named '{}'", name));
        }
        Ok(())
    }

    pub fn remove_folder(&mut self) -> Result<(), String> {
        let name = self.require_selection()?;
        self.folders.remove(&name);
        self.selected_folder = None;
        self.folder_name_input.clear();
        self.suffixes_input.clear();
        Ok(())
    }

    fn require_selection(&self) -> Result<String, String> {
        self.selected_folder
            .clone()
            .ok_or_else(|| "Please select a folder to edit.".to_string())
    }
}

fn parse_days(label: &str, value: &str) -> Result<i64, String> {
    match value.trim().parse::<i64>() {
        Ok(days) if days >= RETENTION_DISABLED => Ok(days),
        _ => Err(format!(
            "{} must be a whole number of {} or more",
            label, RETENTION_DISABLED
        )),
    }
}
