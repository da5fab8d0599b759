mod state;
mod progress;
mod worker;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use iced::widget::{
    button, checkbox, column, container, progress_bar, row, scrollable, text, text_input, Column,
};
use iced::{executor, Alignment, Application, Command, Element, Length, Settings, Subscription, Theme};
use filesort_engine::{logging, ProgressState, DEFAULT_CONFIG_FILE};
use state::AppState;
use worker::RunSummary;

pub fn main() -> iced::Result {
    let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    let logs_dir = logging::logs_dir_for(&config_path);

    // Held until the window closes so buffered log lines are flushed.
    let _guard = match logging::init_logging(&logs_dir, false) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging disabled ({}): {}", logs_dir.display(), e);
            None
        }
    };

    GuiApp::run(Settings::with_flags(GuiFlags { config_path, logs_dir }))
}

#[derive(Debug, Default)]
pub struct GuiFlags {
    config_path: PathBuf,
    logs_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub enum Message {
    DownloadPathChanged(String),
    BrowseDownloadPressed,
    AllowDuplicatesToggled(bool),
    LogDaysChanged(String),
    FileDaysChanged(String),
    FolderSelected(String),
    FolderNameChanged(String),
    SuffixesChanged(String),
    AddFolderPressed,
    RenameFolderPressed,
    EditFiltersPressed,
    RemoveFolderPressed,
    SaveConfigPressed,
    ShowConfigToggled(bool),
    RemoveDuplicatesToggled(bool),
    StartSortPressed,
    Tick,
    ViewLogsPressed,
    CloseLogsPressed,
}

pub struct GuiApp {
    state: AppState,
    logs_dir: PathBuf,
    progress: Arc<ProgressState>,
    result_rx: Option<Receiver<Result<RunSummary, String>>>,
}

impl GuiApp {
    fn report(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => self.state.error_message = None,
            Err(e) => self.state.error_message = Some(e),
        }
    }

    fn start_sort(&mut self) {
        let config = match self.state.build_config() {
            Ok(config) => config,
            Err(e) => {
                self.state.error_message = Some(e);
                return;
            }
        };

        self.progress = Arc::new(ProgressState::new());
        self.state.progress = self.progress.snapshot();
        self.state.is_running = true;
        self.state.error_message = None;
        self.state.status_message = None;
        self.state.last_summary = None;

        tracing::info!(remove_duplicates = self.state.remove_duplicates, "Starting sort from GUI");
        self.result_rx = Some(worker::spawn_sort(
            config,
            self.logs_dir.clone(),
            self.state.remove_duplicates,
            self.progress.clone(),
        ));
    }

    fn poll_worker(&mut self) {
        self.state.progress = self.progress.snapshot();

        let Some(rx) = &self.result_rx else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err("Worker thread stopped unexpectedly".to_string()),
        };

        self.result_rx = None;
        self.state.is_running = false;
        self.state.progress = self.progress.snapshot();
        match result {
            Ok(summary) => self.state.last_summary = Some(summary),
            Err(e) => self.state.error_message = Some(e),
        }
    }

    fn view_logs(&mut self) {
        let latest = match logging::latest_log_file(&self.logs_dir) {
            Ok(Some(path)) => path,
            Ok(None) => {
                self.state.status_message = Some("No log files found.".to_string());
                return;
            }
            Err(_) => {
                self.state.status_message = Some("No logs directory found.".to_string());
                return;
            }
        };

        match fs::read_to_string(&latest) {
            Ok(content) => {
                let title = latest
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.state.log_view = Some((title, content));
            }
            Err(e) => {
                self.state.error_message = Some(format!("Failed to read log file: {}", e));
            }
        }
    }
}

impl Application for GuiApp {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = GuiFlags;

    fn new(flags: GuiFlags) -> (Self, Command<Message>) {
        let app = GuiApp {
            state: AppState::load(&flags.config_path),
            logs_dir: flags.logs_dir,
            progress: Arc::new(ProgressState::new()),
            result_rx: None,
        };
        (app, Command::none())
    }

    fn title(&self) -> String {
        "FileSort".to_string()
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::DownloadPathChanged(path) => {
                self.state.download_path = path;
                self.state.error_message = None;
            }
            Message::BrowseDownloadPressed => {
                if let Some(path) = rfd::FileDialog::new().pick_folder() {
                    self.state.download_path = path.display().to_string();
                    self.state.error_message = None;
                }
            }
            Message::AllowDuplicatesToggled(enabled) => {
                self.state.allow_duplicates = enabled;
            }
            Message::LogDaysChanged(value) => {
                self.state.log_days = value;
            }
            Message::FileDaysChanged(value) => {
                self.state.file_days = value;
            }
            Message::FolderSelected(name) => {
                self.state.select_folder(&name);
            }
            Message::FolderNameChanged(name) => {
                self.state.folder_name_input = name;
            }
            Message::SuffixesChanged(suffixes) => {
                self.state.suffixes_input = suffixes;
            }
            Message::AddFolderPressed => {
                let result = self.state.add_folder();
                self.report(result);
            }
            Message::RenameFolderPressed => {
                let result = self.state.rename_folder();
                self.report(result);
            }
            Message::EditFiltersPressed => {
                let result = self.state.edit_filters();
                self.report(result);
            }
            Message::RemoveFolderPressed => {
                let result = self.state.remove_folder();
                self.report(result);
            }
            Message::SaveConfigPressed => match self.state.save_config() {
                Ok(_) => {
                    self.state.error_message = None;
                    self.state.status_message =
                        Some(format!("{} has been saved.", self.state.config_path.display()));
                }
                Err(e) => self.state.error_message = Some(e),
            },
            Message::ShowConfigToggled(show) => {
                self.state.show_config = show;
            }
            Message::RemoveDuplicatesToggled(enabled) => {
                self.state.remove_duplicates = enabled;
            }
            Message::StartSortPressed => {
                if !self.state.is_running {
                    self.start_sort();
                }
            }
            Message::Tick => {
                self.poll_worker();
            }
            Message::ViewLogsPressed => {
                self.view_logs();
            }
            Message::CloseLogsPressed => {
                self.state.log_view = None;
            }
        }
        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.state.is_running {
            iced::time::every(Duration::from_millis(100)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn view(&self) -> Element<Message> {
        if let Some((title, content)) = &self.state.log_view {
            return column![
                row![
                    text(format!("Log Viewer - {}", title)).size(20).width(Length::Fill),
                    button("Close").on_press(Message::CloseLogsPressed),
                ]
                .align_items(Alignment::Center),
                scrollable(text(content)).height(Length::Fill),
            ]
            .spacing(10)
            .padding(20)
            .into();
        }

        let settings_section = column![
            text("Download Folder"),
            row![
                text_input("path/to/downloadfolder", &self.state.download_path)
                    .on_input(Message::DownloadPathChanged)
                    .width(Length::Fill),
                button("Browse...").on_press(Message::BrowseDownloadPressed),
            ]
            .spacing(10)
            .align_items(Alignment::Center),
            checkbox("Allow duplicates", self.state.allow_duplicates)
                .on_toggle(Message::AllowDuplicatesToggled),
            row![
                text("Delete logs after days"),
                text_input("-1", &self.state.log_days)
                    .on_input(Message::LogDaysChanged)
                    .width(Length::Fixed(80.0)),
                text("Delete files after days"),
                text_input("-1", &self.state.file_days)
                    .on_input(Message::FileDaysChanged)
                    .width(Length::Fixed(80.0)),
            ]
            .spacing(10)
            .align_items(Alignment::Center),
        ]
        .spacing(10)
        .padding(10);

        let folder_list = self.state.folders.iter().fold(Column::new().spacing(2), |col, rule| {
            let selected = self.state.selected_folder.as_deref() == Some(rule.name.as_str());
            let label = format!(
                "{}{}: {}",
                if selected { "> " } else { "" },
                rule.name,
                rule.suffixes.join(", ")
            );
            col.push(
                button(text(label))
                    .on_press(Message::FolderSelected(rule.name.clone()))
                    .width(Length::Fill),
            )
        });

        let folder_section = column![
            text("Folders"),
            scrollable(folder_list).height(Length::Fixed(160.0)),
            row![
                text_input("Folder name", &self.state.folder_name_input)
                    .on_input(Message::FolderNameChanged)
                    .width(Length::FillPortion(1)),
                text_input(".pdf, .docx", &self.state.suffixes_input)
                    .on_input(Message::SuffixesChanged)
                    .width(Length::FillPortion(2)),
            ]
            .spacing(10),
            row![
                button("Add Folder").on_press(Message::AddFolderPressed),
                button("Rename Folder").on_press(Message::RenameFolderPressed),
                button("Edit Filters").on_press(Message::EditFiltersPressed),
                button("Remove Folder").on_press(Message::RemoveFolderPressed),
            ]
            .spacing(10),
        ]
        .spacing(10)
        .padding(10);

        let mut config_section = column![row![
            button("Save Config").on_press(Message::SaveConfigPressed),
            checkbox("Show config", self.state.show_config).on_toggle(Message::ShowConfigToggled),
        ]
        .spacing(15)
        .align_items(Alignment::Center)]
        .spacing(10)
        .padding(10);

        if self.state.show_config {
            config_section = config_section.push(
                scrollable(text(self.state.config_preview()).size(14))
                    .height(Length::Fixed(180.0)),
            );
        }

        let controls = row![
            checkbox("Remove duplicates (rm_duplicates)", self.state.remove_duplicates)
                .on_toggle(Message::RemoveDuplicatesToggled),
            button(if self.state.is_running { "Running..." } else { "Start FileSort" })
                .on_press_maybe(if self.state.is_running {
                    None
                } else {
                    Some(Message::StartSortPressed)
                })
                .padding(10),
            button("View Logs").on_press(Message::ViewLogsPressed),
        ]
        .spacing(15)
        .align_items(Alignment::Center);

        let snapshot = &self.state.progress;
        let mut progress_section = column![
            progress_bar(0.0..=100.0, snapshot.percent() as f32),
            text(format!("{}%", snapshot.percent())),
            text(progress::status_text(snapshot, self.state.is_running)),
            container(text(progress::console_text(snapshot)).size(14)).padding(10),
        ]
        .spacing(5)
        .padding(10);

        if let Some(summary) = &self.state.last_summary {
            if !summary.failed_items.is_empty() {
                progress_section = progress_section.push(text("Failed Files (first 10):"));
                for (name, err) in summary.failed_items.iter().take(10) {
                    progress_section = progress_section.push(text(format!("  {}: {}", name, err)));
                }
            }
        }

        let message_section: Element<Message> = if let Some(error) = &self.state.error_message {
            container(text(format!("ERROR: {}", error))).padding(10).into()
        } else if let Some(status) = &self.state.status_message {
            container(text(status)).padding(10).into()
        } else {
            text("").into()
        };

        scrollable(
            column![
                text("FileSort").size(24),
                settings_section,
                folder_section,
                config_section,
                controls,
                progress_section,
                message_section,
            ]
            .spacing(20)
            .padding(20),
        )
        .into()
    }
}
