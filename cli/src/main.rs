//! FileSort - Command-line interface for the sorting engine.
//!
//! Sorts the configured download folder once and exits. Pass `rm_duplicates`
//! to also remove byte-identical files across the whole folder tree.

use clap::{Parser, ValueEnum};
use filesort_engine::{
    logging,
    model::{FileOutcome, Placement, RunState, SortRun},
    progress::ProgressCallback,
    ConfigError, RunOptions, SortConfig, SortEngine, DEFAULT_CONFIG_FILE,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

/// FileSort - keep a download folder organized
#[derive(Parser, Debug)]
#[command(name = "filesort")]
#[command(version = "0.1.0")]
#[command(about = "Sort files into folders by suffix, remove duplicates and expired files")]
struct Args {
    /// Extra action to run after sorting
    #[arg(value_enum)]
    action: Option<Action>,

    /// Path to the configuration file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Print every file as it is processed
    #[arg(long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Remove duplicate files across the whole download folder tree
    #[value(name = "rm_duplicates")]
    RmDuplicates,
}

/// CLI implementation of ProgressCallback that reports to stderr
struct CliProgress {
    verbose: bool,
    start_time: Instant,
}

impl CliProgress {
    fn new(verbose: bool) -> Self {
        CliProgress {
            verbose,
            start_time: Instant::now(),
        }
    }

    fn format_duration(elapsed: std::time::Duration) -> String {
        let secs = elapsed.as_secs();
        let mins = secs / 60;
        let secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}.{:01}s", secs, elapsed.subsec_millis() / 100)
        }
    }

    fn describe(outcome: &FileOutcome) -> String {
        match outcome {
            FileOutcome::Placed { folder, placement } => match placement {
                Placement::MovedAsIs => format!("moved to {}", folder),
                Placement::Renamed(name) => format!("moved to {} as {}", folder, name),
                Placement::Removed => format!("duplicate of a file in {}, removed", folder),
            },
            FileOutcome::Ignored => "no matching folder, ignored".to_string(),
            FileOutcome::Expired => "expired, removed".to_string(),
            FileOutcome::DuplicateRemoved { original } => {
                format!("duplicate of {}, removed", file_label(original))
            }
            FileOutcome::Kept => "kept".to_string(),
            FileOutcome::Failed { message } => format!("FAILED: {}", message),
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string())
}

impl ProgressCallback for CliProgress {
    fn on_run_started(&self, _run: &SortRun) {
        eprintln!("Sorting...");
    }

    fn on_phase_started(&self, _run: &SortRun, phase: RunState) {
        if self.verbose {
            eprintln!("== {}", phase);
        }
    }

    fn on_file_started(&self, _run: &SortRun, _path: &Path) {}

    fn on_file_completed(&self, run: &SortRun, path: &Path, outcome: &FileOutcome) {
        // Comparisons that found nothing are too noisy to print.
        if !self.verbose || *outcome == FileOutcome::Kept {
            return;
        }
        eprintln!(
            "[{:3}/{:3}] {}: {}",
            run.processed,
            run.total,
            file_label(path),
            Self::describe(outcome)
        );
    }

    fn on_run_completed(&self, run: &SortRun) {
        eprintln!();
        eprintln!("Sort complete!");
        eprintln!("{}", run.stats);
        eprintln!("Elapsed: {}", Self::format_duration(self.start_time.elapsed()));

        if !run.failures.is_empty() {
            eprintln!();
            eprintln!("Failed files:");
            for failure in &run.failures {
                eprintln!("  {}: {}", failure.path.display(), failure.error_message);
            }
        }
    }
}

/// Parse arguments, set up logging, then run the sort
fn main() {
    let args = Args::parse();

    let logs_dir = logging::logs_dir_for(&args.config);
    let guard = match logging::init_logging(&logs_dir, args.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging disabled ({}): {}", logs_dir.display(), e);
            None
        }
    };

    // Exit code tracking
    let exit_code = match run_cli(&args) {
        Ok(()) => 0,
        Err(msg) => {
            error!("{}", msg);
            eprintln!("Error: {}", msg);
            2
        }
    };

    drop(guard);
    std::process::exit(exit_code);
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<(), String> {
    let config = SortConfig::load_or_create_template(&args.config).map_err(|e| match e {
        ConfigError::TemplateCreated { .. } => e.to_string(),
        other => format!("Configuration error: {}", other),
    })?;

    let engine = SortEngine::new(config)
        .map_err(|e| format!("Cannot start: {}", e))?
        .with_logs_dir(logging::logs_dir_for(&args.config));

    let options = RunOptions {
        remove_duplicates: args.action == Some(Action::RmDuplicates),
    };
    info!(remove_duplicates = options.remove_duplicates, "FileSort starting");

    let progress = CliProgress::new(args.verbose);
    let run = engine
        .run(options, Some(&progress))
        .map_err(|e| format!("Sort failed: {}", e))?;

    if run.failures.is_empty() {
        Ok(())
    } else {
        Err(format!("{} file(s) could not be processed", run.failures.len()))
    }
}
