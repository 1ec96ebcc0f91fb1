use anyhow::Result;
use log::{warn, info};
use std::path::{Path, PathBuf};
use indicatif::{ProgressBar, ProgressStyle};
use crate::app_config::Config;
use crate::episode_organizer::{self, EpisodeReport, Organizer};
use crate::errors::{OrganizeError, SubtitleError};
use crate::file_utils::FileManager;

// @module: Application controller for episode organization

/// One skipped episode and the reason it was skipped
#[derive(Debug)]
pub struct SkippedEpisode {
    // @field: The episode folder
    pub folder: PathBuf,

    // @field: Why it was skipped
    pub reason: String,
}

/// Outcome of a full season run
#[derive(Debug, Default)]
pub struct RunSummary {
    // @field: Episodes fully organized
    pub processed: usize,

    // @field: Episodes skipped, with reasons
    pub skipped: Vec<SkippedEpisode>,

    // @field: Non-fatal warnings across all episodes
    pub warnings: usize,

    // @field: Whether this was a preview run
    pub dry_run: bool,
}

/// Main application controller for episode organization
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this controller runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the main workflow: discover episode folders under the input
    /// root, enforce the single-season rule, and organize each episode
    /// into the output directory.
    ///
    /// Per-episode failures are recorded as skips and the run continues;
    /// a missing or ambiguous season aborts with an error.
    pub fn run(
        &self,
        input_root: &Path,
        output_override: Option<&Path>,
        season: u32,
        dry_run: bool,
    ) -> Result<RunSummary> {
        // Start timing the process
        let start_time = std::time::Instant::now();

        let source_dir = input_root.join(&self.config.library.source_dir_name);
        if !FileManager::dir_exists(&source_dir) {
            return Err(anyhow::anyhow!("Source directory does not exist: {:?}", source_dir));
        }

        let organizer = Organizer::new(self.config.clone());

        let mut folders = organizer.find_episode_folders(&source_dir)?;
        if folders.is_empty() {
            return Err(anyhow::anyhow!("No episode folders found in {:?}", source_dir));
        }

        let season_folder = Organizer::season_parent(&folders)?;
        info!("Season folder: {}", season_folder.display());

        // Episode numbers come from the natural order of the folder names
        folders.sort_by(|a, b| {
            episode_organizer::natural_cmp(&folder_name(a), &folder_name(b))
        });

        let output_dir = match output_override {
            Some(dir) => dir.to_path_buf(),
            None => input_root.join(&self.config.output.dir_name),
        };
        if !dry_run {
            FileManager::ensure_dir(&output_dir)?;
        }

        info!(
            "Organizing {} episode(s) as season {} into {}",
            folders.len(),
            season,
            output_dir.display()
        );
        if dry_run {
            info!("Dry run: nothing will be written");
        }

        // Create a progress bar for season processing
        let progress_bar = ProgressBar::new(folders.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} episodes ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Organizing episodes");

        let mut summary = RunSummary {
            dry_run,
            ..Default::default()
        };

        // Process each episode folder
        for (index, folder) in folders.iter().enumerate() {
            let episode_number = (index + 1) as u32;
            let display_name = folder_name(folder);

            // Update the progress bar to show the current episode
            progress_bar.set_message(format!("Processing: {}", display_name));

            match self.process_episode(&organizer, folder, season, episode_number, &output_dir, dry_run) {
                Ok(report) => {
                    summary.processed += 1;
                    summary.warnings += report.warnings.len();
                }
                Err(e) => {
                    warn!(
                        "Skipping episode {} ({}): {:#}",
                        display_name,
                        Self::classify_skip(&e),
                        e
                    );
                    summary.skipped.push(SkippedEpisode {
                        folder: folder.clone(),
                        reason: format!("{:#}", e),
                    });
                }
            }

            progress_bar.inc(1);
        }

        // Finish the season progress bar
        progress_bar.finish_with_message("Season processing complete");

        // Calculate and display the total elapsed time
        let duration = start_time.elapsed();

        // Give summary results - important for batch operations
        let summary_message = format!(
            "Season processing completed: {} processed, {} skipped, {} warning(s)",
            summary.processed,
            summary.skipped.len(),
            summary.warnings
        );
        info!("{} in {}", summary_message, Self::format_duration(duration));

        // List every skipped episode with its reason
        for skipped in &summary.skipped {
            warn!("Skipped {}: {}", folder_name(&skipped.folder), skipped.reason);
        }

        Ok(summary)
    }

    /// Scan and organize one episode folder
    fn process_episode(
        &self,
        organizer: &Organizer,
        folder: &Path,
        season: u32,
        episode: u32,
        output_dir: &Path,
        dry_run: bool,
    ) -> Result<EpisodeReport> {
        let bundle = organizer.scan_bundle(folder)?;
        organizer.organize_episode(&bundle, season, episode, output_dir, dry_run)
    }

    /// Classify a per-episode failure for the skip report
    fn classify_skip(error: &anyhow::Error) -> &'static str {
        for cause in error.chain() {
            if cause.downcast_ref::<OrganizeError>().is_some() {
                return "incomplete bundle";
            }
            if cause.downcast_ref::<SubtitleError>().is_some() {
                return "subtitle conversion failed";
            }
        }
        "error"
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
