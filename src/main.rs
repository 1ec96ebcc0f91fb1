// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Result, anyhow, Context};
use log::{warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::app_config::Config;
use app_controller::Controller;

mod app_config;
mod episode_organizer;
mod subtitle_processor;
mod file_utils;
mod app_controller;
mod language_utils;
mod errors;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Organize downloaded episodes into a season library (default command)
    #[command(alias = "sort")]
    Organize(OrganizeArgs),

    /// Generate shell completions for bilisort
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct OrganizeArgs {
    /// Download directory holding the episode folders
    #[arg(value_name = "INPUT_PATH", default_value = ".")]
    input_path: PathBuf,

    /// Season number to use in episode names (prompted for when omitted)
    #[arg(short, long)]
    season: Option<u32>,

    /// Output directory for the organized library
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Show what would be done without writing any files
    #[arg(short, long)]
    dry_run: bool,
}

/// bilisort - Bilibili season organizer
///
/// Turns raw Bilibili episode downloads into a season-structured media
/// library, converting JSON subtitles to SRT along the way.
#[derive(Parser, Debug)]
#[command(name = "bilisort")]
#[command(author = "bilisort team")]
#[command(version = "1.0.0")]
#[command(about = "Bilibili download organizer and subtitle converter")]
#[command(long_about = "bilisort scans a download directory for episode bundles, converts their
Bilibili JSON subtitles to SRT and copies everything into a season-structured
library with consistent S01E01-style names.

EXAMPLES:
    bilisort                                    # Organize the current directory
    bilisort /downloads/show                    # Organize a specific download folder
    bilisort -s 2 /downloads/show               # Use season 2 without prompting
    bilisort -o /library/show /downloads/show   # Write into a custom output directory
    bilisort -d /downloads/show                 # Preview the plan without writing files
    bilisort --log-level debug /downloads/show  # Run with debug logging
    bilisort completions bash > bilisort.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.

EXPECTED LAYOUT:
    Episode folders live under bilibili_video/<season>/ inside the input
    directory. Each one carries an entry.json, a quality folder (e.g. 112)
    holding audio.m4s and video.m4s, and optional two-letter language folders
    with JSON subtitles. Episode folders are ordered naturally, so ep2 comes
    before ep10.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Download directory holding the episode folders
    #[arg(value_name = "INPUT_PATH", default_value = ".")]
    input_path: PathBuf,

    /// Season number to use in episode names (prompted for when omitted)
    #[arg(short, long)]
    season: Option<u32>,

    /// Output directory for the organized library
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Show what would be done without writing any files
    #[arg(short, long)]
    dry_run: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color prefix for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::get_color_for_level(record.level());
            let emoji = Self::get_emoji_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                color, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "bilisort", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Organize(args)) => {
            // Use the explicit organize subcommand args
            run_organize(args)
        }
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let organize_args = OrganizeArgs {
                input_path: cli.input_path,
                season: cli.season,
                output: cli.output,
                config_path: cli.config_path,
                log_level: cli.log_level,
                dry_run: cli.dry_run,
            };
            run_organize(organize_args)
        }
    }
}

fn run_organize(options: OrganizeArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        let log_level = match config_log_level {
            app_config::LogLevel::Error => LevelFilter::Error,
            app_config::LogLevel::Warn => LevelFilter::Warn,
            app_config::LogLevel::Info => LevelFilter::Info,
            app_config::LogLevel::Debug => LevelFilter::Debug,
            app_config::LogLevel::Trace => LevelFilter::Trace,
        };
        log::set_max_level(log_level);
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let config = if Path::new(config_path).exists() {
        // Load existing configuration
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let mut config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;

        // Update log level in config if specified via command line
        if let Some(log_level) = &options.log_level {
            config.log_level = log_level.clone().into();
        }

        config
    } else {
        // Create default configuration if not exists
        warn!("Config file not found at '{}', creating default config.", config_path);

        let mut config = Config::default();

        // Apply command line log level to default config if specified
        if let Some(log_level) = &options.log_level {
            config.log_level = log_level.clone().into();
        }

        // Save default config
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        let log_level = match config.log_level {
            app_config::LogLevel::Error => LevelFilter::Error,
            app_config::LogLevel::Warn => LevelFilter::Warn,
            app_config::LogLevel::Info => LevelFilter::Info,
            app_config::LogLevel::Debug => LevelFilter::Debug,
            app_config::LogLevel::Trace => LevelFilter::Trace,
        };

        // Just update the max level without reinitializing the logger
        log::set_max_level(log_level);
    }

    if !options.input_path.is_dir() {
        return Err(anyhow!("Input path does not exist or is not a directory: {:?}", options.input_path));
    }

    // Resolve the season number, prompting when it was not given on the command line
    let season = match options.season {
        Some(season) => {
            if season < 1 {
                return Err(anyhow!("Season number must be 1 or greater"));
            }
            season
        },
        None => prompt_season_number()?,
    };

    // Create controller and run the full season pass
    let controller = Controller::with_config(config)?;

    info!("Organizing {:?} as season {}", options.input_path, season);
    controller.run(&options.input_path, options.output.as_deref(), season, options.dry_run)?;

    Ok(())
}

// Asks on stderr until a usable season number arrives, so stdout stays clean
fn prompt_season_number() -> Result<u32> {
    let stdin = std::io::stdin();
    let mut input = String::new();

    loop {
        eprint!("Season number for this show: ");
        let _ = std::io::stderr().flush();

        input.clear();
        let bytes_read = stdin.read_line(&mut input)
            .context("Failed to read season number from stdin")?;
        if bytes_read == 0 {
            return Err(anyhow!("Reached end of input while waiting for a season number"));
        }

        match input.trim().parse::<u32>() {
            Ok(season) if season >= 1 => return Ok(season),
            Ok(_) => eprintln!("Season number must be 1 or greater."),
            Err(_) => eprintln!("Please enter a whole number."),
        }
    }
}
