use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Layout of the downloaded library this tool reads from
    #[serde(default)]
    pub library: LibraryConfig,

    /// Settings for the organized output tree
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Layout of the download cache the organizer scans
///
/// These names mirror the on-disk structure produced by the downloader;
/// they are configurable because the cache folder names have changed
/// between app versions.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LibraryConfig {
    // @field: Folder holding one subfolder per episode
    #[serde(default = "default_source_dir_name")]
    pub source_dir_name: String,

    // @field: Quality folder tried first when locating media segments
    #[serde(default = "default_preferred_quality")]
    pub preferred_quality: String,

    // @field: Episode metadata file name
    #[serde(default = "default_entry_file_name")]
    pub entry_file_name: String,

    // @field: Audio segment file name inside the quality folder
    #[serde(default = "default_audio_file_name")]
    pub audio_file_name: String,

    // @field: Video segment file name inside the quality folder
    #[serde(default = "default_video_file_name")]
    pub video_file_name: String,

    // @field: How many directory levels below the input root to search
    #[serde(default = "default_scan_depth")]
    pub scan_depth: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            source_dir_name: default_source_dir_name(),
            preferred_quality: default_preferred_quality(),
            entry_file_name: default_entry_file_name(),
            audio_file_name: default_audio_file_name(),
            video_file_name: default_video_file_name(),
            scan_depth: default_scan_depth(),
        }
    }
}

/// Settings for the organized output tree
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    // @field: Name of the directory created next to the input root
    #[serde(default = "default_output_dir_name")]
    pub dir_name: String,

    // @field: Whether to write the per-episode metadata text file
    #[serde(default = "default_true")]
    pub write_metadata: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir_name: default_output_dir_name(),
            write_metadata: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Lowercase level identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Error => "error".to_string(),
            Self::Warn => "warn".to_string(),
            Self::Info => "info".to_string(),
            Self::Debug => "debug".to_string(),
            Self::Trace => "trace".to_string(),
        }
    }
}

// Implement Display trait for LogLevel
impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for LogLevel
impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("Invalid log level: {}", s)),
        }
    }
}

fn default_source_dir_name() -> String {
    "bilibili_video".to_string()
}

fn default_preferred_quality() -> String {
    "112".to_string()
}

fn default_entry_file_name() -> String {
    "entry.json".to_string()
}

fn default_audio_file_name() -> String {
    "audio.m4s".to_string()
}

fn default_video_file_name() -> String {
    "video.m4s".to_string()
}

fn default_scan_depth() -> usize {
    3
}

fn default_output_dir_name() -> String {
    "processed_media".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Configured names become path components, so they must be plain names
        let names = [
            ("library.source_dir_name", &self.library.source_dir_name),
            ("library.preferred_quality", &self.library.preferred_quality),
            ("library.entry_file_name", &self.library.entry_file_name),
            ("library.audio_file_name", &self.library.audio_file_name),
            ("library.video_file_name", &self.library.video_file_name),
            ("output.dir_name", &self.output.dir_name),
        ];

        for (key, value) in names {
            if value.is_empty() {
                return Err(anyhow!("Config value '{}' must not be empty", key));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(anyhow!(
                    "Config value '{}' must be a plain name, got: {}",
                    key,
                    value
                ));
            }
        }

        if self.library.scan_depth == 0 {
            return Err(anyhow!("Config value 'library.scan_depth' must be at least 1"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            library: LibraryConfig::default(),
            output: OutputConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
