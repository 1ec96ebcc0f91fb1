/*!
 * Error types for the bilisort application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during subtitle parsing and conversion
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// Error when a subtitle document cannot be parsed at all
    #[error("Failed to parse subtitle document: {0}")]
    ParseError(String),

    /// Error when a timestamp value cannot be interpreted
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Error when a cue ends before it starts
    #[error("Cue {index}: end time {end_ms}ms is before start time {start_ms}ms")]
    InvertedRange {
        /// Zero-based position of the cue in the source document
        index: usize,
        /// Start of the cue in milliseconds
        start_ms: u64,
        /// End of the cue in milliseconds
        end_ms: u64,
    },
}

/// Errors that can occur while organizing an episode bundle
#[derive(Error, Debug)]
pub enum OrganizeError {
    /// A required file or directory of the bundle is absent
    #[error("Missing {role}: {}", path.display())]
    MissingFile {
        /// Which part of the bundle is missing (e.g. "entry.json", "audio segment")
        role: &'static str,
        /// Path that was expected to exist
        path: PathBuf,
    },

    /// A subtitle language directory has no configured output mapping
    #[error("Unsupported subtitle language: {0}")]
    UnsupportedLanguage(String),

    /// The episode metadata could not be read or understood
    #[error("Invalid episode metadata: {0}")]
    InvalidMetadata(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from bundle organization
    #[error("Organize error: {0}")]
    Organize(#[from] OrganizeError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
