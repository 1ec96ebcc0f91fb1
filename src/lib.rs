/*!
 * # bilisort - Bilibili season organizer
 *
 * A Rust library for turning raw Bilibili episode downloads into a tidy,
 * season-structured media library with standard SRT subtitles.
 *
 * ## Features
 *
 * - Discover episode bundles in a download folder, in natural order
 * - Convert Bilibili JSON subtitles to SRT
 * - Copy audio and video segments under consistent `S01E01`-style names
 * - Carry along existing ASS subtitles unchanged
 * - Write a per-episode metadata summary
 * - Configurable folder conventions with sensible defaults
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: Bilibili JSON parsing and SRT generation
 * - `episode_organizer`: Episode discovery, naming and file placement
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: Subtitle language tag utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod subtitle_processor;
pub mod episode_organizer;
pub mod app_controller;
pub mod language_utils;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
pub use episode_organizer::{EntryInfo, EpisodeBundle, Organizer};
pub use app_controller::{Controller, RunSummary};
pub use language_utils::{get_language_name, is_supported_language, output_suffix};
pub use errors::{AppError, OrganizeError, SubtitleError};
