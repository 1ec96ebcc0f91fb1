/*!
 * Common test utilities for the bilisort test suite
 */

use std::path::{Path, PathBuf};
use std::fs;
use anyhow::Result;
use tempfile::TempDir;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A small Bilibili subtitle document with two cues
pub fn sample_subtitle_json() -> &'static str {
    r#"{"body": [
        {"from": 0.0, "to": 1.5, "content": "Hello", "location": 2},
        {"from": 2.0, "to": 3.25, "content": "World", "location": 2}
    ]}"#
}

/// The SRT text that sample_subtitle_json converts to
pub fn sample_srt() -> &'static str {
    "1\n00:00:00,000 --> 00:00:01,500\nHello\n\n2\n00:00:02,000 --> 00:00:03,250\nWorld\n\n"
}

/// An entry document in the shape the downloader writes
pub fn sample_entry_json(title: &str, page: &str) -> String {
    format!(
        r#"{{"title": "{}", "ep": {{"page": "{}", "episode_id": 401234}}, "prefered_video_quality": 112}}"#,
        title, page
    )
}

/// Creates the source tree root with a single season folder inside it
pub fn create_season_dir(root: &Path) -> Result<PathBuf> {
    let season_dir = root.join("bilibili_video").join("s_40391");
    fs::create_dir_all(&season_dir)?;
    Ok(season_dir)
}

/// Builds one complete episode bundle folder under `parent`: entry
/// document, a 112 quality folder with both media segments, and a
/// Vietnamese subtitle folder with one JSON document
pub fn create_episode_bundle(parent: &Path, folder: &str, title: &str, page: &str) -> Result<PathBuf> {
    let episode_dir = parent.join(folder);
    let media_dir = episode_dir.join("112");
    fs::create_dir_all(&media_dir)?;

    fs::write(episode_dir.join("entry.json"), sample_entry_json(title, page))?;
    fs::write(media_dir.join("audio.m4s"), b"audio-bytes")?;
    fs::write(media_dir.join("video.m4s"), b"video-bytes")?;

    let subtitle_dir = episode_dir.join("vi");
    fs::create_dir_all(&subtitle_dir)?;
    fs::write(subtitle_dir.join("subtitle.json"), sample_subtitle_json())?;

    Ok(episode_dir)
}
