use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, Context, anyhow};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use walkdir::WalkDir;

use crate::app_config::Config;
use crate::errors::OrganizeError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::subtitle_processor::SubtitleCollection;

// @module: Episode bundle discovery and organization

// @const: Digit/non-digit run splitter for natural ordering
static NATURAL_SEGMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+|\D+").unwrap()
});

/// One comparable piece of a folder name. Numbers order before text so
/// "2" sorts ahead of "10" and of "extras".
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NaturalPiece {
    Number(u64),
    Text(String),
}

fn natural_key(name: &str) -> Vec<NaturalPiece> {
    NATURAL_SEGMENT_REGEX
        .find_iter(name)
        .map(|m| {
            let piece = m.as_str();
            match piece.parse::<u64>() {
                Ok(value) => NaturalPiece::Number(value),
                Err(_) => NaturalPiece::Text(piece.to_lowercase()),
            }
        })
        .collect()
}

/// Compare two folder names with embedded digit runs ordered numerically
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

/// Strip a title down to characters that are safe in a file name:
/// alphanumerics, spaces, underscores and hyphens. An empty result
/// falls back to "Unknown".
pub fn sanitize_title(title: &str) -> String {
    let safe: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let trimmed = safe.trim();

    if trimmed.is_empty() {
        "Unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// TV-show-style base name, e.g. "My Show - S01E05"
pub fn format_episode_base(title: &str, season: u32, episode: u32) -> String {
    format!("{} - S{:02}E{:02}", sanitize_title(title), season, episode)
}

// @struct: Fields read from an episode's entry.json
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryInfo {
    // @field: Show title, falling back to the episode folder name
    pub title: String,

    // @field: Episode tag as the downloader recorded it (ep.page)
    pub episode_tag: String,

    // @field: Bilibili episode identifier (ep.episode_id)
    pub episode_id: String,

    // @field: Quality folder the downloader preferred, may be empty
    pub preferred_quality: String,
}

impl EntryInfo {
    /// Read episode metadata, falling back to the folder name for the title
    pub fn from_file<P: AsRef<Path>>(path: P, fallback_title: &str) -> Result<Self> {
        let content = FileManager::read_to_string(&path)?;
        Self::parse(&content, fallback_title)
    }

    /// Parse metadata JSON. Individual fields are optional and fall back
    /// to defaults; a document that does not parse at all is an error.
    pub fn parse(content: &str, fallback_title: &str) -> Result<Self> {
        let json: Value = serde_json::from_str(content)
            .map_err(|e| OrganizeError::InvalidMetadata(e.to_string()))?;

        let title = json.get("title")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| fallback_title.to_string());

        let episode_tag = json.get("ep")
            .and_then(|ep| ep.get("page"))
            .map(Self::tag_string)
            .unwrap_or_default();

        let episode_id = json.get("ep")
            .and_then(|ep| ep.get("episode_id"))
            .map(Self::tag_string)
            .unwrap_or_default();

        let preferred_quality = json.get("prefered_video_quality")
            .map(Self::tag_string)
            .unwrap_or_default();

        Ok(EntryInfo {
            title,
            episode_tag,
            episode_id,
            preferred_quality,
        })
    }

    // Tags arrive as either strings or bare numbers
    fn tag_string(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }
}

// @struct: One episode folder with every role path resolved
#[derive(Debug, Clone)]
pub struct EpisodeBundle {
    // @field: The episode folder itself
    pub folder: PathBuf,

    // @field: Parsed entry.json contents
    pub entry: EntryInfo,

    // @field: Quality folder holding the media segments
    pub media_dir: PathBuf,

    // @field: Audio segment inside the media dir
    pub audio_path: PathBuf,

    // @field: Video segment inside the media dir
    pub video_path: PathBuf,

    // @field: Language-tagged subtitle directories, sorted by tag
    pub subtitle_dirs: Vec<(String, PathBuf)>,
}

// @struct: What organizing one episode produced
#[derive(Debug, Default)]
pub struct EpisodeReport {
    // @field: TV-style base name used for every output
    pub base_name: String,

    // @field: Files written (or planned, in a dry run)
    pub outputs: Vec<PathBuf>,

    // @field: Non-fatal problems encountered
    pub warnings: Vec<String>,
}

/// Everything the per-episode metadata file records
pub struct MetadataSummary<'a> {
    pub title: &'a str,
    pub season: u32,
    pub episode: u32,
    pub episode_tag: &'a str,
    pub audio_path: &'a Path,
    pub video_path: &'a Path,
    pub subtitles: &'a BTreeMap<String, PathBuf>,
    pub source_folder: &'a Path,
}

/// Render the metadata file body. No timestamps or other run-specific
/// data, so repeated runs produce identical bytes.
pub fn render_metadata(summary: &MetadataSummary) -> String {
    let mut content = String::new();
    content.push_str(&format!("Title: {}\n", summary.title));
    content.push_str(&format!("Season: {}\n", summary.season));
    content.push_str(&format!("Episode: {}\n", summary.episode));

    if !summary.episode_tag.is_empty() {
        content.push_str(&format!("Source episode tag: {}\n", summary.episode_tag));
    }

    content.push_str(&format!("Audio file: {}\n", summary.audio_path.display()));
    content.push_str(&format!("Video file: {}\n", summary.video_path.display()));

    if !summary.subtitles.is_empty() {
        content.push_str("Subtitles:\n");
        for (lang, path) in summary.subtitles {
            content.push_str(&format!("  {}: {}\n", lang, path.display()));
        }
    }

    content.push_str(&format!("Original folder: {}\n", summary.source_folder.display()));
    content
}

/// Discovers episode bundles and copies their contents into the
/// TV-style output tree
pub struct Organizer {
    // @field: App configuration
    config: Config,
}

impl Organizer {
    // @method: Create an organizer with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Find episode folders under the source directory with a
    /// bounded-depth walk. A folder counts as an episode when it holds
    /// the metadata file, a language-tagged subtitle directory, or a
    /// subdirectory with both media segments; its own subdirectories are
    /// roles, not further episodes, so the walk does not descend into it.
    pub fn find_episode_folders(&self, source_dir: &Path) -> Result<Vec<PathBuf>> {
        if !FileManager::dir_exists(source_dir) {
            return Err(OrganizeError::MissingFile {
                role: "source directory",
                path: source_dir.to_path_buf(),
            }
            .into());
        }

        let mut folders = Vec::new();
        let mut walker = WalkDir::new(source_dir)
            .min_depth(1)
            .max_depth(self.config.library.scan_depth)
            .follow_links(true)
            .sort_by(|a, b| {
                natural_cmp(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy())
            })
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry.context("Failed to read directory entry")?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if self.is_episode_folder(entry.path()) {
                folders.push(entry.path().to_path_buf());
                walker.skip_current_dir();
            }
        }

        debug!(
            "Found {} episode folder(s) under {}",
            folders.len(),
            source_dir.display()
        );
        Ok(folders)
    }

    /// All discovered episode folders must live in one season folder.
    /// Returns that common parent, or an error naming every parent found.
    pub fn season_parent(folders: &[PathBuf]) -> Result<PathBuf> {
        let mut parents: Vec<PathBuf> = folders
            .iter()
            .filter_map(|f| f.parent().map(Path::to_path_buf))
            .collect();
        parents.sort();
        parents.dedup();

        match parents.len() {
            0 => Err(anyhow!("No episode folders to organize")),
            1 => Ok(parents.remove(0)),
            _ => {
                let listing = parents
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(anyhow!(
                    "Episode folders span multiple season folders ({}); process one season at a time",
                    listing
                ))
            }
        }
    }

    /// Resolve every role path of an episode folder. Any missing role
    /// makes the whole episode incomplete.
    pub fn scan_bundle(&self, folder: &Path) -> Result<EpisodeBundle> {
        let entry_path = folder.join(&self.config.library.entry_file_name);
        if !FileManager::file_exists(&entry_path) {
            return Err(OrganizeError::MissingFile {
                role: "episode metadata file",
                path: entry_path,
            }
            .into());
        }

        let fallback_title = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let entry = EntryInfo::from_file(&entry_path, &fallback_title)?;

        let media_dir = self.resolve_media_dir(folder, &entry)?;

        let audio_path = media_dir.join(&self.config.library.audio_file_name);
        if !FileManager::file_exists(&audio_path) {
            return Err(OrganizeError::MissingFile {
                role: "audio segment",
                path: audio_path,
            }
            .into());
        }

        let video_path = media_dir.join(&self.config.library.video_file_name);
        if !FileManager::file_exists(&video_path) {
            return Err(OrganizeError::MissingFile {
                role: "video segment",
                path: video_path,
            }
            .into());
        }

        let subtitle_dirs = self.find_subtitle_dirs(folder)?;
        if subtitle_dirs.is_empty() {
            return Err(OrganizeError::MissingFile {
                role: "subtitle directory",
                path: folder.to_path_buf(),
            }
            .into());
        }

        Ok(EpisodeBundle {
            folder: folder.to_path_buf(),
            entry,
            media_dir,
            audio_path,
            video_path,
            subtitle_dirs,
        })
    }

    /// Copy one bundle into the output directory under its TV-style name.
    /// Sources are never touched; existing outputs are overwritten.
    pub fn organize_episode(
        &self,
        bundle: &EpisodeBundle,
        season: u32,
        episode: u32,
        output_dir: &Path,
        dry_run: bool,
    ) -> Result<EpisodeReport> {
        let base_name = format_episode_base(&bundle.entry.title, season, episode);
        let mut report = EpisodeReport {
            base_name: base_name.clone(),
            outputs: Vec::new(),
            warnings: Vec::new(),
        };

        // Media segments keep their role in the stem since both share
        // the same extension
        let audio_target =
            output_dir.join(format!("{}_{}", base_name, self.config.library.audio_file_name));
        self.copy_media(&bundle.audio_path, &audio_target, dry_run)?;
        report.outputs.push(audio_target.clone());

        let video_target =
            output_dir.join(format!("{}_{}", base_name, self.config.library.video_file_name));
        self.copy_media(&bundle.video_path, &video_target, dry_run)?;
        report.outputs.push(video_target.clone());

        // One primary subtitle path per language for the metadata file;
        // the converted SRT wins over a copied ASS
        let mut subtitle_paths: BTreeMap<String, PathBuf> = BTreeMap::new();

        for (tag, dir) in &bundle.subtitle_dirs {
            let suffix = match language_utils::output_suffix(tag) {
                Some(suffix) => suffix,
                None => {
                    let notice = OrganizeError::UnsupportedLanguage(
                        language_utils::describe_language_tag(tag),
                    )
                    .to_string();
                    warn!("{} in {}", notice, dir.display());
                    report.warnings.push(notice);
                    continue;
                }
            };

            let json_files = FileManager::find_files_with_extension(dir, "json")?;
            if json_files.len() > 1 {
                let notice = format!(
                    "Multiple .json subtitles in {}, using the first in sorted order",
                    dir.display()
                );
                warn!("{}", notice);
                report.warnings.push(notice);
            }
            if let Some(json_file) = json_files.first() {
                let srt_target =
                    FileManager::subtitle_output_path(output_dir, &base_name, suffix, "srt");
                let collection = SubtitleCollection::from_json_file(json_file, tag)?;
                if dry_run {
                    info!(
                        "[dry-run] Would convert {} -> {}",
                        json_file.display(),
                        srt_target.display()
                    );
                } else {
                    collection.write_to_srt(&srt_target)?;
                    info!("Converted subtitle: {}", srt_target.display());
                }
                report.outputs.push(srt_target.clone());
                subtitle_paths.insert(suffix.to_string(), srt_target);
            }

            let ass_files = FileManager::find_files_with_extension(dir, "ass")?;
            if ass_files.len() > 1 {
                let notice = format!(
                    "Multiple .ass subtitles in {}, using the first in sorted order",
                    dir.display()
                );
                warn!("{}", notice);
                report.warnings.push(notice);
            }
            if let Some(ass_file) = ass_files.first() {
                let ass_target =
                    FileManager::subtitle_output_path(output_dir, &base_name, suffix, "ass");
                if dry_run {
                    info!(
                        "[dry-run] Would copy {} -> {}",
                        ass_file.display(),
                        ass_target.display()
                    );
                } else {
                    FileManager::copy_file(ass_file, &ass_target).with_context(|| {
                        format!("Failed to copy {} to {}", ass_file.display(), ass_target.display())
                    })?;
                    info!("Copied subtitle: {}", ass_target.display());
                }
                report.outputs.push(ass_target.clone());
                subtitle_paths.entry(suffix.to_string()).or_insert(ass_target);
            }

            if json_files.is_empty() && ass_files.is_empty() {
                let notice = format!("No subtitle files found in {}", dir.display());
                warn!("{}", notice);
                report.warnings.push(notice);
            }
        }

        if self.config.output.write_metadata {
            let metadata_target = output_dir.join(format!("{}_metadata.txt", base_name));
            let summary = MetadataSummary {
                title: &bundle.entry.title,
                season,
                episode,
                episode_tag: &bundle.entry.episode_tag,
                audio_path: &audio_target,
                video_path: &video_target,
                subtitles: &subtitle_paths,
                source_folder: &bundle.folder,
            };
            let content = render_metadata(&summary);

            if dry_run {
                info!("[dry-run] Would write metadata: {}", metadata_target.display());
            } else {
                FileManager::write_to_file(&metadata_target, &content)?;
                debug!("Wrote metadata: {}", metadata_target.display());
            }
            report.outputs.push(metadata_target);
        }

        Ok(report)
    }

    // True when the folder holds any recognizable piece of a bundle.
    // Incomplete bundles are still discovered so the run can report
    // them as skipped instead of silently ignoring them.
    fn is_episode_folder(&self, folder: &Path) -> bool {
        if FileManager::file_exists(folder.join(&self.config.library.entry_file_name)) {
            return true;
        }

        let subdirs = FileManager::list_subdirectories(folder).unwrap_or_default();

        let has_language_dir = subdirs.iter().any(|d| {
            d.file_name()
                .map(|n| language_utils::is_language_dir_name(&n.to_string_lossy()))
                .unwrap_or(false)
        });
        if has_language_dir {
            return true;
        }

        subdirs.iter().any(|d| {
            FileManager::file_exists(d.join(&self.config.library.audio_file_name))
                && FileManager::file_exists(d.join(&self.config.library.video_file_name))
        })
    }

    // Media dir resolution: the quality folder named in entry.json, then
    // the configured default, then any subdirectory holding both segments
    fn resolve_media_dir(&self, folder: &Path, entry: &EntryInfo) -> Result<PathBuf> {
        if !entry.preferred_quality.is_empty() {
            let candidate = folder.join(&entry.preferred_quality);
            if FileManager::dir_exists(&candidate) {
                return Ok(candidate);
            }
            debug!(
                "Quality folder '{}' from metadata not present in {}",
                entry.preferred_quality,
                folder.display()
            );
        }

        let candidate = folder.join(&self.config.library.preferred_quality);
        if FileManager::dir_exists(&candidate) {
            return Ok(candidate);
        }

        if let Some(found) = self.find_media_dir_by_contents(folder) {
            debug!("Falling back to media directory {}", found.display());
            return Ok(found);
        }

        Err(OrganizeError::MissingFile {
            role: "media directory",
            path: folder.to_path_buf(),
        }
        .into())
    }

    fn find_media_dir_by_contents(&self, folder: &Path) -> Option<PathBuf> {
        let subdirs = FileManager::list_subdirectories(folder).ok()?;
        subdirs.into_iter().find(|d| {
            FileManager::file_exists(d.join(&self.config.library.audio_file_name))
                && FileManager::file_exists(d.join(&self.config.library.video_file_name))
        })
    }

    // Subtitle directories are the immediate subdirectories named with a
    // two-letter tag; everything else in the folder is ignored
    fn find_subtitle_dirs(&self, folder: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut dirs = Vec::new();
        for dir in FileManager::list_subdirectories(folder)? {
            if let Some(name) = dir.file_name().map(|n| n.to_string_lossy().to_string()) {
                if language_utils::is_language_dir_name(&name) {
                    dirs.push((name, dir));
                }
            }
        }
        Ok(dirs)
    }

    fn copy_media(&self, source: &Path, target: &Path, dry_run: bool) -> Result<()> {
        if dry_run {
            info!("[dry-run] Would copy {} -> {}", source.display(), target.display());
            return Ok(());
        }

        FileManager::copy_file(source, target)
            .with_context(|| format!("Failed to copy {} to {}", source.display(), target.display()))?;
        debug!("Copied {} -> {}", source.display(), target.display());
        Ok(())
    }
}
