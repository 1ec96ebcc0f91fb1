use std::fs;
use std::fs::File;
use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context};
use std::io::Write;
use std::path::{Path, PathBuf};
use log::{debug, warn};
use serde::Deserialize;
use crate::errors::SubtitleError;

// @module: Subtitle parsing and SRT conversion

// @const: Clock timestamp regex (H:MM:SS with optional fraction)
static CLOCK_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):([0-5]?\d):([0-5]?\d)(?:[.,](\d+))?$").unwrap()
});

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry - used by tests and external consumers
    #[allow(dead_code)]
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    // @creates: Validated subtitle entry
    // @validates: Time range and non-empty text
    pub fn new_validated(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Result<Self> {
        // Validate time range; zero-duration cues are legal
        if end_time_ms < start_time_ms {
            return Err(SubtitleError::InvertedRange {
                index: seq_num.saturating_sub(1),
                start_ms: start_time_ms,
                end_ms: end_time_ms,
            }
            .into());
        }

        // Validate text is not empty (after trimming)
        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(SubtitleError::ParseError(format!(
                "Empty subtitle text for entry {}",
                seq_num
            ))
            .into());
        }

        Ok(SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text: trimmed_text.to_string(),
        })
    }

    /// Convert a timestamp in seconds to whole milliseconds
    ///
    /// Sub-millisecond precision truncates toward zero so cues never
    /// stretch past their source timing. Values sitting within float
    /// representation noise of a whole millisecond count as that
    /// millisecond (7.89 scales to a hair under 7890.0 in binary).
    pub fn seconds_to_ms(seconds: f64) -> Result<u64> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(SubtitleError::InvalidTimestamp(format!("{} s", seconds)).into());
        }

        let scaled = seconds * 1000.0;
        let nearest = scaled.round();
        let ms = if (scaled - nearest).abs() < 1e-6 {
            nearest
        } else {
            scaled.floor()
        };

        Ok(ms as u64)
    }

    /// Parse a clock timestamp (H:MM:SS with an optional `.` or `,`
    /// fraction) to milliseconds. Fraction digits beyond the third are
    /// truncated.
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let trimmed = timestamp.trim();
        let caps = CLOCK_TIMESTAMP_REGEX
            .captures(trimmed)
            .ok_or_else(|| SubtitleError::InvalidTimestamp(timestamp.to_string()))?;

        let hours: u64 = caps[1]
            .parse()
            .map_err(|_| SubtitleError::InvalidTimestamp(timestamp.to_string()))?;
        let minutes: u64 = caps[2]
            .parse()
            .map_err(|_| SubtitleError::InvalidTimestamp(timestamp.to_string()))?;
        let seconds: u64 = caps[3]
            .parse()
            .map_err(|_| SubtitleError::InvalidTimestamp(timestamp.to_string()))?;

        let millis: u64 = match caps.get(4) {
            Some(frac) => {
                // Right-pad to milliseconds, then drop anything finer
                let padded = format!("{:0<3}", frac.as_str());
                padded[..3]
                    .parse()
                    .map_err(|_| SubtitleError::InvalidTimestamp(timestamp.to_string()))?
            }
            None => 0,
        };

        // The hour field has no upper bound in the pattern, so scaling
        // it to milliseconds can exceed u64
        let sub_hour_ms = minutes * 60_000 + seconds * 1_000 + millis;
        hours
            .checked_mul(3_600_000)
            .and_then(|ms| ms.checked_add(sub_hour_ms))
            .ok_or_else(|| SubtitleError::InvalidTimestamp(timestamp.to_string()).into())
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// A cue timing as it appears in the JSON document: the downloader emits
/// numeric seconds, but clock strings show up in hand-edited files
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    /// Seconds since the start of the episode
    Seconds(f64),
    /// Clock string, e.g. "0:01:07.890"
    Clock(String),
}

impl TimeValue {
    /// Resolve to whole milliseconds
    pub fn to_ms(&self) -> Result<u64> {
        match self {
            TimeValue::Seconds(seconds) => SubtitleEntry::seconds_to_ms(*seconds),
            TimeValue::Clock(clock) => SubtitleEntry::parse_timestamp(clock),
        }
    }
}

/// Top level of a Bilibili subtitle JSON document. Styling fields
/// (font size, stroke, positioning) are ignored.
#[derive(Debug, Deserialize)]
struct JsonSubtitleDoc {
    body: Vec<JsonCue>,
}

/// One cue record. Extra per-cue fields (e.g. the `location` positioning
/// hint) are ignored.
#[derive(Debug, Deserialize)]
struct JsonCue {
    from: TimeValue,
    to: TimeValue,
    content: String,
}

/// Collection of subtitle entries with metadata
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,

    /// Source language
    pub source_language: String,
}

impl SubtitleCollection {
    /// Create a new subtitle collection
    pub fn new(source_file: PathBuf, source_language: String) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
            source_language,
        }
    }

    /// Parse a Bilibili JSON subtitle file into a collection
    pub fn from_json_file<P: AsRef<Path>>(path: P, source_language: &str) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;

        let entries = Self::parse_json_string(&content)
            .with_context(|| format!("Failed to convert subtitle file: {}", path.display()))?;

        Ok(SubtitleCollection {
            source_file: path.to_path_buf(),
            entries,
            source_language: source_language.to_string(),
        })
    }

    /// Parse Bilibili JSON subtitle content into subtitle entries
    ///
    /// The document shape is `{"body": [{"from", "to", "content"}, ...]}`.
    /// Cues are ordered by start time (stable, so equal starts keep their
    /// document order) and renumbered from 1.
    pub fn parse_json_string(content: &str) -> Result<Vec<SubtitleEntry>> {
        let doc: JsonSubtitleDoc = serde_json::from_str(content)
            .map_err(|e| SubtitleError::ParseError(e.to_string()))?;

        let mut entries = Vec::with_capacity(doc.body.len());
        let mut skipped_empty = 0;

        for (index, cue) in doc.body.iter().enumerate() {
            let start_ms = cue
                .from
                .to_ms()
                .with_context(|| format!("Bad start time in cue {}", index))?;
            let end_ms = cue
                .to
                .to_ms()
                .with_context(|| format!("Bad end time in cue {}", index))?;

            if end_ms < start_ms {
                return Err(SubtitleError::InvertedRange {
                    index,
                    start_ms,
                    end_ms,
                }
                .into());
            }

            let text = cue.content.trim();
            if text.is_empty() {
                warn!("Skipping cue {} with empty text", index);
                skipped_empty += 1;
                continue;
            }

            entries.push(SubtitleEntry {
                seq_num: entries.len() + 1,
                start_time_ms: start_ms,
                end_time_ms: end_ms,
                text: text.to_string(),
            });
        }

        if skipped_empty > 0 {
            debug!("Dropped {} empty cue(s) from document", skipped_empty);
        }

        if entries.is_empty() {
            warn!("No usable cues found in subtitle document");
        }

        // Sort by start time to ensure correct order; sort_by_key is
        // stable so ties keep document order
        entries.sort_by_key(|entry| entry.start_time_ms);

        // Renumber entries to ensure sequential order
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }

        Ok(entries)
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // Write to file
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        // Write each entry to the file
        for entry in &self.entries {
            write!(file, "{}", entry)?;
        }

        Ok(())
    }

    /// Render the collection as SRT text without touching the filesystem
    pub fn to_srt_string(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            // Display on SubtitleEntry emits a full SRT block
            out.push_str(&entry.to_string());
        }
        out
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Language: {}", self.source_language)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
