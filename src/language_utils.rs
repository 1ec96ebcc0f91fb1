use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for subtitle folder handling
///
/// Subtitle folders inside an episode bundle are named with ISO 639-1
/// (2-letter) codes. Only a fixed set of languages has an output file
/// suffix; anything else is reported and skipped by the organizer.
/// Languages with a configured output suffix, in emission order
pub const SUPPORTED_LANGUAGES: [(&str, &str); 2] = [
    ("vi", "vi"), // Vietnamese
    ("en", "en"), // English
];

/// Check if a directory name has the shape of a language folder
/// (exactly two ASCII letters)
pub fn is_language_dir_name(name: &str) -> bool {
    name.len() == 2 && name.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Map a language folder name to the suffix used in output file names
///
/// Returns None when the language has no configured mapping; callers
/// decide whether that is a warning or an error.
pub fn output_suffix(tag: &str) -> Option<&'static str> {
    let normalized = tag.trim().to_lowercase();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(folder, _)| *folder == normalized)
        .map(|(_, suffix)| *suffix)
}

/// Check if a language folder name has a configured output mapping
pub fn is_supported_language(tag: &str) -> bool {
    output_suffix(tag).is_some()
}

/// Get the English language name from a 2-letter code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = code.trim().to_lowercase();
    let lang = Language::from_639_1(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;

    Ok(lang.to_name().to_string())
}

/// Human-readable form of a language tag for log messages,
/// e.g. "fr (French)", falling back to the bare tag when unknown
pub fn describe_language_tag(tag: &str) -> String {
    match get_language_name(tag) {
        Ok(name) => format!("{} ({})", tag, name),
        Err(_) => tag.to_string(),
    }
}
