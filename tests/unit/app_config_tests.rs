/*!
 * Tests for application configuration functionality
 */

use std::str::FromStr;

use bilisort::app_config::{Config, LogLevel};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    // Library layout defaults mirror the downloader's folder names
    assert_eq!(config.library.source_dir_name, "bilibili_video");
    assert_eq!(config.library.preferred_quality, "112");
    assert_eq!(config.library.entry_file_name, "entry.json");
    assert_eq!(config.library.audio_file_name, "audio.m4s");
    assert_eq!(config.library.video_file_name, "video.m4s");
    assert_eq!(config.library.scan_depth, 3);

    // Output defaults
    assert_eq!(config.output.dir_name, "processed_media");
    assert!(config.output.write_metadata);

    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    // Start with a valid config
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Empty names are rejected
    config.library.entry_file_name = "".to_string();
    assert!(config.validate().is_err());
    config.library.entry_file_name = "entry.json".to_string();

    // Names with path separators are rejected
    config.output.dir_name = "out/put".to_string();
    assert!(config.validate().is_err());
    config.output.dir_name = "out\\put".to_string();
    assert!(config.validate().is_err());
    config.output.dir_name = "processed_media".to_string();

    // Zero scan depth would find nothing
    config.library.scan_depth = 0;
    assert!(config.validate().is_err());
    config.library.scan_depth = 3;

    assert!(config.validate().is_ok());
}

/// Test that partial config files pick up defaults for missing fields
#[test]
fn test_config_deserialization_withPartialJson_shouldApplyDefaults() {
    let json = r#"{"library": {"preferred_quality": "80"}}"#;
    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.library.preferred_quality, "80");
    assert_eq!(config.library.source_dir_name, "bilibili_video");
    assert_eq!(config.library.scan_depth, 3);
    assert_eq!(config.output.dir_name, "processed_media");
    assert_eq!(config.log_level, LogLevel::Info);

    // A completely empty document is a valid config
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config.library, Config::default().library);
    assert_eq!(config.output, Config::default().output);
}

/// Test config serialization round trip
#[test]
fn test_config_serialization_withRoundTrip_shouldPreserveValues() {
    let mut config = Config::default();
    config.library.preferred_quality = "64".to_string();
    config.output.write_metadata = false;
    config.log_level = LogLevel::Debug;

    let json = serde_json::to_string_pretty(&config).unwrap();
    let restored: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.library, config.library);
    assert_eq!(restored.output, config.output);
    assert_eq!(restored.log_level, config.log_level);
}

/// Test log level parsing and formatting
#[test]
fn test_log_level_withParsingAndDisplay_shouldBeConsistent() {
    assert_eq!(LogLevel::from_str("debug").unwrap(), LogLevel::Debug);
    assert_eq!(LogLevel::from_str("WARN").unwrap(), LogLevel::Warn);
    assert_eq!(LogLevel::from_str("Trace").unwrap(), LogLevel::Trace);
    assert!(LogLevel::from_str("verbose").is_err());

    assert_eq!(LogLevel::Error.to_string(), "error");
    assert_eq!(LogLevel::Info.to_lowercase_string(), "info");

    // Serde uses the same lowercase names
    let level: LogLevel = serde_json::from_str(r#""trace""#).unwrap();
    assert_eq!(level, LogLevel::Trace);
    assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), r#""warn""#);
}
