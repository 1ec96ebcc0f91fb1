/*!
 * Integration tests for full season organization runs
 */

use std::fs;
use std::path::Path;
use anyhow::Result;

use bilisort::app_controller::Controller;
use crate::common;

/// Sorted (file name, content) pairs for every file in a directory
fn snapshot_dir(dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        entries.push((
            entry.file_name().to_string_lossy().to_string(),
            fs::read(entry.path())?,
        ));
    }
    entries.sort();
    Ok(entries)
}

/// Test a full run over three complete bundles
#[test]
fn test_season_run_withCompleteBundles_shouldOrganizeAll() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let season_dir = common::create_season_dir(root)?;

    // Folder names chosen so lexicographic order would get them wrong
    common::create_episode_bundle(&season_dir, "3", "My Show", "2")?;
    common::create_episode_bundle(&season_dir, "10", "My Show", "3")?;
    common::create_episode_bundle(&season_dir, "2", "My Show", "1")?;

    let controller = Controller::new_for_test()?;
    let summary = controller.run(root, None, 1, false)?;

    assert_eq!(summary.processed, 3);
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.warnings, 0);
    assert!(!summary.dry_run);

    // Every episode got the full set of outputs
    let output_dir = root.join("processed_media");
    for episode in 1..=3 {
        let base = format!("My Show - S01E{:02}", episode);
        assert!(output_dir.join(format!("{}_audio.m4s", base)).exists());
        assert!(output_dir.join(format!("{}_video.m4s", base)).exists());
        assert!(output_dir.join(format!("{}.vi.srt", base)).exists());
        assert!(output_dir.join(format!("{}_metadata.txt", base)).exists());
    }

    // Natural order: folder "2" became episode 1, folder "10" episode 3
    let metadata = fs::read_to_string(output_dir.join("My Show - S01E01_metadata.txt"))?;
    assert!(metadata.contains("Title: My Show"));
    assert!(metadata.contains("Season: 1"));
    assert!(metadata.contains("Episode: 1"));
    assert!(metadata.contains("Source episode tag: 1"));
    assert!(metadata.ends_with("bilibili_video/s_40391/2\n"));

    let metadata = fs::read_to_string(output_dir.join("My Show - S01E03_metadata.txt"))?;
    assert!(metadata.contains("Source episode tag: 3"));
    assert!(metadata.ends_with("bilibili_video/s_40391/10\n"));

    // Subtitles were converted and segments copied verbatim
    assert_eq!(
        fs::read_to_string(output_dir.join("My Show - S01E01.vi.srt"))?,
        common::sample_srt()
    );
    assert_eq!(
        fs::read(output_dir.join("My Show - S01E02_audio.m4s"))?,
        b"audio-bytes".to_vec()
    );
    assert_eq!(
        fs::read(output_dir.join("My Show - S01E02_video.m4s"))?,
        b"video-bytes".to_vec()
    );

    // Sources are untouched
    assert!(season_dir.join("2").join("entry.json").exists());
    assert!(season_dir.join("2").join("vi").join("subtitle.json").exists());

    Ok(())
}

/// Test that one broken bundle does not stop the rest of the season
#[test]
fn test_season_run_withIncompleteBundle_shouldSkipAndContinue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let season_dir = common::create_season_dir(root)?;

    common::create_episode_bundle(&season_dir, "1", "My Show", "1")?;
    common::create_episode_bundle(&season_dir, "2", "My Show", "2")?;
    common::create_episode_bundle(&season_dir, "3", "My Show", "3")?;

    // Folder 2 keeps its language dir, so it is still discovered,
    // but the entry document is gone
    fs::remove_file(season_dir.join("2").join("entry.json"))?;

    let controller = Controller::new_for_test()?;
    let summary = controller.run(root, None, 1, false)?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped.len(), 1);
    assert!(summary.skipped[0].folder.ends_with("2"));
    assert!(summary.skipped[0].reason.contains("episode metadata file"));

    // Episode numbers come from discovery order, so the broken folder
    // still reserves its slot
    let output_dir = root.join("processed_media");
    assert!(output_dir.join("My Show - S01E01_audio.m4s").exists());
    assert!(!output_dir.join("My Show - S01E02_audio.m4s").exists());
    assert!(output_dir.join("My Show - S01E03_audio.m4s").exists());

    Ok(())
}

/// Test that an unmapped language folder warns but does not fail
#[test]
fn test_season_run_withUnsupportedLanguage_shouldWarnAndProcessRest() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let season_dir = common::create_season_dir(root)?;

    let episode = common::create_episode_bundle(&season_dir, "1", "My Show", "1")?;
    let en_dir = episode.join("en");
    fs::create_dir_all(&en_dir)?;
    fs::write(en_dir.join("subtitle.json"), common::sample_subtitle_json())?;
    let fr_dir = episode.join("fr");
    fs::create_dir_all(&fr_dir)?;
    fs::write(fr_dir.join("subtitle.json"), common::sample_subtitle_json())?;

    let controller = Controller::new_for_test()?;
    let summary = controller.run(root, None, 1, false)?;

    assert_eq!(summary.processed, 1);
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.warnings, 1);

    let output_dir = root.join("processed_media");
    assert!(output_dir.join("My Show - S01E01.vi.srt").exists());
    assert!(output_dir.join("My Show - S01E01.en.srt").exists());
    assert!(!output_dir.join("My Show - S01E01.fr.srt").exists());

    Ok(())
}

/// Test that rerunning a season reproduces the exact same bytes
#[test]
fn test_season_run_withRerun_shouldBeIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let season_dir = common::create_season_dir(root)?;

    common::create_episode_bundle(&season_dir, "1", "My Show", "1")?;
    common::create_episode_bundle(&season_dir, "2", "My Show", "2")?;

    let controller = Controller::new_for_test()?;
    let output_dir = root.join("processed_media");

    let first = controller.run(root, None, 1, false)?;
    let first_snapshot = snapshot_dir(&output_dir)?;

    let second = controller.run(root, None, 1, false)?;
    let second_snapshot = snapshot_dir(&output_dir)?;

    assert_eq!(first.processed, second.processed);
    assert_eq!(first_snapshot.len(), 8);
    assert_eq!(first_snapshot, second_snapshot);

    Ok(())
}

/// Test that episodes from two season folders abort the run
#[test]
fn test_season_run_withMultipleSeasonFolders_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();

    let season_a = root.join("bilibili_video").join("s_1");
    let season_b = root.join("bilibili_video").join("s_2");
    fs::create_dir_all(&season_a)?;
    fs::create_dir_all(&season_b)?;
    common::create_episode_bundle(&season_a, "1", "My Show", "1")?;
    common::create_episode_bundle(&season_b, "1", "My Show", "1")?;

    let controller = Controller::new_for_test()?;
    let err = controller.run(root, None, 1, false).unwrap_err();

    assert!(err.to_string().contains("one season at a time"));
    assert!(!root.join("processed_media").exists());

    Ok(())
}

/// Test sending outputs to an explicit directory
#[test]
fn test_season_run_withOutputOverride_shouldUseIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let season_dir = common::create_season_dir(root)?;
    common::create_episode_bundle(&season_dir, "1", "My Show", "1")?;

    let out_dir = common::create_temp_dir()?;
    let override_dir = out_dir.path().join("library");

    let controller = Controller::new_for_test()?;
    let summary = controller.run(root, Some(override_dir.as_path()), 2, false)?;

    assert_eq!(summary.processed, 1);
    assert!(override_dir.join("My Show - S02E01_audio.m4s").exists());
    assert!(override_dir.join("My Show - S02E01.vi.srt").exists());
    assert!(!root.join("processed_media").exists());

    Ok(())
}

/// Test that existing ASS subtitles ride along unchanged
#[test]
fn test_season_run_withAssSubtitles_shouldCopyThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let season_dir = common::create_season_dir(root)?;

    let episode = common::create_episode_bundle(&season_dir, "1", "My Show", "1")?;
    let ass_content = "[Script Info]\nTitle: karaoke\n";
    fs::write(episode.join("vi").join("karaoke.ass"), ass_content)?;

    let controller = Controller::new_for_test()?;
    let summary = controller.run(root, None, 1, false)?;

    assert_eq!(summary.processed, 1);

    let output_dir = root.join("processed_media");
    assert_eq!(
        fs::read_to_string(output_dir.join("My Show - S01E01.vi.ass"))?,
        ass_content
    );
    assert!(output_dir.join("My Show - S01E01.vi.srt").exists());

    // The converted SRT is the primary subtitle in the metadata summary
    let metadata = fs::read_to_string(output_dir.join("My Show - S01E01_metadata.txt"))?;
    assert!(metadata.contains("My Show - S01E01.vi.srt"));

    Ok(())
}

/// Test error reporting for missing or empty source trees
#[test]
fn test_season_run_withEmptySource_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();

    let controller = Controller::new_for_test()?;

    // No source directory at all
    let err = controller.run(root, None, 1, false).unwrap_err();
    assert!(err.to_string().contains("Source directory does not exist"));

    // Source directory present but holding no episodes
    fs::create_dir_all(root.join("bilibili_video"))?;
    let err = controller.run(root, None, 1, false).unwrap_err();
    assert!(err.to_string().contains("No episode folders found"));

    Ok(())
}
