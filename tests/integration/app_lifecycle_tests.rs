/*!
 * Full app lifecycle tests
 *
 * Drive `Controller::run_with` end to end with in-process translation ports.
 */

use anyhow::Result;

use subtrans::app_config::Config;
use subtrans::app_controller::{AutoResume, Controller};
use subtrans::errors::{AppError, PipelineError, ProviderError};
use subtrans::file_utils::FileManager;
use subtrans::providers::mock::MockProvider;
use subtrans::subtitle_processor::SubtitleCollection;
use subtrans::translation::{ProviderTranslator, TranslationItem};

use crate::common;
use crate::common::mock_translators::{Scripted, ScriptedTranslator};

fn controller(batch_size: usize) -> Controller {
    common::init_logging();
    let mut config = Config::default();
    config.batch_size = batch_size;
    config.output_suffix = Some("khmer".to_string());
    Controller::with_config(config).unwrap()
}

fn mock_translator(provider: MockProvider) -> ProviderTranslator<MockProvider> {
    ProviderTranslator::new(provider, "Translate to {target_language}", "auto", "Khmer")
}

#[tokio::test]
async fn test_run_withKhmerReply_shouldWriteSuffixedFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "movie.srt", common::HELLO_WORLD_SRT)?;
    let translator = ScriptedTranslator::new().script(
        1,
        Scripted::Reply(vec![
            TranslationItem::new(2, "ពិភពលោក"),
            TranslationItem::new(1, "សួស្តី"),
        ]),
    );

    let output = controller(25)
        .run_with(translator, &mut AutoResume, input, None, false)
        .await?;

    assert_eq!(output, temp_dir.path().join("movie.khmer.srt"));
    let written = SubtitleCollection::from_file(&output)?;
    assert_eq!(written.entries[0].text(), "សួស្តី");
    assert_eq!(written.entries[1].text(), "ពិភពលោក");
    Ok(())
}

#[tokio::test]
async fn test_run_withOutputDir_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let output_dir = temp_dir.path().join("translated/season1");

    let output = controller(2)
        .run_with(mock_translator(MockProvider::working()), &mut AutoResume, input, Some(output_dir.clone()), false)
        .await?;

    assert_eq!(output, output_dir.join("episode.khmer.srt"));
    assert!(FileManager::file_exists(&output));
    Ok(())
}

#[tokio::test]
async fn test_run_withExistingOutput_shouldRequireForce() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let existing = common::create_test_file(temp_dir.path(), "movie.khmer.srt", "old")?;

    let provider = MockProvider::working();
    let refused = controller(25)
        .run_with(mock_translator(provider.clone()), &mut AutoResume, input.clone(), None, false)
        .await;
    assert!(matches!(refused, Err(AppError::File(_))));
    assert_eq!(provider.request_count(), 0);
    assert_eq!(FileManager::read_to_string(&existing)?, "old");

    controller(25)
        .run_with(mock_translator(provider.clone()), &mut AutoResume, input, None, true)
        .await?;
    assert_ne!(FileManager::read_to_string(&existing)?, "old");
    Ok(())
}

#[tokio::test]
async fn test_run_withFailingProvider_shouldNotWriteOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let result = controller(1)
        .run_with(ScriptedTranslator::new().fail_on(2), &mut AutoResume, input, None, false)
        .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("Error processing batch 2"));
    assert!(!temp_dir.path().join("movie.khmer.srt").exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withGarbageInput_shouldReportContentError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "notes.srt", "nothing to see here")?;

    let result = controller(25)
        .run_with(ScriptedTranslator::new(), &mut AutoResume, input, None, false)
        .await;

    assert!(result.unwrap_err().to_string().contains("No valid subtitle blocks"));
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingInput_shouldFailFast() {
    let result = controller(25)
        .run_with(ScriptedTranslator::new(), &mut AutoResume, "/no/such/movie.srt".into(), None, false)
        .await;
    assert!(matches!(result, Err(AppError::File(_))));
}

#[tokio::test]
async fn test_run_withUnreachableProvider_shouldFailBeforeFirstBatch() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let provider = MockProvider::failing();

    let result = controller(1)
        .run_with(mock_translator(provider.clone()), &mut AutoResume, input, None, false)
        .await;

    assert!(matches!(result, Err(AppError::Provider(ProviderError::ConnectionError(_)))));
    assert_eq!(provider.request_count(), 0);
    assert!(!temp_dir.path().join("movie.khmer.srt").exists());
    Ok(())
}

#[test]
fn test_inspect_withNoValidBlocks_shouldReportContentError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "notes.srt", "nothing to see here\nat all")?;

    let result = controller(25).inspect(&input, 5);

    match result {
        Err(AppError::Pipeline(PipelineError::Content(message))) => {
            assert_eq!(message, "No valid subtitle blocks found in this file.")
        }
        other => panic!("expected a content error, got {:?}", other.map(|s| s.cue_count)),
    }
    Ok(())
}

#[test]
fn test_inspect_withUtf8Bom_shouldCountEveryCue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "bom.srt", &format!("\u{feff}{}", common::HELLO_WORLD_SRT))?;

    let summary = controller(1).inspect(&input, 5)?;
    assert_eq!(summary.cue_count, 2);
    assert_eq!(summary.batch_count, 2);
    Ok(())
}
