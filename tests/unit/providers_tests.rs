/*!
 * Tests for provider clients and the provider-backed translation port
 */

use anyhow::Result;
use subtrans::app_config::{Config, TranslationProvider};
use subtrans::app_controller::Controller;
use subtrans::errors::ProviderError;
use subtrans::providers::anthropic::Anthropic;
use subtrans::providers::gemini::Gemini;
use subtrans::providers::mock::MockProvider;
use subtrans::providers::ollama::Ollama;
use subtrans::providers::{CompletionRequest, Provider};
use subtrans::translation::{ProviderTranslator, TranslationItem, TranslationPort};
use subtrans::translation::port::parse_translation_response;

fn batch() -> Vec<TranslationItem> {
    vec![
        TranslationItem::new(1, "Hello"),
        TranslationItem::new(2, "World"),
        TranslationItem::new(3, "Bye"),
    ]
}

#[tokio::test]
async fn test_providerTranslator_withTemperature_shouldForwardIt() {
    let provider = MockProvider::working();
    let translator = ProviderTranslator::new(provider.clone(), "{source_language}->{target_language}", "English", "Khmer")
        .with_temperature(0.9);
    translator.translate(&batch()).await.unwrap();

    let request = &provider.requests()[0];
    assert_eq!(request.system, "English->Khmer");
    assert!((request.temperature - 0.9).abs() < f32::EPSILON);
    assert!(request.json_response);
    assert_eq!(translator.system_prompt(), "English->Khmer");
}

#[tokio::test]
async fn test_providerTranslator_withReversedReply_shouldReturnEveryId() {
    let translator = ProviderTranslator::new(MockProvider::reversed(), "{target_language}", "auto", "Khmer");
    let result = translator.translate(&batch()).await.unwrap();

    let ids: Vec<u32> = result.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[tokio::test]
async fn test_providerTranslator_withPartialReply_shouldNotInventMissingIds() {
    let translator = ProviderTranslator::new(MockProvider::partial(), "{target_language}", "auto", "Khmer");
    let result = translator.translate(&batch()).await.unwrap();
    assert_eq!(result.len(), 2);
    assert!(result.iter().all(|i| i.id != 3));
}

#[tokio::test]
async fn test_providerTranslator_testConnection_shouldDelegate() {
    let ok = ProviderTranslator::new(MockProvider::working(), "", "auto", "Khmer");
    assert!(ok.test_connection().await.is_ok());

    let failing = ProviderTranslator::new(MockProvider::failing(), "", "auto", "Khmer");
    assert!(matches!(failing.test_connection().await, Err(ProviderError::ConnectionError(_))));
}

#[test]
fn test_parseResponse_withUnicodeText_shouldKeepIt() {
    let parsed = parse_translation_response(r#"[{"id":2,"text":"ពិភពលោក"},{"id":1,"text":"សួស្តី"}]"#).unwrap();
    assert_eq!(parsed[0], TranslationItem::new(2, "ពិភពលោក"));
    assert_eq!(parsed[1], TranslationItem::new(1, "សួស្តី"));
}

#[test]
fn test_parseResponse_withFenceWithoutLanguage_shouldParse() {
    let parsed = parse_translation_response("```\n[{\"id\":1,\"text\":\"A\"}]\n```").unwrap();
    assert_eq!(parsed, vec![TranslationItem::new(1, "A")]);
}

#[tokio::test]
async fn test_remoteProviders_withoutApiKey_shouldFailBeforeAnyRequest() {
    let request = CompletionRequest::new("sys", "[]");

    let gemini = Gemini::new("", "", "gemini-2.5-flash", 5);
    assert!(matches!(gemini.complete(request.clone()).await, Err(ProviderError::MissingApiKey(_))));

    let anthropic = Anthropic::new("  ", "", "claude-3-haiku-20240307", 5);
    assert!(matches!(anthropic.complete(request).await, Err(ProviderError::MissingApiKey(_))));
}

#[test]
fn test_ollama_buildRequest_withoutJson_shouldOmitFormat() {
    let ollama = Ollama::new("http://localhost:11434", "llama3.2:3b", 5);
    let mut request = CompletionRequest::new("sys", "hi");
    request.json_response = false;

    let body = serde_json::to_value(ollama.build_request(&request)).unwrap();
    assert!(body.get("format").is_none());
}

#[test]
fn test_controller_buildTranslator_forEveryProvider_shouldSucceed() -> Result<()> {
    for provider in [TranslationProvider::Gemini, TranslationProvider::Ollama, TranslationProvider::Anthropic] {
        let mut config = Config::default();
        config.translation.provider = provider;
        let controller = Controller::with_config(config)?;
        assert!(controller.build_translator().is_ok());
    }
    Ok(())
}

#[test]
fn test_controller_buildTranslator_withInvalidTargetLanguage_shouldFail() -> Result<()> {
    let mut config = Config::default();
    config.target_language = "zz".to_string();
    let controller = Controller::with_config(config)?;
    assert!(controller.build_translator().is_err());
    Ok(())
}
