use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use code_docu::generate::OpenAiClient;
use code_docu::load_config::GeneratorSection;
use code_docu_core::contract::{GenerationError, TextGenerator};

fn client_for(server: &MockServer) -> OpenAiClient {
    let config = GeneratorSection {
        base_url: format!("{}/v1", server.uri()),
        model: "gpt-4o-mini".to_string(),
        temperature: 0.0,
        api_key: Some("test-key".to_string()),
    };
    OpenAiClient::from_config(&config).expect("client should build")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content, "refusal": null },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_generate_requests_code_doc_schema_and_parses_markdown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "document this" }],
            "response_format": {
                "type": "json_schema",
                "json_schema": { "name": "CodeDoc", "strict": true }
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion(r##"{"markdown":"# Doc"}"##)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let doc = client_for(&server)
        .generate("document this")
        .await
        .expect("generation should succeed");
    assert_eq!(doc.markdown, "# Doc");
}

#[tokio::test]
async fn test_generate_maps_http_errors_to_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).generate("x").await.unwrap_err();
    match err {
        GenerationError::Provider(msg) => assert!(msg.contains("503"), "got: {msg}"),
        other => panic!("Expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_rejects_non_conforming_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion(r#"{"text":"no markdown field"}"#)),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).generate("x").await.unwrap_err();
    assert!(matches!(err, GenerationError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn test_generate_rejects_plain_text_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("# just markdown")))
        .mount(&server)
        .await;

    let err = client_for(&server).generate("x").await.unwrap_err();
    assert!(matches!(err, GenerationError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn test_generate_reports_refusals() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "role": "assistant", "content": null, "refusal": "I can't help with that." }
            }]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).generate("x").await.unwrap_err();
    assert!(matches!(err, GenerationError::Provider(_)), "got {err:?}");
}

#[test]
fn test_client_requires_api_key() {
    let config = GeneratorSection {
        api_key: None,
        ..GeneratorSection::default()
    };
    let err = OpenAiClient::from_config(&config).err().expect("should fail");
    assert!(err.to_string().contains("OPENAI_API_KEY"), "got: {err}");
}
