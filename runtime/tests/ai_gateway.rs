//! AI gateway against mocked provider endpoints.

use assert_json_diff::assert_json_include;
use screener_runtime::ai::{AiGateway, AiRequest, Provider};
use screener_runtime::config::ScreenerConfig;
use screener_runtime::renderer::scripted::ScriptedRenderer;
use screener_runtime::{ScreenError, Screener};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn gateway(server: &MockServer) -> AiGateway {
    AiGateway::new(&config(server))
}

fn config(server: &MockServer) -> ScreenerConfig {
    ScreenerConfig {
        gemini_base_url: server.uri(),
        openai_base_url: server.uri(),
        ..ScreenerConfig::default()
    }
}

fn request(provider: Provider, with_search: bool) -> AiRequest {
    AiRequest {
        ticker: "AAPL".into(),
        company_name: "Apple Inc.".into(),
        provider,
        with_search,
        api_key: "test-key".into(),
        ..AiRequest::default()
    }
}

async fn sent_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    requests[0].body_json::<Value>().unwrap()
}

fn chunk(uri: &str, title: &str) -> Value {
    json!({ "web": { "uri": uri, "title": title } })
}

#[tokio::test]
async fn test_gemini_search_prefers_direct_sources_and_dedupes() {
    let server = MockServer::start().await;
    let body = json!({
        "candidates": [{
            "content": { "parts": [
                { "text": "Apple is screened as doubtful. " },
                { "text": "See [SEC filing](https://www.sec.gov/aapl-10k) and [Blog](https://blog.example.com/aapl)." }
            ]},
            "groundingMetadata": { "groundingChunks": [
                chunk("https://vertexaisearch.cloud.google.com/grounding-api-redirect/abc", "reuters.com"),
                chunk("https://www.sec.gov/aapl-10k/", "SEC"),
                chunk("https://www.reuters.com/apple", "Reuters")
            ]}
        }]
    });
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway(&server)
        .analyze(&request(Provider::Gemini, true))
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.grounded);
    assert!(result.analysis.starts_with("Apple is screened as doubtful."));
    let urls: Vec<&str> = result.sources.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://www.sec.gov/aapl-10k/",
            "https://www.reuters.com/apple",
            "https://blog.example.com/aapl"
        ]
    );

    let sent = sent_body(&server).await;
    assert_json_include!(
        actual: sent,
        expected: json!({
            "tools": [{ "google_search": {} }],
            "generationConfig": { "maxOutputTokens": 8192, "temperature": 0.7 }
        })
    );
}

#[tokio::test]
async fn test_gemini_sources_are_capped() {
    let server = MockServer::start().await;
    let chunks: Vec<Value> = (0..20)
        .map(|i| chunk(&format!("https://news{i}.example.com/"), "News"))
        .collect();
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "ok" }] },
                "groundingMetadata": { "groundingChunks": chunks }
            }]
        })))
        .mount(&server)
        .await;

    let result = gateway(&server)
        .analyze(&request(Provider::Gemini, true))
        .await
        .unwrap();
    assert_eq!(result.sources.len(), 15);
    assert_eq!(result.sources[0].url, "https://news0.example.com/");
}

#[tokio::test]
async fn test_gemini_plain_request_has_no_tools() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Plain answer." }] } }]
        })))
        .mount(&server)
        .await;

    let result = gateway(&server)
        .analyze(&request(Provider::Gemini, false))
        .await
        .unwrap();
    assert_eq!(result.analysis, "Plain answer.");
    assert!(!result.grounded);
    assert!(result.sources.is_empty());

    let sent = sent_body(&server).await;
    assert!(sent.get("tools").is_none());
    assert_json_include!(
        actual: sent,
        expected: json!({
            "generationConfig": { "maxOutputTokens": 2048, "temperature": 0.4 },
            "safetySettings": [{ "threshold": "BLOCK_NONE" }]
        })
    );
}

#[tokio::test]
async fn test_empty_key_makes_no_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gw = gateway(&server);
    for provider in [Provider::Gemini, Provider::OpenAi] {
        let req = AiRequest {
            api_key: String::new(),
            ..request(provider, true)
        };
        let err = gw.analyze(&req).await.unwrap_err();
        assert!(matches!(err, ScreenError::Configuration(_)));
    }
}

#[tokio::test]
async fn test_provider_error_is_network_error_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid. Please pass a valid API key." }
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .analyze(&request(Provider::Gemini, false))
        .await
        .unwrap_err();
    let message = match err {
        ScreenError::Network(message) => message,
        other => panic!("expected network error, got {other:?}"),
    };
    assert!(message.contains("403"));
    assert!(message.contains("API key not valid"));
}

#[tokio::test]
async fn test_openai_flat_output_with_annotations_capped_at_five() {
    let server = MockServer::start().await;
    let annotations: Vec<Value> = (0..4)
        .map(|i| json!({ "type": "url_citation", "url": format!("https://a{i}.example.com"), "title": format!("A{i}") }))
        .collect();
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": [
                { "type": "web_search_call", "status": "completed" },
                { "type": "message", "content": [{
                    "type": "output_text",
                    "text": "Analysis text with [dup](https://a0.example.com/) link.",
                    "annotations": annotations
                }]}
            ],
            "citations": ["https://b.example.com", "https://c.example.com"]
        })))
        .mount(&server)
        .await;

    let result = gateway(&server)
        .analyze(&request(Provider::OpenAi, true))
        .await
        .unwrap();

    assert!(result.grounded);
    assert!(result.analysis.starts_with("Analysis text"));
    let urls: Vec<&str> = result.sources.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://a0.example.com",
            "https://a1.example.com",
            "https://a2.example.com",
            "https://a3.example.com",
            "https://b.example.com"
        ]
    );

    let sent = sent_body(&server).await;
    assert_json_include!(
        actual: sent,
        expected: json!({
            "model": "gpt-4.1-mini",
            "max_output_tokens": 4096,
            "tools": [{ "type": "web_search_preview" }]
        })
    );
}

#[tokio::test]
async fn test_openai_plain_request_has_no_tools() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "output_text": "Short answer." })),
        )
        .mount(&server)
        .await;

    let result = gateway(&server)
        .analyze(&request(Provider::OpenAi, false))
        .await
        .unwrap();
    assert_eq!(result.analysis, "Short answer.");

    let sent = sent_body(&server).await;
    assert!(sent.get("tools").is_none());
    assert_eq!(sent["max_output_tokens"], 2048);
}

#[tokio::test]
async fn test_openai_race_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "output_text": "too late" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let gw = gateway(&server)
        .with_openai_race(Duration::from_millis(150), Duration::from_millis(100));
    let err = gw
        .analyze(&request(Provider::OpenAi, false))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ScreenError::Timeout {
            ms: 100,
            context: "OpenAI response".into()
        }
    );
}

#[tokio::test]
async fn test_unrecognized_envelope_is_response_shape_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "legacy shape" } }]
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .analyze(&request(Provider::OpenAi, false))
        .await
        .unwrap_err();
    assert!(matches!(err, ScreenError::ResponseShape(_)));
}

#[tokio::test]
async fn test_with_search_action_forces_search() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Grounded." }] },
                             "groundingMetadata": { "webSearchQueries": ["AAPL halal"] } }]
        })))
        .mount(&server)
        .await;

    let screener = Screener::new(Arc::new(ScriptedRenderer::new([])), &config(&server));
    let out = screener
        .dispatch_message(json!({
            "action": "aiAnalyzeWithSearch",
            "ticker": "AAPL",
            "companyName": "Apple Inc.",
            "apiKey": "test-key",
            "withSearch": false
        }))
        .await;

    assert_eq!(out["success"], true);
    assert_eq!(out["analysis"], "Grounded.");
    assert_eq!(out["grounded"], true);
    assert_eq!(out["sources"], json!([]));

    let sent = sent_body(&server).await;
    assert_eq!(sent["tools"], json!([{ "google_search": {} }]));
}
