// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama adapter against a mock HTTP server.

use futures::StreamExt;
use serde_json::{Value, json};
use tidings_config::model::OllamaConfig;
use tidings_core::types::{ChatMessage, CompletionRequest, ContentPart, HealthStatus, MessageContent, Role};
use tidings_core::{LanguageModel, PluginAdapter};
use tidings_ollama::OllamaProvider;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> OllamaProvider {
    let config = OllamaConfig {
        base_url: server.uri(),
        model: "qwen3:8b".into(),
        ..OllamaConfig::default()
    };
    OllamaProvider::new(&config).unwrap()
}

async fn last_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    serde_json::from_slice(&requests.last().unwrap().body).unwrap()
}

#[tokio::test]
async fn complete_posts_non_streaming_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "qwen3:8b",
            "message": {"role": "assistant", "content": "{\"need_tool\": false}"},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CompletionRequest::new(vec![ChatMessage::system("classify"), ChatMessage::user("hello")])
        .with_temperature(0.3);
    let text = provider(&server).complete(request).await.unwrap();
    assert_eq!(text, "{\"need_tool\": false}");

    let body = last_body(&server).await;
    assert_eq!(body["stream"], false);
    assert_eq!(body["model"], "qwen3:8b");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "hello");
    let temperature = body["options"]["temperature"].as_f64().unwrap();
    assert!((temperature - 0.3).abs() < 0.001);
}

#[tokio::test]
async fn stream_yields_json_lines_in_order() {
    let server = MockServer::start().await;
    let lines = [
        r#"{"message":{"role":"assistant","content":"Good"},"done":false}"#,
        r#"{"message":{"role":"assistant","content":" morning"},"done":false}"#,
        r#"{"message":{"role":"assistant","content":""},"done":true,"done_reason":"stop"}"#,
    ]
    .join("\n")
        + "\n";
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/x-ndjson")
                .set_body_string(lines),
        )
        .mount(&server)
        .await;

    let request = CompletionRequest::new(vec![ChatMessage::user("greet me")])
        .with_model(Some("llama3.2".into()));
    let fragments: Vec<String> = provider(&server)
        .stream(request)
        .await
        .unwrap()
        .map(|f| f.unwrap())
        .collect()
        .await;
    assert_eq!(fragments, vec!["Good", " morning"]);

    let body = last_body(&server).await;
    assert_eq!(body["stream"], true);
    assert_eq!(body["model"], "llama3.2");
}

#[tokio::test]
async fn final_line_without_newline_is_not_lost() {
    let server = MockServer::start().await;
    let lines = [
        r#"{"message":{"role":"assistant","content":"Top "},"done":false}"#,
        r#"{"message":{"role":"assistant","content":"story"},"done":true}"#,
    ]
    .join("\n");
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(lines))
        .mount(&server)
        .await;

    let request = CompletionRequest::new(vec![ChatMessage::user("headline?")]);
    let fragments: Vec<String> = provider(&server)
        .stream(request)
        .await
        .unwrap()
        .map(|f| f.unwrap())
        .collect()
        .await;
    assert_eq!(fragments, vec!["Top ", "story"]);
}

#[tokio::test]
async fn images_are_sent_in_message_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "a cat"},
            "done": true
        })))
        .mount(&server)
        .await;

    let message = ChatMessage {
        role: Role::User,
        content: MessageContent::Parts(vec![
            ContentPart::Text {
                text: "what is this?".into(),
            },
            ContentPart::Image {
                media_type: "image/png".into(),
                data: "iVBORw0KGgo=".into(),
            },
        ]),
    };
    provider(&server)
        .complete(CompletionRequest::new(vec![message]))
        .await
        .unwrap();

    let body = last_body(&server).await;
    assert_eq!(body["messages"][0]["content"], "what is this?");
    assert_eq!(body["messages"][0]["images"], json!(["iVBORw0KGgo="]));
}

#[tokio::test]
async fn error_status_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "model \"missing\" not found, try pulling it first"
        })))
        .mount(&server)
        .await;

    let request = CompletionRequest::new(vec![ChatMessage::user("hi")]).with_model(Some("missing".into()));
    let err = provider(&server).stream(request).await.err().unwrap();
    let message = err.to_string();
    assert!(message.contains("404"), "{message}");
    assert!(message.contains("try pulling it first"), "{message}");
}

#[tokio::test]
async fn mid_stream_error_ends_with_err_item() {
    let server = MockServer::start().await;
    let lines = concat!(
        r#"{"message":{"content":"par"},"done":false}"#,
        "\n",
        r#"{"error":"out of memory"}"#,
        "\n"
    );
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(lines))
        .mount(&server)
        .await;

    let items: Vec<_> = provider(&server)
        .stream(CompletionRequest::new(vec![ChatMessage::user("hi")]))
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_deref().unwrap(), "par");
    assert!(items[1].as_ref().unwrap_err().to_string().contains("out of memory"));
}

#[tokio::test]
async fn health_reflects_pulled_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "qwen3:8b"}, {"name": "llava:latest"}]
        })))
        .mount(&server)
        .await;

    let status = provider(&server).health_check().await.unwrap();
    assert_eq!(status, HealthStatus::Healthy);

    let config = OllamaConfig {
        base_url: server.uri(),
        model: "mistral".into(),
        ..OllamaConfig::default()
    };
    let status = OllamaProvider::new(&config).unwrap().health_check().await.unwrap();
    assert!(matches!(status, HealthStatus::Degraded(_)));
}

#[tokio::test]
async fn unreachable_server_is_unhealthy() {
    let config = OllamaConfig {
        base_url: "http://127.0.0.1:9".into(),
        ..OllamaConfig::default()
    };
    let status = OllamaProvider::new(&config).unwrap().health_check().await.unwrap();
    assert!(matches!(status, HealthStatus::Unhealthy(_)));
}
