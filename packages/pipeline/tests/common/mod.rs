#![allow(dead_code)]

use std::time::Duration;

use factcheck_pipeline::LlmConfig;
use wiremock::MockServer;

/// Chat-completions response body carrying `content`.
pub fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

/// Custom Search response body listing `links`.
pub fn search_response(links: &[&str]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = links
        .iter()
        .map(|link| serde_json::json!({"title": "result", "link": link}))
        .collect();
    serde_json::json!({"kind": "customsearch#search", "items": items})
}

/// LLM config pointed at the mock server, with fast retries.
pub fn llm_config(server: &MockServer) -> LlmConfig {
    LlmConfig::builder()
        .api_key("test-key")
        .api_base_url(server.uri())
        .max_attempts(2)
        .retry_base_delay(Duration::ZERO)
        .build()
}
