//! Streaming AI client (spec §4.3): OpenAI-compatible chat-completions over
//! SSE. Connection setup and the blocking `ureq` call follow the teacher's
//! `ai::providers::create_agent`/`OpenAiProvider::stream_message`; the
//! `tokio::task::spawn_blocking` + `CancellationToken` wrapper around it is
//! new, since the teacher's provider is called from a thread it already
//! owns rather than from an async command surface.

use std::io::BufReader;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Model;
use crate::error::{CoreError, Result};

use super::sse::{extract_delta_content, stream_sse_lines, SseEvent};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Capacity of the channel chunks are delivered through; bounds how far a
/// slow consumer can let the producer get ahead (spec §4.3 back-pressure).
pub const CHUNK_CHANNEL_CAPACITY: usize = 16;

fn create_agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_connect(Some(CONNECT_TIMEOUT))
        .timeout_recv_body(Some(READ_TIMEOUT))
        // A non-2xx response must still reach us with its body intact so it
        // can become a `CoreError::HttpStatus`, not an opaque transport error.
        .http_status_as_error(false)
        .build()
        .new_agent()
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: Model,
    pub text: String,
    /// Present only when the request carries a screenshot and the model
    /// supports vision input.
    pub image_data_uri: Option<String>,
}

fn build_body(request: &ChatRequest) -> serde_json::Value {
    let user_content = match &request.image_data_uri {
        Some(uri) if request.model.supports_vision => serde_json::json!([
            { "type": "text", "text": request.text },
            { "type": "image_url", "image_url": { "url": uri } },
        ]),
        _ => serde_json::Value::String(request.text.clone()),
    };

    serde_json::json!({
        "model": request.model.model_name,
        "stream": true,
        "messages": [
            { "role": "user", "content": user_content }
        ],
    })
}

pub struct AiClient {
    agent: ureq::Agent,
}

impl AiClient {
    pub fn new() -> Self {
        AiClient { agent: create_agent() }
    }

    /// Stream a chat completion, sending each text chunk to `sink` as it
    /// arrives. Cancellation is checked between SSE lines; the blocking
    /// connection is dropped as soon as it is noticed.
    pub async fn stream(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
        sink: mpsc::Sender<Result<String>>,
    ) -> Result<()> {
        let agent = self.agent.clone();
        let outcome = tokio::task::spawn_blocking(move || run_stream(agent, request, cancel, sink))
            .await
            .map_err(|e| CoreError::NetworkError(format!("stream task panicked: {e}")))?;
        outcome
    }
}

impl Default for AiClient {
    fn default() -> Self {
        Self::new()
    }
}

fn run_stream(
    agent: ureq::Agent,
    request: ChatRequest,
    cancel: CancellationToken,
    sink: mpsc::Sender<Result<String>>,
) -> Result<()> {
    let url = format!("{}/chat/completions", request.model.base_url.trim_end_matches('/'));
    let body = build_body(&request);

    let response = agent
        .post(&url)
        .header("Content-Type", "application/json")
        .header("Authorization", &format!("Bearer {}", request.model.api_key))
        .header("Accept", "text/event-stream")
        .send_json(&body);

    let response = response.map_err(|e| CoreError::NetworkError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.into_body().read_to_string().unwrap_or_default();
        return Err(CoreError::HttpStatus { code: status.as_u16(), body });
    }

    let reader = BufReader::new(response.into_body().into_reader());
    for event in stream_sse_lines(reader) {
        if cancel.is_cancelled() {
            debug!("stream cancelled; dropping connection");
            let _ = sink.blocking_send(Err(CoreError::Cancelled));
            return Err(CoreError::Cancelled);
        }

        match event {
            Ok(SseEvent::Done) => break,
            Ok(SseEvent::Data(payload)) => match extract_delta_content(&payload) {
                Ok(Some(content)) if !content.is_empty() => {
                    if sink.blocking_send(Ok(content)).is_err() {
                        // Receiver dropped: no one is listening anymore.
                        return Ok(());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = ?e, "skipping malformed SSE chunk");
                }
            },
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Model;

    fn model(supports_vision: bool) -> Model {
        Model {
            name: "test".into(),
            base_url: "https://example.invalid/v1".into(),
            api_key: "key".into(),
            model_name: "gpt-4o".into(),
            supports_vision,
        }
    }

    #[test]
    fn text_only_request_sends_plain_string_content() {
        let request = ChatRequest { model: model(true), text: "hello".into(), image_data_uri: None };
        let body = build_body(&request);
        assert_eq!(body["messages"][0]["content"], serde_json::json!("hello"));
    }

    #[test]
    fn vision_request_attaches_image_when_model_supports_it() {
        let request = ChatRequest {
            model: model(true),
            text: "describe this".into(),
            image_data_uri: Some("data:image/png;base64,AAAA".into()),
        };
        let body = build_body(&request);
        assert!(body["messages"][0]["content"].is_array());
    }

    #[test]
    fn non_vision_model_ignores_attached_image() {
        let request = ChatRequest {
            model: model(false),
            text: "describe this".into(),
            image_data_uri: Some("data:image/png;base64,AAAA".into()),
        };
        let body = build_body(&request);
        assert_eq!(body["messages"][0]["content"], serde_json::json!("describe this"));
    }
}
