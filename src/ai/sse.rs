//! Server-Sent-Events line parsing for the OpenAI-compatible streaming
//! chat-completions wire format (spec §4.3). Directly generalizes the
//! teacher's `stream_sse_lines` helper (`ai/providers.rs`), which already
//! handles CRLF line endings, blank/comment lines, and the `[DONE]`
//! sentinel.

use std::io::BufRead;

use crate::error::{CoreError, Result};

/// One parsed chunk of an OpenAI-compatible streaming response.
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// `data: {...}` payload, still JSON-encoded.
    Data(String),
    /// `data: [DONE]` terminal marker.
    Done,
}

/// Iterator adapter that turns a raw SSE byte stream into `SseEvent`s,
/// discarding blank lines, `:`-prefixed comments, and any field other than
/// `data`.
pub struct SseLines<R> {
    reader: R,
}

impl<R: BufRead> SseLines<R> {
    pub fn new(reader: R) -> Self {
        SseLines { reader }
    }
}

impl<R: BufRead> Iterator for SseLines<R> {
    type Item = Result<SseEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None, // stream closed
                Ok(_) => {}
                Err(e) => return Some(Err(CoreError::NetworkError(e.to_string()))),
            }

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() || trimmed.starts_with(':') {
                continue;
            }
            let Some(payload) = trimmed.strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim_start();
            if payload == "[DONE]" {
                return Some(Ok(SseEvent::Done));
            }
            return Some(Ok(SseEvent::Data(payload.to_string())));
        }
    }
}

pub fn stream_sse_lines<R: BufRead>(reader: R) -> SseLines<R> {
    SseLines::new(reader)
}

/// Extract the incremental text of a chat-completion chunk, ignoring
/// `delta.role` and any chunk whose delta carries no `content` field (the
/// final chunk before `[DONE]` typically has an empty delta).
pub fn extract_delta_content(payload: &str) -> Result<Option<String>> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| CoreError::Decode(e.to_string()))?;
    let content = value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string);
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn yields_two_content_chunks_then_done() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n",
            "\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
            ": a comment that must be ignored\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
            "data: [DONE]\n",
        );
        let mut events = stream_sse_lines(Cursor::new(body));

        match events.next().unwrap().unwrap() {
            SseEvent::Data(payload) => assert_eq!(extract_delta_content(&payload).unwrap(), None),
            other => panic!("unexpected {other:?}"),
        }
        match events.next().unwrap().unwrap() {
            SseEvent::Data(payload) => assert_eq!(extract_delta_content(&payload).unwrap().as_deref(), Some("Hel")),
            other => panic!("unexpected {other:?}"),
        }
        match events.next().unwrap().unwrap() {
            SseEvent::Data(payload) => assert_eq!(extract_delta_content(&payload).unwrap().as_deref(), Some("lo")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(events.next().unwrap().unwrap(), SseEvent::Done);
        assert!(events.next().is_none());
    }

    #[test]
    fn handles_crlf_line_endings() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\r\ndata: [DONE]\r\n";
        let mut events = stream_sse_lines(Cursor::new(body));
        assert!(matches!(events.next().unwrap().unwrap(), SseEvent::Data(_)));
        assert_eq!(events.next().unwrap().unwrap(), SseEvent::Done);
    }

    #[test]
    fn malformed_json_payload_is_a_decode_error() {
        let body = "data: not json\n";
        let mut events = stream_sse_lines(Cursor::new(body));
        let SseEvent::Data(payload) = events.next().unwrap().unwrap() else {
            panic!("expected data event");
        };
        assert!(extract_delta_content(&payload).is_err());
    }
}
