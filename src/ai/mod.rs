//! Streaming AI Client (spec §4.3).

pub mod client;
pub mod sse;

pub use client::{AiClient, ChatRequest, CHUNK_CHANNEL_CAPACITY};
pub use sse::{extract_delta_content, stream_sse_lines, SseEvent};
