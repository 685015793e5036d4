// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-framed filter for the structured-JSON backend stream.
//!
//! Non-JSON lines pass through untouched. `user`/`assistant` messages with
//! text content render as plain text; everything else pretty-prints.
//! Assistant usage blocks feed the token-usage callback.

use crate::tap::StreamSink;
use herd_core::{ActivityMonitor, TokenUsage};
use serde::Deserialize;
use std::io::{self, Write};
use std::sync::Arc;

/// Invoked with the extracted usage of each assistant message.
pub type UsageCallback = Box<dyn FnMut(TokenUsage) + Send>;

#[derive(Debug, Default, Deserialize)]
struct StreamMessage {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: Option<MessageBody>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageBody {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<UsageBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    /// `tool_result` blocks nest their text either as a plain string or as
    /// another block list.
    #[serde(default)]
    content: Option<ToolResultContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ToolResultContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
    Other(serde_json::Value),
}

#[derive(Debug, Default, Deserialize)]
struct UsageBlock {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    cache_creation_input_tokens: u64,
    #[serde(default)]
    cache_read_input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    cache_creation: Option<CacheCreation>,
}

#[derive(Debug, Default, Deserialize)]
struct CacheCreation {
    #[serde(default)]
    ephemeral_5m_input_tokens: u64,
    #[serde(default)]
    ephemeral_1h_input_tokens: u64,
}

impl UsageBlock {
    fn to_usage(&self) -> TokenUsage {
        let cache = self.cache_creation.as_ref();
        TokenUsage {
            input_tokens: self.input_tokens,
            cache_creation_tokens: self.cache_creation_input_tokens,
            cache_read_tokens: self.cache_read_input_tokens,
            output_tokens: self.output_tokens,
            ephemeral_5m_tokens: cache.map(|c| c.ephemeral_5m_input_tokens).unwrap_or(0),
            ephemeral_1h_tokens: cache.map(|c| c.ephemeral_1h_input_tokens).unwrap_or(0),
        }
    }
}

/// Line-buffering filter in front of another sink.
pub struct JsonFormatter {
    inner: Box<dyn StreamSink>,
    monitor: Arc<ActivityMonitor>,
    on_usage: Option<UsageCallback>,
    buf: Vec<u8>,
}

impl JsonFormatter {
    pub fn new(
        inner: Box<dyn StreamSink>,
        monitor: Arc<ActivityMonitor>,
        on_usage: Option<UsageCallback>,
    ) -> Self {
        Self {
            inner,
            monitor,
            on_usage,
            buf: Vec::new(),
        }
    }

    fn process_line(&mut self, line: &str) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            self.write_line(line);
            return;
        };

        let msg: StreamMessage = serde_json::from_value(value.clone()).unwrap_or_default();

        if msg.kind == "assistant" {
            if let Some(usage) = msg.message.as_ref().and_then(|m| m.usage.as_ref()) {
                if usage.input_tokens > 0 || usage.output_tokens > 0 {
                    let extracted = usage.to_usage();
                    if let Some(cb) = self.on_usage.as_mut() {
                        cb(extracted);
                    }
                }
            }
        }

        let texts = if msg.kind == "user" || msg.kind == "assistant" {
            msg.message
                .as_ref()
                .map(|m| collect_text(&m.content))
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        if texts.is_empty() {
            let pretty =
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| line.to_string());
            self.write_line(&pretty);
        } else {
            self.write_line(&texts.join("\n"));
        }
    }

    fn write_line(&mut self, line: &str) {
        let _ = self.inner.write_all(line.as_bytes());
        let _ = self.inner.write_all(b"\n");
    }
}

/// Text carried by `text` and `tool_result` content blocks.
fn collect_text(blocks: &[ContentBlock]) -> Vec<String> {
    let mut texts = Vec::new();
    for block in blocks {
        match block.kind.as_str() {
            "text" => {
                if let Some(text) = &block.text {
                    texts.push(text.clone());
                }
            }
            "tool_result" => {
                if let Some(text) = &block.text {
                    texts.push(text.clone());
                } else {
                    match &block.content {
                        Some(ToolResultContent::Text(text)) => texts.push(text.clone()),
                        Some(ToolResultContent::Blocks(nested)) => {
                            texts.extend(collect_text(nested));
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    texts
}

impl Write for JsonFormatter {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        if payload.is_empty() {
            return Ok(0);
        }
        self.monitor.record();
        self.buf.extend_from_slice(payload);
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let rest = self.buf.split_off(pos + 1);
            let raw = std::mem::replace(&mut self.buf, rest);
            let line = String::from_utf8_lossy(&raw);
            self.process_line(line.trim_end_matches(['\n', '\r']));
        }
        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl StreamSink for JsonFormatter {
    fn finish(&mut self) {
        if !self.buf.is_empty() {
            let raw = std::mem::take(&mut self.buf);
            let line = String::from_utf8_lossy(&raw);
            self.process_line(line.trim_end_matches(['\n', '\r']));
        }
        self.inner.finish();
    }
}

#[cfg(test)]
#[path = "json_stream_tests.rs"]
mod tests;
