// Realtime Database streaming - parses the REST event stream
// (Accept: text/event-stream) into change events

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DatabaseError;

/// A change notification for an observed node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DatabaseEvent {
    /// `data` replaces the value at `path` (relative to the observed node)
    Put { path: String, data: Value },
    /// `data` children are merged into the value at `path`
    Patch { path: String, data: Value },
    KeepAlive,
    /// The server closed the stream, e.g. rules no longer allow reading
    Cancel { reason: String },
    AuthRevoked,
}

impl DatabaseEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DatabaseEvent::Put { .. } => "put",
            DatabaseEvent::Patch { .. } => "patch",
            DatabaseEvent::KeepAlive => "keep-alive",
            DatabaseEvent::Cancel { .. } => "cancel",
            DatabaseEvent::AuthRevoked => "auth_revoked",
        }
    }

    /// Cancel and auth_revoked end the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, DatabaseEvent::Cancel { .. } | DatabaseEvent::AuthRevoked)
    }
}

#[derive(Deserialize)]
struct ChangePayload {
    path: String,
    #[serde(default)]
    data: Value,
}

/// One raw `event:`/`data:` block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawEvent {
    pub event: String,
    pub data: String,
}

impl RawEvent {
    pub fn decode(self) -> Result<Option<DatabaseEvent>, DatabaseError> {
        let event = match self.event.as_str() {
            "put" | "patch" => {
                let payload: ChangePayload = serde_json::from_str(&self.data)?;
                if self.event == "put" {
                    DatabaseEvent::Put { path: payload.path, data: payload.data }
                } else {
                    DatabaseEvent::Patch { path: payload.path, data: payload.data }
                }
            }
            "keep-alive" => DatabaseEvent::KeepAlive,
            "cancel" => DatabaseEvent::Cancel {
                reason: serde_json::from_str::<Value>(&self.data)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or(self.data),
            },
            "auth_revoked" => DatabaseEvent::AuthRevoked,
            other => {
                tracing::debug!("Ignoring unknown stream event: {}", other);
                return Ok(None);
            }
        };
        Ok(Some(event))
    }
}

/// Incremental parser for a server-sent event stream
#[derive(Debug, Default)]
pub struct EventStreamParser {
    buffer: Vec<u8>,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every event completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        self.buffer.extend(chunk.iter().filter(|b| **b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_block(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }
        events
    }
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &str) -> Option<RawEvent> {
    let mut raw = RawEvent::default();
    let mut data_lines = Vec::new();

    for line in block.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            raw.event = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    if raw.event.is_empty() && data_lines.is_empty() {
        return None;
    }
    raw.data = data_lines.join("\n");
    Some(raw)
}

/// Turn a streaming response into decoded events; ends after a terminal event
pub fn event_stream(
    response: reqwest::Response,
) -> impl Stream<Item = Result<DatabaseEvent, DatabaseError>> {
    async_stream::try_stream! {
        let mut parser = EventStreamParser::new();
        let mut body = response.bytes_stream();

        'outer: while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for raw in parser.push(&chunk) {
                if let Some(event) = raw.decode()? {
                    let terminal = event.is_terminal();
                    yield event;
                    if terminal {
                        break 'outer;
                    }
                }
            }
        }
    }
}
