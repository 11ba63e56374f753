//! Server-sent events for live seat updates.
//!
//! `GET /courses/sse` streams frames separated by blank lines. Only the
//! `event:` line matters to the client; the payload data is a signal to
//! refetch, not a data source, so it is deliberately not parsed.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{debug, warn};

/// A seat-status event from the live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatEvent {
    /// The stream is established; initial data is fresh.
    Connected,
    /// Seat counts changed; refetch the sections on screen.
    Update,
    /// The server reported a problem, or the transport failed.
    Error,
}

/// An open seat-update stream. Pull events with [`Self::next_event`];
/// dropping the value closes the connection.
pub struct LiveUpdates {
    stream: BoxStream<'static, Result<Bytes, reqwest::Error>>,
    buffer: String,
    done: bool,
}

impl LiveUpdates {
    pub(super) fn new(response: reqwest::Response) -> Self {
        Self {
            stream: response.bytes_stream().boxed(),
            buffer: String::new(),
            done: false,
        }
    }

    /// The next recognized event, or `None` once the stream has ended.
    /// Unknown event names are skipped. A transport failure yields one
    /// final [`SeatEvent::Error`] before the stream reports itself done.
    pub async fn next_event(&mut self) -> Option<SeatEvent> {
        loop {
            while let Some(idx) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..idx + 2).collect();
                if let Some(event) = parse_frame(&frame) {
                    debug!(?event, "seat stream event");
                    return Some(event);
                }
            }

            if self.done {
                return None;
            }

            match self.stream.next().await {
                Some(Ok(chunk)) => {
                    let text = String::from_utf8_lossy(&chunk);
                    self.buffer.extend(text.chars().filter(|c| *c != '\r'));
                }
                Some(Err(err)) => {
                    warn!(error = %err, "seat stream transport failure");
                    self.done = true;
                    return Some(SeatEvent::Error);
                }
                None => {
                    self.done = true;
                    // A final frame may lack the trailing blank line
                    let rest = std::mem::take(&mut self.buffer);
                    return parse_frame(&rest);
                }
            }
        }
    }
}

/// Extracts the event from one SSE frame. Frames without a recognized
/// `event:` line (comments, default message events, keepalives) map to
/// `None`.
fn parse_frame(frame: &str) -> Option<SeatEvent> {
    for line in frame.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            return match name.trim() {
                "connected" => Some(SeatEvent::Connected),
                "update" => Some(SeatEvent::Update),
                "error" => Some(SeatEvent::Error),
                other => {
                    debug!(event = %other, "ignoring unknown seat stream event");
                    None
                }
            };
        }
    }
    None
}
