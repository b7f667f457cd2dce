//! Outbound delivery
//!
//! Serializes events and posts them to the web content. Delivery is
//! fire-and-forget: there is no acknowledgment channel.

use super::protocol::OutboundEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Channel into the embedded web content
pub trait MessageSink: Send + Sync {
    /// Post one text message; failures are the sink's to log
    fn post_message(&self, text: String);
}

impl MessageSink for mpsc::UnboundedSender<String> {
    fn post_message(&self, text: String) {
        if self.send(text).is_err() {
            tracing::warn!("Web content channel closed, dropping message");
        }
    }
}

/// Shared handle the controllers emit events through
#[derive(Clone)]
pub struct Outbox {
    sink: Arc<dyn MessageSink>,
}

impl Outbox {
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self { sink }
    }

    /// Serialize and deliver an event
    pub fn emit(&self, event: OutboundEvent) {
        match event.to_json() {
            Ok(text) => {
                tracing::debug!("-> {}", summarize(&event, &text));
                self.sink.post_message(text);
            }
            Err(e) => tracing::error!("Failed to serialize {:?} event: {}", event.kind, e),
        }
    }
}

/// Log line without dumping base64 bodies
fn summarize(event: &OutboundEvent, text: &str) -> String {
    if event.data.is_some() {
        format!("{:?} ({} bytes)", event.kind, text.len())
    } else {
        text.to_string()
    }
}
