//! Line-delimited JSON channel over stdin/stdout
//!
//! Lets a test page or a driver script talk to the bridge without a real
//! webview: one request per input line, one event per output line.

use crate::bridge::{Bridge, MessageSink};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Writes each event as one line on stdout
pub struct StdoutSink;

impl MessageSink for StdoutSink {
    fn post_message(&self, text: String) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{text}").and_then(|_| stdout.flush()) {
            tracing::warn!("Failed to write event to stdout: {}", e);
        }
    }
}

/// Feed every non-empty line of `reader` to the bridge until EOF
///
/// Returns the number of messages handed over.
pub async fn pump_lines<R>(reader: R, bridge: &Bridge) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut count = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        bridge.handle_message(line);
        count += 1;
    }
    Ok(count)
}
