//! JSON-lines event source.
//!
//! Reads one [`RawInputEvent`] per line from a file or from standard input.
//! Blank lines are skipped; malformed lines are logged and skipped. The
//! channel closes at end of input.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{CaptureError, InputSource, RawInputEvent, EVENT_CHANNEL_CAPACITY};

/// Where a [`JsonLinesSource`] reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFeed {
    Stdin,
    File(PathBuf),
}

impl EventFeed {
    /// Parses a command-line feed argument; `-` means standard input.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            EventFeed::Stdin
        } else {
            EventFeed::File(PathBuf::from(arg))
        }
    }
}

/// [`InputSource`] that decodes JSON lines.
pub struct JsonLinesSource {
    feed: EventFeed,
    started: bool,
}

impl JsonLinesSource {
    pub fn new(feed: EventFeed) -> Self {
        Self {
            feed,
            started: false,
        }
    }
}

impl InputSource for JsonLinesSource {
    /// Must be called from within a Tokio runtime.
    fn start(&mut self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError> {
        if self.started {
            return Err(CaptureError::AlreadyStarted);
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        match &self.feed {
            EventFeed::Stdin => {
                tokio::spawn(pump_lines(tokio::io::stdin(), tx));
            }
            EventFeed::File(path) => {
                let file = std::fs::File::open(path).map_err(|source| CaptureError::Open {
                    path: path.display().to_string(),
                    source,
                })?;
                tokio::spawn(pump_lines(tokio::fs::File::from_std(file), tx));
            }
        }
        self.started = true;
        Ok(rx)
    }
}

async fn pump_lines<R>(reader: R, tx: mpsc::Sender<RawInputEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut line_no = 0usize;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("event feed read error: {e}");
                break;
            }
        };
        line_no += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawInputEvent>(trimmed) {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    // Event loop has stopped.
                    return;
                }
            }
            Err(e) => warn!(line = line_no, "skipping malformed event: {e}"),
        }
    }
    debug!(lines = line_no, "event feed exhausted");
}
