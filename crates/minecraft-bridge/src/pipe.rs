//! Line-oriented reading of the child's output pipes

use crate::correlator::ResponseCorrelator;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// One of the child's standard streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipeStream {
    Stdin,
    Stdout,
    Stderr,
}

impl PipeStream {
    pub fn as_str(self) -> &'static str {
        match self {
            PipeStream::Stdin => "stdin",
            PipeStream::Stdout => "stdout",
            PipeStream::Stderr => "stderr",
        }
    }
}

impl fmt::Display for PipeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const OPEN: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

/// Close bookkeeping for a pipe that two parties may try to close.
///
/// `Open -> Closing -> Closed`. Only the caller that wins `begin_close`
/// releases the handle, then calls `finish_close`.
#[derive(Debug)]
pub struct PipeGuard {
    stream: PipeStream,
    state: AtomicU8,
}

impl PipeGuard {
    pub fn new(stream: PipeStream) -> Self {
        Self {
            stream,
            state: AtomicU8::new(OPEN),
        }
    }

    pub fn stream(&self) -> PipeStream {
        self.stream
    }

    /// Claim the close. True for exactly one caller.
    pub fn begin_close(&self) -> bool {
        self.state
            .compare_exchange(OPEN, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mark the handle released
    pub fn finish_close(&self) {
        self.state.store(CLOSED, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.state.load(Ordering::Acquire) == OPEN
    }

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == CLOSED
    }
}

/// Read `reader` line by line until end of stream, a read error or
/// cancellation.
///
/// Every line is logged with the stream name. Stdout lines are also handed
/// to `sink`, which never blocks. The pipe is released through `guard` on
/// exit. Returns the number of lines read.
pub async fn read_lines<R>(
    stream: PipeStream,
    reader: R,
    guard: Arc<PipeGuard>,
    sink: Option<Arc<ResponseCorrelator>>,
    cancel: CancellationToken,
) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        let read = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(pipe = %stream, "Pipe reader cancelled");
                break;
            }
            read = reader.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => {
                debug!(pipe = %stream, "Pipe reached end of stream");
                break;
            }
            Ok(_) => {
                let line = decode_line(&buf);
                count += 1;
                info!(pipe = %stream, "{}", line);
                if let Some(sink) = &sink {
                    sink.fan_out(&line);
                }
            }
            Err(e) if cancel.is_cancelled() || !guard.is_open() => {
                debug!(pipe = %stream, "Pipe closed during shutdown: {}", e);
                break;
            }
            Err(e) => {
                error!(pipe = %stream, "Failed to read pipe: {}", e);
                break;
            }
        }
    }

    if guard.begin_close() {
        drop(reader);
        guard.finish_close();
    }
    count
}

fn decode_line(buf: &[u8]) -> String {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
